use slab::Slab;

use crate::runtime::Block;
use crate::runtime::Error;

/// The actual graph that backs a [`Flowgraph`](crate::runtime::Flowgraph).
#[derive(Debug)]
pub struct Topology {
    pub(crate) blocks: Slab<Option<Block>>,
    // src blk, src port, dst blk, dst port
    pub(crate) message_edges: Vec<(usize, usize, usize, usize)>,
}

impl Topology {
    /// Constructs a blank [`Topology`]
    pub fn new() -> Self {
        Topology {
            blocks: Slab::new(),
            message_edges: Vec::new(),
        }
    }

    /// Map a block instance name to its id
    pub fn block_id(&self, name: &str) -> Option<usize> {
        for (i, b) in self.blocks.iter() {
            if b.as_ref()?.instance_name()? == name {
                return Some(i);
            }
        }

        None
    }

    /// Get the instance name of a block
    pub fn block_name(&self, id: usize) -> Option<&str> {
        if let Some(Some(b)) = &self.blocks.get(id) {
            b.instance_name()
        } else {
            None
        }
    }

    /// Adds a [`Block`] to the [`Topology`] returning its `id`.
    ///
    /// Assigns a unique instance name, derived from the type name or the
    /// name the block already carries.
    pub fn add_block(&mut self, mut block: Block) -> usize {
        let (mut i, base_name, mut block_name) = if let Some(name) = block.instance_name() {
            (-1, name.to_string(), name.to_string())
        } else {
            (
                0,
                block.type_name().to_string(),
                format!("{}_{}", block.type_name(), 0),
            )
        };

        // find a unique name
        loop {
            if self.block_id(&block_name).is_none() {
                break;
            }
            i += 1;
            block_name = format!("{}_{}", base_name, i);
        }

        block.set_instance_name(&block_name);
        self.blocks.insert(Some(block))
    }

    /// Connect a message output to a message input, resolving port names.
    pub fn connect_message(
        &mut self,
        src_block: usize,
        src_port: &str,
        dst_block: usize,
        dst_port: &str,
    ) -> Result<(), Error> {
        let src = self
            .block_ref(src_block)
            .ok_or_else(|| Error::ValidationError(format!("invalid src block {}", src_block)))?;
        let dst = self
            .block_ref(dst_block)
            .ok_or_else(|| Error::ValidationError(format!("invalid dst block {}", dst_block)))?;

        let src_port_id = src.message_output_name_to_id(src_port).ok_or_else(|| {
            Error::ValidationError(format!("invalid src port name {}", src_port))
        })?;
        let dst_port_id = dst.message_input_name_to_id(dst_port).ok_or_else(|| {
            Error::ValidationError(format!("invalid dst port name {}", dst_port))
        })?;

        self.message_edges
            .push((src_block, src_port_id, dst_block, dst_port_id));

        Ok(())
    }

    /// Validate the topology, checking that all blocks are present and
    /// instance names are unique.
    pub fn validate(&self) -> Result<(), Error> {
        let mut v = Vec::new();
        for (_, b) in self.blocks.iter() {
            let c = b
                .as_ref()
                .ok_or_else(|| Error::ValidationError("block not owned by topology".to_string()))?;
            let name = c.instance_name().ok_or_else(|| {
                Error::ValidationError("block instance name not set".to_string())
            })?;
            v.push(name.to_string());
        }
        v.sort();
        let len = v.len();
        v.dedup();
        if len != v.len() {
            return Err(Error::ValidationError(
                "duplicate block instance names".to_string(),
            ));
        }

        Ok(())
    }

    /// Get a reference to a block
    pub fn block_ref(&self, id: usize) -> Option<&Block> {
        self.blocks.get(id).and_then(|v| v.as_ref())
    }

    /// Get a mutable reference to a block
    pub fn block_mut(&mut self, id: usize) -> Option<&mut Block> {
        self.blocks.get_mut(id).and_then(|v| v.as_mut())
    }
}

impl Default for Topology {
    fn default() -> Self {
        Topology::new()
    }
}
