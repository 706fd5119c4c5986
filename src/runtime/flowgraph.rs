use futures::SinkExt;
use futures::channel::mpsc::Sender;
use futures::channel::oneshot;

use crate::runtime::Block;
use crate::runtime::BlockDescription;
use crate::runtime::BlockId;
use crate::runtime::Error;
use crate::runtime::FlowgraphDescription;
use crate::runtime::FlowgraphMessage;
use crate::runtime::Kernel;
use crate::runtime::Pmt;
use crate::runtime::PortId;
use crate::runtime::Topology;

/// A graph of blocks connected by message edges.
///
/// A [`Flowgraph`] is constructed up front (add blocks, connect ports) and
/// then handed to a [`Runtime`](crate::runtime::Runtime), which turns every
/// block into an actor and the flowgraph into a running entity that can be
/// inspected and controlled, locally through a
/// [`FlowgraphHandle`] or remotely through the REST API.
pub struct Flowgraph {
    pub(crate) topology: Topology,
    pub(crate) name: String,
}

impl Flowgraph {
    /// Creates a new [`Flowgraph`] with an empty [`Topology`]
    pub fn new() -> Flowgraph {
        Flowgraph {
            topology: Topology::new(),
            name: "flowgraph".to_string(),
        }
    }

    /// Name of the flowgraph
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the name of the flowgraph, shown in the flowgraph listing
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Add a [`Block`], returning its id within the flowgraph
    pub fn add_block(&mut self, block: Block) -> usize {
        self.topology.add_block(block)
    }

    /// Connect a message output to a message input
    pub fn connect_message(
        &mut self,
        src_block: usize,
        src_port: &str,
        dst_block: usize,
        dst_port: &str,
    ) -> Result<(), Error> {
        self.topology
            .connect_message(src_block, src_port, dst_block, dst_port)
    }

    /// Try to get a reference to the kernel of a block
    ///
    /// Only works before the flowgraph is started or after it returned from
    /// the runtime.
    pub fn kernel<T: Kernel + 'static>(&self, id: usize) -> Option<&T> {
        self.topology.block_ref(id).and_then(|b| b.kernel())
    }

    /// Try to get a mutable reference to the kernel of a block
    pub fn kernel_mut<T: Kernel + 'static>(&mut self, id: usize) -> Option<&mut T> {
        self.topology.block_mut(id).and_then(|b| b.kernel_mut())
    }
}

impl Default for Flowgraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a running flowgraph
///
/// Cloneable sender into the flowgraph supervisor task. All control-plane
/// operations on a live flowgraph go through this handle.
#[derive(Clone, Debug)]
pub struct FlowgraphHandle {
    inbox: Sender<FlowgraphMessage>,
}

impl FlowgraphHandle {
    pub(crate) fn new(inbox: Sender<FlowgraphMessage>) -> FlowgraphHandle {
        FlowgraphHandle { inbox }
    }

    /// Call a message handler of a block, ignoring the result
    pub async fn call(
        &mut self,
        block_id: BlockId,
        port_id: PortId,
        data: Pmt,
    ) -> Result<(), Error> {
        let (tx, rx) = oneshot::channel::<Result<(), Error>>();
        self.inbox
            .send(FlowgraphMessage::BlockCall {
                block_id,
                port_id,
                data,
                tx,
            })
            .await
            .map_err(|_| Error::FlowgraphTerminated)?;
        rx.await.map_err(|_| Error::FlowgraphTerminated)?
    }

    /// Call a message handler of a block, returning its result
    pub async fn callback(
        &mut self,
        block_id: BlockId,
        port_id: PortId,
        data: Pmt,
    ) -> Result<Pmt, Error> {
        let (tx, rx) = oneshot::channel::<Result<Pmt, Error>>();
        self.inbox
            .send(FlowgraphMessage::BlockCallback {
                block_id,
                port_id,
                data,
                tx,
            })
            .await
            .map_err(|_| Error::FlowgraphTerminated)?;
        rx.await.map_err(|_| Error::FlowgraphTerminated)?
    }

    /// Get the [`FlowgraphDescription`]
    pub async fn description(&mut self) -> Result<FlowgraphDescription, Error> {
        let (tx, rx) = oneshot::channel::<FlowgraphDescription>();
        self.inbox
            .send(FlowgraphMessage::FlowgraphDescription { tx })
            .await
            .map_err(|_| Error::FlowgraphTerminated)?;
        rx.await.map_err(|_| Error::FlowgraphTerminated)
    }

    /// Get the [`BlockDescription`] of a block
    pub async fn block_description(
        &mut self,
        block_id: BlockId,
    ) -> Result<BlockDescription, Error> {
        let (tx, rx) = oneshot::channel::<Result<BlockDescription, Error>>();
        self.inbox
            .send(FlowgraphMessage::BlockDescription { block_id, tx })
            .await
            .map_err(|_| Error::FlowgraphTerminated)?;
        rx.await.map_err(|_| Error::FlowgraphTerminated)?
    }

    /// Terminate the flowgraph
    pub async fn terminate(&mut self) -> Result<(), Error> {
        self.inbox
            .send(FlowgraphMessage::Terminate)
            .await
            .map_err(|_| Error::FlowgraphTerminated)?;
        Ok(())
    }
}
