/// Metadata of a block, e.g., its type and instance name
pub struct BlockMeta {
    type_name: String,
    instance_name: Option<String>,
    blocking: bool,
}

impl BlockMeta {
    fn new(type_name: String, blocking: bool) -> BlockMeta {
        BlockMeta {
            type_name,
            instance_name: None,
            blocking,
        }
    }

    /// Type name
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Instance name
    ///
    /// `None` until the block is added to a flowgraph, which assigns a
    /// unique instance name.
    pub fn instance_name(&self) -> Option<&str> {
        self.instance_name.as_ref().map(|x| x as _)
    }

    /// Does the block run in a separate thread
    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    /// Set instance name
    pub fn set_instance_name(&mut self, name: impl Into<String>) {
        self.instance_name = Some(name.into());
    }
}

/// Builder for [`BlockMeta`]
pub struct BlockMetaBuilder {
    type_name: String,
    blocking: bool,
}

impl BlockMetaBuilder {
    /// Create builder
    pub fn new(type_name: impl Into<String>) -> BlockMetaBuilder {
        BlockMetaBuilder {
            type_name: type_name.into(),
            blocking: false,
        }
    }

    /// Mark block as blocking, i.e., it will be spawned in a separate thread
    #[must_use]
    pub fn blocking(mut self) -> BlockMetaBuilder {
        self.blocking = true;
        self
    }

    /// Build [`BlockMeta`]
    pub fn build(self) -> BlockMeta {
        BlockMeta::new(self.type_name, self.blocking)
    }
}
