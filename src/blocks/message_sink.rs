use crate::anyhow::Result;
use crate::runtime::Block;
use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::Kernel;
use crate::runtime::MessageIo;
use crate::runtime::MessageIoBuilder;
use crate::runtime::Pmt;
use async_trait::async_trait;

/// Black hole for messages.
///
/// Counts incoming messages; the `in` handler returns the running count.
pub struct MessageSink {
    n_received: u64,
}

impl MessageSink {
    /// Create MessageSink block
    pub fn new() -> Block {
        Block::new(
            BlockMetaBuilder::new("MessageSink").build(),
            MessageIoBuilder::new()
                .add_sync_input(
                    "in",
                    |block: &mut MessageSink,
                     _mio: &mut MessageIo<MessageSink>,
                     _meta: &mut BlockMeta,
                     p: Pmt| {
                        if !matches!(p, Pmt::Finished) {
                            block.n_received += 1;
                        }
                        Ok(Pmt::U64(block.n_received))
                    },
                )
                .build(),
            MessageSink { n_received: 0 },
        )
    }

    /// Get the number of received messages.
    pub fn received(&self) -> u64 {
        self.n_received
    }
}

#[doc(hidden)]
#[async_trait]
impl Kernel for MessageSink {
    async fn deinit(&mut self, _mio: &mut MessageIo<Self>, _meta: &mut BlockMeta) -> Result<()> {
        debug!("n_received: {}", self.n_received);
        Ok(())
    }
}
