use std::future::Future;
use std::pin::Pin;

use crate::anyhow::Result;
use crate::runtime::Block;
use crate::runtime::BlockMeta;
use crate::runtime::BlockMetaBuilder;
use crate::runtime::Kernel;
use crate::runtime::MessageIo;
use crate::runtime::MessageIoBuilder;
use crate::runtime::Pmt;

/// Forward messages from `in` to `out`.
pub struct MessageCopy;

impl MessageCopy {
    /// Create MessageCopy block
    pub fn new() -> Block {
        Block::new(
            BlockMetaBuilder::new("MessageCopy").build(),
            MessageIoBuilder::new()
                .add_async_input("in", MessageCopy::forward)
                .add_output("out")
                .build(),
            MessageCopy,
        )
    }

    fn forward<'a>(
        _block: &'a mut MessageCopy,
        mio: &'a mut MessageIo<MessageCopy>,
        _meta: &'a mut BlockMeta,
        p: Pmt,
    ) -> Pin<Box<dyn Future<Output = Result<Pmt>> + Send + 'a>> {
        Box::pin(async move {
            mio.post(0, p).await;
            Ok(Pmt::Ok)
        })
    }
}

impl Kernel for MessageCopy {}
