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

/// Apply a function to each incoming message, emitting the result as a new
/// message.
pub struct MessageApply<F>
where
    F: FnMut(Pmt) -> Result<Option<Pmt>> + Send + 'static,
{
    callback: F,
}

impl<F> MessageApply<F>
where
    F: FnMut(Pmt) -> Result<Option<Pmt>> + Send + 'static,
{
    /// Apply a function to each incoming message.
    ///
    /// `None` results are filtered out.
    ///
    /// # Arguments
    ///
    /// * `callback`: Function to apply to each incoming message, filtering `None` values.
    pub fn new(callback: F) -> Block {
        Block::new(
            BlockMetaBuilder::new("MessageApply").build(),
            MessageIoBuilder::new()
                .add_async_input("in", Self::apply)
                .add_output("out")
                .build(),
            Self { callback },
        )
    }

    fn apply<'a>(
        block: &'a mut Self,
        mio: &'a mut MessageIo<Self>,
        _meta: &'a mut BlockMeta,
        p: Pmt,
    ) -> Pin<Box<dyn Future<Output = Result<Pmt>> + Send + 'a>> {
        Box::pin(async move {
            let r = (block.callback)(p)?;
            if let Some(r) = r {
                mio.post(0, r).await;
            }
            Ok(Pmt::Ok)
        })
    }
}

impl<F> Kernel for MessageApply<F> where F: FnMut(Pmt) -> Result<Option<Pmt>> + Send + 'static {}
