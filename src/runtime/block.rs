use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use futures::SinkExt;
use futures::StreamExt;
use futures::channel::mpsc::Receiver;
use futures::channel::mpsc::Sender;
use futures::future::Either;
use futures::future::join_all;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::runtime::BlockDescription;
use crate::runtime::BlockId;
use crate::runtime::BlockMessage;
use crate::runtime::BlockMeta;
use crate::runtime::Error;
use crate::runtime::FlowgraphMessage;
use crate::runtime::MessageInput;
use crate::runtime::MessageIo;
use crate::runtime::Pmt;
use crate::runtime::PortId;

/// Work state of a block
///
/// Lets the kernel signal whether it wants to be called again, whether it is
/// finished, and what it wants to wait for.
pub struct WorkIo {
    /// Call the `work` function again as soon as possible
    pub call_again: bool,
    /// The block is finished
    pub finished: bool,
    /// Block on the given future, calling `work` when it resolves
    pub block_on: Option<Pin<Box<dyn Future<Output = ()> + Send>>>,
}

impl WorkIo {
    /// Helper to set the block-on future of the work IO
    pub fn block_on<F: Future<Output = ()> + Send + 'static>(&mut self, f: F) {
        self.block_on = Some(Box::pin(f));
    }
}

impl fmt::Debug for WorkIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkIo")
            .field("call_again", &self.call_again)
            .field("finished", &self.finished)
            .finish()
    }
}

/// Central trait to implement a block kernel
#[async_trait]
pub trait Kernel: Send {
    /// Initialize the kernel, before the flowgraph starts
    async fn init(&mut self, _mio: &mut MessageIo<Self>, _meta: &mut BlockMeta) -> Result<()> {
        Ok(())
    }
    /// Produce or process messages outside of handler invocations
    async fn work(
        &mut self,
        _io: &mut WorkIo,
        _mio: &mut MessageIo<Self>,
        _meta: &mut BlockMeta,
    ) -> Result<()> {
        Ok(())
    }
    /// De-initialize the kernel, when the block terminates
    async fn deinit(&mut self, _mio: &mut MessageIo<Self>, _meta: &mut BlockMeta) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
pub(crate) trait BlockT: Send + Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn instance_name(&self) -> Option<&str>;
    fn set_instance_name(&mut self, name: &str);
    fn type_name(&self) -> &str;
    fn is_blocking(&self) -> bool;
    fn message_input_name_to_id(&self, name: &str) -> Option<usize>;
    fn message_output_name_to_id(&self, name: &str) -> Option<usize>;
    async fn run(
        &mut self,
        block_id: BlockId,
        main_inbox: Sender<FlowgraphMessage>,
        inbox: Receiver<BlockMessage>,
    ) -> Result<(), Error>;
}

struct BlockInner<K: Kernel + 'static> {
    meta: BlockMeta,
    mio: MessageIo<K>,
    kernel: K,
}

async fn call_handler<K: Kernel + 'static>(
    kernel: &mut K,
    mio: &mut MessageIo<K>,
    meta: &mut BlockMeta,
    block_id: BlockId,
    port_id: PortId,
    data: Pmt,
) -> Result<Pmt, Error> {
    let Some(id) = mio.input_id(&port_id) else {
        return Err(Error::InvalidMessagePort(block_id, port_id));
    };

    let res = if mio.input_is_async(id) {
        let h = match mio.input(id) {
            MessageInput::Async(i) => i.get_handler(),
            _ => unreachable!(),
        };
        (h)(kernel, mio, meta, data).await
    } else {
        let h = match mio.input(id) {
            MessageInput::Sync(i) => i.get_handler(),
            _ => unreachable!(),
        };
        (h)(kernel, mio, meta, data)
    };

    res.map_err(|e| Error::HandlerError(e.to_string()))
}

#[async_trait]
impl<K: Kernel + 'static> BlockT for BlockInner<K> {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn instance_name(&self) -> Option<&str> {
        self.meta.instance_name()
    }
    fn set_instance_name(&mut self, name: &str) {
        self.meta.set_instance_name(name)
    }
    fn type_name(&self) -> &str {
        self.meta.type_name()
    }
    fn is_blocking(&self) -> bool {
        self.meta.is_blocking()
    }
    fn message_input_name_to_id(&self, name: &str) -> Option<usize> {
        self.mio.input_name_to_id(name)
    }
    fn message_output_name_to_id(&self, name: &str) -> Option<usize> {
        self.mio.output_name_to_id(name)
    }

    async fn run(
        &mut self,
        block_id: BlockId,
        mut main_inbox: Sender<FlowgraphMessage>,
        mut inbox: Receiver<BlockMessage>,
    ) -> Result<(), Error> {
        let BlockInner { meta, mio, kernel } = self;

        // connect-and-init phase
        loop {
            match inbox
                .next()
                .await
                .ok_or_else(|| Error::RuntimeError("inbox closed during init".to_string()))?
            {
                BlockMessage::Initialize => {
                    if let Err(e) = kernel.init(mio, meta).await {
                        error!(
                            "{}: error during initialization, terminating ({:?})",
                            meta.instance_name().unwrap_or("<unnamed>"),
                            e
                        );
                        return Err(Error::RuntimeError(e.to_string()));
                    }
                    main_inbox
                        .send(FlowgraphMessage::Initialized)
                        .await
                        .map_err(|e| Error::RuntimeError(e.to_string()))?;
                    break;
                }
                BlockMessage::MessageOutputConnect {
                    src_port,
                    dst_port,
                    dst_inbox,
                } => {
                    mio.output_mut(src_port).connect(dst_port, dst_inbox);
                }
                t => warn!(
                    "{}: unhandled message during init {:?}",
                    meta.instance_name().unwrap_or("<unnamed>"),
                    t
                ),
            }
        }

        let mut work_io = WorkIo {
            call_again: false,
            finished: false,
            block_on: None,
        };

        let inbox = inbox.peekable();
        futures::pin_mut!(inbox);

        // main loop
        loop {
            // non-blocking message processing
            loop {
                match inbox.next().now_or_never() {
                    Some(Some(BlockMessage::Notify)) => {}
                    Some(Some(BlockMessage::BlockDescription { tx })) => {
                        let description = BlockDescription {
                            id: block_id.0,
                            type_name: meta.type_name().to_string(),
                            instance_name: meta
                                .instance_name()
                                .unwrap_or("<unnamed>")
                                .to_string(),
                            message_inputs: mio.input_names(),
                            message_outputs: mio
                                .outputs()
                                .iter()
                                .map(|x| x.name().to_string())
                                .collect(),
                            blocking: meta.is_blocking(),
                        };
                        if tx.send(description).is_err() {
                            debug!("receiver for block description dropped");
                        }
                    }
                    Some(Some(BlockMessage::Call { port_id, data })) => {
                        if let Err(e) =
                            call_handler(kernel, mio, meta, block_id, port_id, data).await
                        {
                            warn!(
                                "{}: message handler failed ({})",
                                meta.instance_name().unwrap_or("<unnamed>"),
                                e
                            );
                        }
                    }
                    Some(Some(BlockMessage::Callback { port_id, data, tx })) => {
                        let res = call_handler(kernel, mio, meta, block_id, port_id, data).await;
                        if tx.send(res).is_err() {
                            debug!("receiver for callback result dropped");
                        }
                    }
                    Some(Some(BlockMessage::Terminate)) => work_io.finished = true,
                    Some(Some(t)) => warn!(
                        "{}: unhandled message in main loop {:?}",
                        meta.instance_name().unwrap_or("<unnamed>"),
                        t
                    ),
                    _ => break,
                }
                // received at least one message
                work_io.call_again = true;
            }

            // shutdown
            if work_io.finished {
                debug!("{} terminating", meta.instance_name().unwrap_or("<unnamed>"));
                join_all(mio.outputs_mut().iter_mut().map(|o| o.notify_finished())).await;

                return match kernel.deinit(mio, meta).await {
                    Ok(()) => Ok(()),
                    Err(e) => {
                        error!(
                            "{}: error in deinit, terminating ({:?})",
                            meta.instance_name().unwrap_or("<unnamed>"),
                            e
                        );
                        Err(Error::RuntimeError(e.to_string()))
                    }
                };
            }

            // wait for the block-on future or new messages
            if !work_io.call_again {
                if let Some(f) = work_io.block_on.take() {
                    match futures::future::select(f, inbox.as_mut().peek()).await {
                        Either::Left(_) => {
                            work_io.call_again = true;
                        }
                        Either::Right((Some(_), f)) => {
                            work_io.block_on = Some(f);
                            continue;
                        }
                        Either::Right((None, _)) => {
                            // all senders gone, nothing can arrive anymore
                            work_io.finished = true;
                            continue;
                        }
                    }
                } else {
                    if inbox.as_mut().peek().await.is_none() {
                        work_io.finished = true;
                    }
                    continue;
                }
            }

            // work
            work_io.call_again = false;
            if let Err(e) = kernel.work(&mut work_io, mio, meta).await {
                error!(
                    "{}: error in work(), terminating ({:?})",
                    meta.instance_name().unwrap_or("<unnamed>"),
                    e
                );
                return Err(Error::RuntimeError(e.to_string()));
            }

            futures_lite::future::yield_now().await;
        }
    }
}

/// A type-erased block of a [`Flowgraph`](crate::runtime::Flowgraph)
pub struct Block(Box<dyn BlockT>);

impl Block {
    /// Create a block from a [`Kernel`] with the given metadata and message
    /// ports
    pub fn new<K: Kernel + 'static>(meta: BlockMeta, mio: MessageIo<K>, kernel: K) -> Block {
        Block(Box::new(BlockInner { meta, mio, kernel }))
    }

    /// Instance name, assigned when the block is added to a flowgraph
    pub fn instance_name(&self) -> Option<&str> {
        self.0.instance_name()
    }
    /// Set instance name
    pub fn set_instance_name(&mut self, name: &str) {
        self.0.set_instance_name(name)
    }
    /// Type name
    pub fn type_name(&self) -> &str {
        self.0.type_name()
    }
    /// Does the block run in a separate thread
    pub fn is_blocking(&self) -> bool {
        self.0.is_blocking()
    }
    /// Map a message input port name to its id
    pub fn message_input_name_to_id(&self, name: &str) -> Option<usize> {
        self.0.message_input_name_to_id(name)
    }
    /// Map a message output port name to its id
    pub fn message_output_name_to_id(&self, name: &str) -> Option<usize> {
        self.0.message_output_name_to_id(name)
    }

    /// Try to cast to the given kernel type
    pub fn kernel<K: Kernel + 'static>(&self) -> Option<&K> {
        self.0
            .as_any()
            .downcast_ref::<BlockInner<K>>()
            .map(|b| &b.kernel)
    }

    /// Try to cast to the given kernel type mutably
    pub fn kernel_mut<K: Kernel + 'static>(&mut self) -> Option<&mut K> {
        self.0
            .as_any_mut()
            .downcast_mut::<BlockInner<K>>()
            .map(|b| &mut b.kernel)
    }

    pub(crate) async fn run(
        &mut self,
        block_id: BlockId,
        main_inbox: Sender<FlowgraphMessage>,
        inbox: Receiver<BlockMessage>,
    ) -> Result<(), Error> {
        self.0.run(block_id, main_inbox, inbox).await
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("type_name", &self.type_name().to_string())
            .finish()
    }
}

pub(crate) async fn run_block(
    mut block: Block,
    block_id: BlockId,
    mut main_inbox: Sender<FlowgraphMessage>,
    inbox: Receiver<BlockMessage>,
) {
    match block.run(block_id, main_inbox.clone(), inbox).await {
        Ok(()) => {
            if main_inbox
                .send(FlowgraphMessage::BlockDone { block_id, block })
                .await
                .is_err()
            {
                debug!("flowgraph inbox gone before {} could report done", block_id);
            }
        }
        Err(e) => {
            error!("{} failed ({})", block_id, e);
            let _ = main_inbox
                .send(FlowgraphMessage::BlockError { block_id })
                .await;
        }
    }
}
