use async_io::block_on;
use async_lock::Mutex;
use async_trait::async_trait;
use axum::Router;
use futures::FutureExt;
use futures::channel::mpsc::Receiver;
use futures::channel::mpsc::Sender;
use futures::channel::mpsc::channel;
use futures::channel::oneshot;
use futures::prelude::*;
use std::fmt;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task;
use std::task::Poll;

use crate::runtime;
use crate::runtime::BlockDescription;
use crate::runtime::BlockMessage;
use crate::runtime::ControlPort;
use crate::runtime::Error;
use crate::runtime::Flowgraph;
use crate::runtime::FlowgraphDescription;
use crate::runtime::FlowgraphHandle;
use crate::runtime::FlowgraphId;
use crate::runtime::FlowgraphMessage;
use crate::runtime::FlowgraphSummary;
use crate::runtime::Pmt;
use crate::runtime::config;
use crate::runtime::scheduler::Scheduler;
use crate::runtime::scheduler::SmolScheduler;
use crate::runtime::scheduler::Task;

/// Handle to a flowgraph task, detaching it when dropped
pub struct TaskHandle<'a, T> {
    task: Option<Task<T>>,
    _p: std::marker::PhantomData<&'a ()>,
}

impl<T> Drop for TaskHandle<'_, T> {
    fn drop(&mut self) {
        if let Some(t) = self.task.take() {
            t.detach()
        }
    }
}

impl<T> TaskHandle<'_, T> {
    fn new(task: Task<T>) -> Self {
        TaskHandle {
            task: Some(task),
            _p: std::marker::PhantomData,
        }
    }
}

impl<T> std::future::Future for TaskHandle<'_, T> {
    type Output = T;
    fn poll(mut self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<Self::Output> {
        self.task.as_mut().expect("task already detached").poll_unpin(cx)
    }
}

struct FlowgraphEntry {
    name: String,
    handle: FlowgraphHandle,
}

/// This is the [`Runtime`] that runs a [`Flowgraph`] to completion.
///
/// [`Runtime`]s are generic over the scheduler used to run the [`Flowgraph`].
pub struct Runtime<'a, S> {
    scheduler: S,
    flowgraphs: Arc<Mutex<Vec<FlowgraphEntry>>>,
    control_port: ControlPort,
    _p: std::marker::PhantomData<&'a ()>,
}

impl Runtime<'_, SmolScheduler> {
    /// Constructs a new [`Runtime`] using [`SmolScheduler::default()`] for the [`Scheduler`].
    pub fn new() -> Self {
        Self::with_custom_routes(Router::new())
    }

    /// Set custom routes for the control port webserver
    pub fn with_custom_routes(routes: Router<RuntimeHandle>) -> Self {
        Self::with_config(SmolScheduler::default(), routes)
    }
}

impl Default for Runtime<'_, SmolScheduler> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Drop for Runtime<'_, S> {
    fn drop(&mut self) {
        debug!("runtime dropped");
    }
}

impl<'a, S: Scheduler + Sync> Runtime<'a, S> {
    /// Create a [`Runtime`] with a given [`Scheduler`]
    pub fn with_scheduler(scheduler: S) -> Self {
        Self::with_config(scheduler, Router::new())
    }

    /// Create a [`Runtime`] with the given scheduler and custom control port
    /// routes
    pub fn with_config(scheduler: S, routes: Router<RuntimeHandle>) -> Self {
        runtime::init();

        let flowgraphs = Arc::new(Mutex::new(Vec::new()));
        let handle = RuntimeHandle {
            flowgraphs: flowgraphs.clone(),
            scheduler: Arc::new(scheduler.clone()),
        };
        Runtime {
            scheduler,
            flowgraphs,
            control_port: ControlPort::new(handle, routes),
            _p: std::marker::PhantomData,
        }
    }

    /// Address the control port is bound to, if it is enabled
    pub fn ctrl_port_addr(&self) -> Option<SocketAddr> {
        self.control_port.addr()
    }

    /// Spawn task on runtime
    pub fn spawn<T: Send + 'static>(
        &self,
        future: impl Future<Output = T> + Send + 'static,
    ) -> Task<T> {
        self.scheduler.spawn(future)
    }

    /// Block thread, waiting for future to complete
    pub fn block_on<T: Send + 'static>(
        &self,
        future: impl Future<Output = T> + Send + 'static,
    ) -> T {
        block_on(self.scheduler.spawn(future))
    }

    /// Spawn task on runtime in background, detaching the handle
    pub fn spawn_background<T: Send + 'static>(
        &self,
        future: impl Future<Output = T> + Send + 'static,
    ) {
        self.scheduler.spawn(future).detach();
    }

    /// Spawn a blocking task
    ///
    /// This is usually moved in a separate thread.
    pub fn spawn_blocking<T: Send + 'static>(
        &self,
        future: impl Future<Output = T> + Send + 'static,
    ) -> Task<T> {
        self.scheduler.spawn_blocking(future)
    }

    /// Spawn a blocking task in the background
    pub fn spawn_blocking_background<T: Send + 'static>(
        &self,
        future: impl Future<Output = T> + Send + 'static,
    ) {
        self.scheduler.spawn_blocking(future).detach();
    }

    /// Start a [`Flowgraph`] on the [`Runtime`]
    ///
    /// Returns, once the flowgraph is constructed and running.
    pub async fn start(
        &'a self,
        fg: Flowgraph,
    ) -> Result<(TaskHandle<'a, Result<Flowgraph, Error>>, FlowgraphHandle), Error> {
        let queue_size = config::config().queue_size;
        let name = fg.name.clone();
        let (fg_inbox, fg_inbox_rx) = channel::<FlowgraphMessage>(queue_size);

        let (tx, rx) = oneshot::channel::<Result<(), Error>>();
        let task = self.scheduler.spawn(run_flowgraph(
            fg,
            self.scheduler.clone(),
            fg_inbox.clone(),
            fg_inbox_rx,
            tx,
        ));
        rx.await
            .map_err(|_| Error::RuntimeError("run_flowgraph crashed".to_string()))??;
        let handle = FlowgraphHandle::new(fg_inbox);
        self.flowgraphs.lock().await.push(FlowgraphEntry {
            name,
            handle: handle.clone(),
        });
        Ok((TaskHandle::new(task), handle))
    }

    /// Start a [`Flowgraph`] on the [`Runtime`]
    ///
    /// Blocks until the flowgraph is constructed and running.
    pub fn start_sync(
        &self,
        fg: Flowgraph,
    ) -> Result<(TaskHandle<'_, Result<Flowgraph, Error>>, FlowgraphHandle), Error> {
        block_on(self.start(fg))
    }

    /// Start a [`Flowgraph`] on the [`Runtime`] and block until it terminates.
    pub fn run(&self, fg: Flowgraph) -> Result<Flowgraph, Error> {
        let (handle, _) = block_on(self.start(fg))?;
        block_on(handle)
    }

    /// Start a [`Flowgraph`] on the [`Runtime`] and await its termination.
    pub async fn run_async(&'a self, fg: Flowgraph) -> Result<Flowgraph, Error> {
        let (handle, _) = self.start(fg).await?;
        handle.await
    }

    /// Get the [`Scheduler`] that is associated with the [`Runtime`].
    pub fn scheduler(&self) -> S {
        self.scheduler.clone()
    }

    /// Get the [`RuntimeHandle`]
    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            flowgraphs: self.flowgraphs.clone(),
            scheduler: Arc::new(self.scheduler.clone()),
        }
    }
}

#[async_trait]
trait Spawn {
    async fn start(&self, fg: Flowgraph) -> Result<FlowgraphHandle, Error>;
}

#[async_trait]
impl<S: Scheduler + Sync + 'static> Spawn for S {
    async fn start(&self, fg: Flowgraph) -> Result<FlowgraphHandle, Error> {
        let queue_size = config::config().queue_size;
        let (fg_inbox, fg_inbox_rx) = channel::<FlowgraphMessage>(queue_size);

        let (tx, rx) = oneshot::channel::<Result<(), Error>>();
        self.spawn(run_flowgraph(
            fg,
            self.clone(),
            fg_inbox.clone(),
            fg_inbox_rx,
            tx,
        ))
        .detach();
        rx.await
            .map_err(|_| Error::RuntimeError("run_flowgraph crashed".to_string()))??;
        Ok(FlowgraphHandle::new(fg_inbox))
    }
}

/// Runtime handle added as state to web handlers
#[derive(Clone)]
pub struct RuntimeHandle {
    scheduler: Arc<dyn Spawn + Send + Sync + 'static>,
    flowgraphs: Arc<Mutex<Vec<FlowgraphEntry>>>,
}

impl fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeHandle").finish()
    }
}

impl RuntimeHandle {
    /// Start a [`Flowgraph`] on the runtime
    pub async fn start(&self, fg: Flowgraph) -> Result<FlowgraphHandle, Error> {
        let name = fg.name.clone();
        let handle = self.scheduler.start(fg).await?;

        self.add_flowgraph(name, handle.clone()).await;
        Ok(handle)
    }

    /// Add a [`FlowgraphHandle`] to make it available to web handlers
    async fn add_flowgraph(&self, name: String, handle: FlowgraphHandle) -> FlowgraphId {
        let mut v = self.flowgraphs.lock().await;
        let l = v.len();
        v.push(FlowgraphEntry { name, handle });
        FlowgraphId(l)
    }

    /// Get handle to a running flowgraph
    pub async fn get_flowgraph(&self, id: FlowgraphId) -> Option<FlowgraphHandle> {
        self.flowgraphs
            .lock()
            .await
            .get(id.0)
            .map(|e| e.handle.clone())
    }

    /// Get summaries of all registered flowgraphs, ordered by id
    pub async fn flowgraphs(&self) -> Vec<FlowgraphSummary> {
        self.flowgraphs
            .lock()
            .await
            .iter()
            .enumerate()
            .map(|(i, e)| FlowgraphSummary {
                id: FlowgraphId(i),
                name: e.name.clone(),
            })
            .collect()
    }
}

pub(crate) async fn run_flowgraph<S: Scheduler>(
    mut fg: Flowgraph,
    scheduler: S,
    mut main_channel: Sender<FlowgraphMessage>,
    mut main_rx: Receiver<FlowgraphMessage>,
    initialized: oneshot::Sender<Result<(), Error>>,
) -> Result<Flowgraph, Error> {
    debug!("in run_flowgraph");

    if let Err(e) = fg.topology.validate() {
        let msg = e.to_string();
        let _ = initialized.send(Err(Error::ValidationError(msg.clone())));
        return Err(Error::ValidationError(msg));
    }

    let mut inboxes = scheduler.run_topology(&mut fg.topology, &main_channel);

    debug!("connecting message edges");
    for (src, src_port, dst, dst_port) in fg.topology.message_edges.iter().copied() {
        let dst_inbox = inboxes[dst]
            .as_ref()
            .expect("invalid dst block in message edge")
            .clone();

        inboxes[src]
            .as_mut()
            .expect("invalid src block in message edge")
            .send(BlockMessage::MessageOutputConnect {
                src_port,
                dst_port,
                dst_inbox,
            })
            .await
            .map_err(|e| Error::RuntimeError(e.to_string()))?;
    }

    debug!("init blocks");
    let mut active_blocks = 0u32;
    for (_, inbox) in inboxes.iter_mut() {
        if let Some(inbox) = inbox {
            inbox
                .send(BlockMessage::Initialize)
                .await
                .map_err(|e| Error::RuntimeError(e.to_string()))?;
            active_blocks += 1;
        }
    }

    debug!("wait for blocks init");
    let mut i = active_blocks;
    let mut queue = Vec::new();
    let mut block_error = false;
    while i > 0 {
        let m = main_rx
            .next()
            .await
            .ok_or_else(|| Error::RuntimeError("main inbox closed during init".to_string()))?;
        match m {
            FlowgraphMessage::Initialized => i -= 1,
            FlowgraphMessage::BlockError { .. } => {
                i -= 1;
                active_blocks -= 1;
                block_error = true;
            }
            x => {
                debug!("queueing unhandled message received during initialization {:?}", &x);
                queue.push(x);
            }
        }
    }

    debug!("running blocks");
    for (_, inbox) in inboxes.iter_mut() {
        if let Some(inbox) = inbox {
            if inbox.send(BlockMessage::Notify).await.is_err() {
                debug!("runtime wanted to start block that already terminated");
            }
        }
    }

    for m in queue.into_iter() {
        main_channel
            .try_send(m)
            .expect("main inbox exceeded capacity during startup");
    }

    initialized
        .send(Ok(()))
        .expect("failed to signal flowgraph startup complete");

    if block_error {
        main_channel
            .try_send(FlowgraphMessage::Terminate)
            .expect("main inbox exceeded capacity during startup");
    }

    let mut terminated = false;

    // main loop
    while active_blocks > 0 {
        let m = main_rx
            .next()
            .await
            .ok_or_else(|| Error::RuntimeError("main inbox closed".to_string()))?;
        match m {
            FlowgraphMessage::BlockCall {
                block_id,
                port_id,
                data,
                tx,
            } => match inboxes.get_mut(block_id.0).and_then(|x| x.as_mut()) {
                Some(inbox) => {
                    if inbox
                        .send(BlockMessage::Call { port_id, data })
                        .await
                        .is_ok()
                    {
                        let _ = tx.send(Ok(()));
                    } else {
                        let _ = tx.send(Err(Error::BlockTerminated));
                    }
                }
                None => {
                    let _ = tx.send(Err(Error::InvalidBlock(block_id)));
                }
            },
            FlowgraphMessage::BlockCallback {
                block_id,
                port_id,
                data,
                tx,
            } => match inboxes.get_mut(block_id.0).and_then(|x| x.as_mut()) {
                Some(inbox) => {
                    let (block_tx, block_rx) = oneshot::channel::<Result<Pmt, Error>>();
                    if inbox
                        .send(BlockMessage::Callback {
                            port_id,
                            data,
                            tx: block_tx,
                        })
                        .await
                        .is_ok()
                    {
                        match block_rx.await {
                            Ok(res) => {
                                let _ = tx.send(res);
                            }
                            Err(_) => {
                                let _ = tx.send(Err(Error::BlockTerminated));
                            }
                        }
                    } else {
                        let _ = tx.send(Err(Error::BlockTerminated));
                    }
                }
                None => {
                    let _ = tx.send(Err(Error::InvalidBlock(block_id)));
                }
            },
            FlowgraphMessage::BlockDone { block_id, block } => {
                fg.topology.blocks[block_id.0] = Some(block);
                active_blocks -= 1;
            }
            FlowgraphMessage::BlockError { .. } => {
                block_error = true;
                active_blocks -= 1;
                let _ = main_channel.send(FlowgraphMessage::Terminate).await;
            }
            FlowgraphMessage::BlockDescription { block_id, tx } => {
                match inboxes.get_mut(block_id.0).and_then(|x| x.as_mut()) {
                    Some(inbox) => {
                        let (b_tx, rx) = oneshot::channel::<BlockDescription>();
                        if inbox
                            .send(BlockMessage::BlockDescription { tx: b_tx })
                            .await
                            .is_ok()
                        {
                            if let Ok(d) = rx.await {
                                let _ = tx.send(Ok(d));
                            } else {
                                let _ = tx.send(Err(Error::BlockTerminated));
                            }
                        } else {
                            let _ = tx.send(Err(Error::BlockTerminated));
                        }
                    }
                    None => {
                        let _ = tx.send(Err(Error::InvalidBlock(block_id)));
                    }
                }
            }
            FlowgraphMessage::FlowgraphDescription { tx } => {
                let mut blocks = Vec::new();
                for (_, inbox) in inboxes.iter_mut() {
                    if let Some(inbox) = inbox {
                        let (b_tx, rx) = oneshot::channel::<BlockDescription>();
                        if inbox
                            .send(BlockMessage::BlockDescription { tx: b_tx })
                            .await
                            .is_ok()
                        {
                            if let Ok(d) = rx.await {
                                blocks.push(d);
                            }
                        }
                    }
                }

                let _ = tx.send(FlowgraphDescription {
                    name: fg.name.clone(),
                    blocks,
                    message_edges: fg.topology.message_edges.clone(),
                });
            }
            FlowgraphMessage::Terminate => {
                if !terminated {
                    for (_, inbox) in inboxes.iter_mut() {
                        if let Some(inbox) = inbox {
                            if inbox.send(BlockMessage::Terminate).await.is_err() {
                                debug!("runtime tried to terminate block that already terminated");
                            }
                        }
                    }
                    terminated = true;
                }
            }
            _ => warn!("main loop received unhandled message"),
        }
    }

    if block_error {
        return Err(Error::RuntimeError("a block raised an error".to_string()));
    }

    Ok(fg)
}
