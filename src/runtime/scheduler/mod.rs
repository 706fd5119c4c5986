//! Schedulers that decide where block actors run
use futures::channel::mpsc::Sender;
use slab::Slab;
use std::future::Future;

use crate::runtime::BlockMessage;
use crate::runtime::FlowgraphMessage;
use crate::runtime::Topology;

#[allow(clippy::module_inception)]
mod smol;
pub use smol::SmolScheduler;

/// Task handle for spawned futures
pub use async_executor::Task;

/// Scheduler trait
///
/// This has to be implemented for every scheduler.
pub trait Scheduler: Clone + Send + 'static {
    /// Spawn the block actors of a [`Topology`], returning their inboxes.
    ///
    /// The returned slab is indexed by block id; entries for ids that do not
    /// exist in the topology are `None`.
    fn run_topology(
        &self,
        topology: &mut Topology,
        main_channel: &Sender<FlowgraphMessage>,
    ) -> Slab<Option<Sender<BlockMessage>>>;

    /// Spawn a task
    fn spawn<T: Send + 'static>(&self, future: impl Future<Output = T> + Send + 'static)
    -> Task<T>;

    /// Spawn a blocking task in a separate thread
    fn spawn_blocking<T: Send + 'static>(
        &self,
        future: impl Future<Output = T> + Send + 'static,
    ) -> Task<T>;
}
