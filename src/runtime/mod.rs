//! ## Flowgraph Runtime
//!
//! Hosts flowgraphs of message-passing blocks and exposes them through a
//! REST control plane.
use futures::channel::mpsc;
use futures::channel::oneshot;
use thiserror::Error as ThisError;

mod block;
pub use block::Block;
pub use block::Kernel;
pub use block::WorkIo;
pub(crate) use block::run_block;

mod block_meta;
pub use block_meta::BlockMeta;
pub use block_meta::BlockMetaBuilder;

pub mod config;

mod ctrl_port;
pub use ctrl_port::ControlPort;

mod flowgraph;
pub use flowgraph::Flowgraph;
pub use flowgraph::FlowgraphHandle;

mod logging;

pub mod message_io;
pub use message_io::MessageInput;
pub use message_io::MessageIo;
pub use message_io::MessageIoBuilder;
pub use message_io::MessageOutput;

#[allow(clippy::module_inception)]
mod runtime;
pub use runtime::Runtime;
pub use runtime::RuntimeHandle;
pub use runtime::TaskHandle;

pub mod scheduler;

mod topology;
pub use topology::Topology;

pub use flowrt_types::BlockDescription;
pub use flowrt_types::BlockId;
pub use flowrt_types::FlowgraphDescription;
pub use flowrt_types::FlowgraphId;
pub use flowrt_types::FlowgraphSummary;
pub use flowrt_types::Pmt;
pub use flowrt_types::PmtConversionError;
pub use flowrt_types::PmtKind;
pub use flowrt_types::PortId;

/// Initialize runtime-wide facilities, i.e., logging.
///
/// This is called automatically when a [`Runtime`] is created.
pub fn init() {
    logging::init();
}

/// Message to a flowgraph supervisor task
#[derive(Debug)]
pub enum FlowgraphMessage {
    /// Terminate
    Terminate,
    /// A block finished initialization
    Initialized,
    /// A block finished and hands itself back
    BlockDone {
        /// Block Id
        block_id: BlockId,
        /// The finished block
        block: Block,
    },
    /// A block failed
    BlockError {
        /// Block Id
        block_id: BlockId,
    },
    /// Call a handler of a block, ignoring the result
    BlockCall {
        /// Block Id
        block_id: BlockId,
        /// Handler Id
        port_id: PortId,
        /// Input data
        data: Pmt,
        /// Back channel for the ack
        tx: oneshot::Sender<Result<(), Error>>,
    },
    /// Call a handler of a block, returning its result
    BlockCallback {
        /// Block Id
        block_id: BlockId,
        /// Handler Id
        port_id: PortId,
        /// Input data
        data: Pmt,
        /// Back channel for the result
        tx: oneshot::Sender<Result<Pmt, Error>>,
    },
    /// Get the description of the flowgraph
    FlowgraphDescription {
        /// Back channel for the description
        tx: oneshot::Sender<FlowgraphDescription>,
    },
    /// Get the description of a block
    BlockDescription {
        /// Block Id
        block_id: BlockId,
        /// Back channel for the description
        tx: oneshot::Sender<Result<BlockDescription, Error>>,
    },
}

/// Message to a block actor
#[derive(Debug)]
pub enum BlockMessage {
    /// Initialize
    Initialize,
    /// Terminate
    Terminate,
    /// Notify
    Notify,
    /// Get the block description
    BlockDescription {
        /// Back channel for the description
        tx: oneshot::Sender<BlockDescription>,
    },
    /// Connect a message output to a remote handler
    MessageOutputConnect {
        /// Message output port
        src_port: usize,
        /// Remote handler id
        dst_port: usize,
        /// Inbox of the remote block
        dst_inbox: mpsc::Sender<BlockMessage>,
    },
    /// Call a handler, ignoring the result
    Call {
        /// Handler Id
        port_id: PortId,
        /// Input data
        data: Pmt,
    },
    /// Call a handler, returning its result
    Callback {
        /// Handler Id
        port_id: PortId,
        /// Input data
        data: Pmt,
        /// Back channel for the result
        tx: oneshot::Sender<Result<Pmt, Error>>,
    },
}

/// Runtime error
#[derive(ThisError, Debug)]
pub enum Error {
    /// Flowgraph does not exist
    #[error("flowgraph {0} does not exist")]
    InvalidFlowgraph(FlowgraphId),
    /// Block does not exist
    #[error("block {0} does not exist")]
    InvalidBlock(BlockId),
    /// Message port does not exist
    #[error("block {0} has no message port {1:?}")]
    InvalidMessagePort(BlockId, PortId),
    /// Handler rejected the input
    #[error("handler rejected message ({0})")]
    HandlerError(String),
    /// Block already terminated
    #[error("block already terminated")]
    BlockTerminated,
    /// Flowgraph already terminated
    #[error("flowgraph terminated")]
    FlowgraphTerminated,
    /// Topology is not valid
    #[error("invalid topology ({0})")]
    ValidationError(String),
    /// Generic runtime failure
    #[error("runtime error ({0})")]
    RuntimeError(String),
}
