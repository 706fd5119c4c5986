#![warn(missing_docs)]
#![allow(clippy::new_ret_no_self)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! An asynchronous runtime for flowgraphs of message-passing blocks that is:
//! * **Introspectable**: every running flowgraph, block, and message handler
//!   is reachable over a REST control plane.
//! * **Asynchronous**: blocks are actors with async message handlers,
//!   scheduled on a smol-based executor.
//! * **Remote-controllable**: handlers take and return polymorphic
//!   [`Pmt`](crate::runtime::Pmt) values that travel as JSON.
//!
//! ## Example
//! A flowgraph that emits 123 messages into a sink:
//! ```no_run
//! use flowrt::blocks::MessageBurst;
//! use flowrt::blocks::MessageSink;
//! use flowrt::runtime::Error;
//! use flowrt::runtime::Flowgraph;
//! use flowrt::runtime::Pmt;
//! use flowrt::runtime::Runtime;
//!
//! fn main() -> Result<(), Error> {
//!     let mut fg = Flowgraph::new();
//!
//!     let src = fg.add_block(MessageBurst::new(Pmt::U32(0), 123));
//!     let snk = fg.add_block(MessageSink::new());
//!
//!     fg.connect_message(src, "out", snk, "in")?;
//!
//!     Runtime::new().run(fg)?;
//!
//!     Ok(())
//! }
//! ```

/// Logging macros
#[macro_use]
pub extern crate tracing;

// re-exports
pub use anyhow;
pub use async_io;
pub use futures;

pub mod blocks;
pub mod runtime;

/// FlowRT async channels
///
/// At the moment this uses the channels from the `futures` crate.
pub mod channel {
    pub use futures::channel::mpsc;
    pub use futures::channel::oneshot;
}
