#![warn(missing_docs)]
//! # FlowRT Remote
//!
//! Typed client for the REST control plane of a FlowRT runtime. Connect to a
//! runtime with [`Remote`], inspect its [`Flowgraphs`](Flowgraph) and
//! [`Blocks`](Block), and invoke message handlers with
//! [`Pmt`](flowrt_types::Pmt) arguments.

mod remote;
pub use remote::Block;
pub use remote::Connection;
pub use remote::Flowgraph;
pub use remote::Handler;
pub use remote::Remote;

use thiserror::Error;

/// Client error
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure
    #[error("transport error ({0})")]
    Transport(#[from] reqwest::Error),
    /// Payload could not be de-/serialized
    #[error("serde error ({0})")]
    Serde(#[from] serde_json::Error),
    /// Endpoint returned a non-success status
    #[error("endpoint {url} returned {status}")]
    Endpoint {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: reqwest::StatusCode,
    },
    /// No flowgraph with the given id
    #[error("wrong flowgraph id {0}")]
    FlowgraphId(usize),
}
