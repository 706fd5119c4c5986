#![warn(missing_docs)]
//! # FlowRT Types
//!
//! Types that are shared between the FlowRT runtime and the outside world.
//! Everything in this crate is plain data: it is what travels over the
//! flowgraph's REST control plane and what message handlers consume and
//! produce.

mod description;
pub use description::BlockDescription;
pub use description::FlowgraphDescription;
pub use description::FlowgraphSummary;

mod pmt;
pub use pmt::Pmt;
pub use pmt::PmtAny;
pub use pmt::PmtConversionError;
pub use pmt::PmtKind;

mod block_id;
pub use block_id::BlockId;
mod flowgraph_id;
pub use flowgraph_id::FlowgraphId;
mod port_id;
pub use port_id::PortId;
