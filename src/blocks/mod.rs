//! ## Stock message blocks
//!
//! | Block | Usage |
//! |---|---|
//! | [`MessageApply`] | Apply a function to each incoming message, forwarding the result |
//! | [`MessageBurst`] | Output a given number of messages in one burst and terminate |
//! | [`MessageCopy`] | Forward messages from `in` to `out` |
//! | [`MessageSink`] | Count incoming messages |
//! | [`MessageSource`] | Output the same message periodically |

mod message_apply;
pub use message_apply::MessageApply;
mod message_burst;
pub use message_burst::MessageBurst;
mod message_copy;
pub use message_copy::MessageCopy;
mod message_sink;
pub use message_sink::MessageSink;
mod message_source;
pub use message_source::MessageSource;
pub use message_source::MessageSourceBuilder;
