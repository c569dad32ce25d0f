//! In-process message bus.
//!
//! - [`Topic`]: the closed set of channels and the payload each accepts
//! - [`Dispatcher`]: synchronous, depth-first publish/subscribe
//! - [`MessageLog`] / [`LogStore`]: bounded append-only history on disk

pub mod dispatcher;
pub mod envelope;
pub mod log;
pub mod topic;

pub use dispatcher::{Dispatcher, Handler};
pub use envelope::{Envelope, Payload};
pub use log::{LogStore, MessageLog};
pub use topic::{PayloadKind, Topic, UnknownTopic};
