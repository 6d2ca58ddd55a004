//! Connection establishment: address classification, spawn, readiness, and the session handle.
mod establish;
pub mod readiness;
mod target;
mod transport;

pub use establish::{
    attach_target, ConnectionMode, Establisher, DEFAULT_EMBED_PROG, DEFAULT_LISTEN_PROG,
};
pub use readiness::{WaitOutcome, WaitPolicy, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT};
pub use target::{ConnectionTarget, DEFAULT_TCP_PORT};
pub use transport::{ChildIoBridge, Session, SessionKind, SessionStream};
