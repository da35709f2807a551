//! Self-healing command/response session for projector control links.
//!
//! This is the "just works" layer. A [`Session`] owns one TCP connection to
//! the device and keeps it alive in the background: failed exchanges,
//! periodic health checks and shutdown are all handled by a supervisor task,
//! while callers use the typed accessors ([`Session::write`],
//! [`Session::read`], ...) and get a typed error back immediately whenever
//! the link is down.

pub mod access;
pub mod backoff;
pub mod config;
pub mod connection;
pub mod error;
pub mod exchange;
pub mod session;
pub mod signal;
mod supervisor;

pub use access::{read_request, write_request, SUB_ADDRESS};
pub use backoff::Backoff;
pub use config::{BackoffConfig, SessionConfig, Timeouts, DEFAULT_HEALTH_CHECK_REGISTER};
pub use connection::Connection;
pub use error::{Result, SessionError};
pub use exchange::exchange;
pub use session::Session;
pub use signal::ReconnectSignal;
pub use vsctl_frame::{CommandType, Frame};
