use std::time::Duration;

/// Errors that can occur on the device transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The configured address could not be resolved.
    #[error("failed to resolve {addr}: {source}")]
    Resolve {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to connect to the device.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// The connect attempt did not complete in time.
    #[error("connect to {addr} timed out after {after:?}")]
    ConnectTimeout { addr: String, after: Duration },

    /// A read or write did not complete before its deadline.
    #[error("{op} timed out after {after:?} ({transferred} bytes transferred)")]
    Timeout {
        op: &'static str,
        after: Duration,
        transferred: usize,
    },

    /// The peer closed the stream before the expected bytes arrived.
    #[error("short read: expected {expected} bytes, received {received}")]
    ShortRead { expected: usize, received: usize },

    /// An I/O error occurred on the stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    /// True if this error is a deadline expiry rather than a socket error.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout { .. } | TransportError::ConnectTimeout { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
