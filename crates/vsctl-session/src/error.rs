use vsctl_frame::CommandType;

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error (dial, write, read, deadline).
    #[error("transport error: {0}")]
    Transport(#[from] vsctl_transport::TransportError),

    /// Frame-level error (checksum, length, unknown command).
    #[error("frame error: {0}")]
    Frame(#[from] vsctl_frame::FrameError),

    /// No usable connection right now. A reconnect has been requested.
    #[error("not connected to {0}")]
    NotConnected(String),

    /// The device answered with the error command: the function is greyed
    /// out, typically because no input source is active.
    #[error("function is disabled on the device")]
    FunctionDisabled,

    /// The response command or payload length does not fit the request.
    #[error("unexpected response {command}: {payload:02X?}")]
    UnexpectedResponse {
        command: CommandType,
        payload: Vec<u8>,
    },

    /// The session has been closed.
    #[error("session closed")]
    Closed,
}

impl SessionError {
    /// True if the failure concerns the link rather than the request, so the
    /// same call may succeed once the supervisor has reconnected.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionError::Transport(_)
                | SessionError::Frame(_)
                | SessionError::NotConnected(_)
                | SessionError::UnexpectedResponse { .. }
        )
    }

    /// True for checksum, length and command-shape violations.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            SessionError::Frame(_) | SessionError::UnexpectedResponse { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
