//! The socket slot and the exclusive-access guard around it.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};
use vsctl_frame::{CommandType, Frame};
use vsctl_transport::DeviceStream;

use crate::config::Timeouts;
use crate::error::{Result, SessionError};
use crate::exchange::exchange;
use crate::signal::ReconnectSignal;

/// Owner of the device socket.
///
/// The slot is either empty or holds a fully connected stream; exchanges run
/// one at a time while holding the slot lock (a FIFO async mutex, so waiting
/// callers are served in arrival order). Only the supervisor installs or
/// removes streams. A stream whose exchange failed stays in the slot, marked
/// untrusted, until the supervisor replaces it, and is never used again.
#[derive(Debug)]
pub struct Connection {
    address: String,
    slot: Mutex<Option<DeviceStream>>,
    signal: Arc<ReconnectSignal>,
    timeouts: Timeouts,
}

/// What the supervisor found when it came to replace the stream.
#[derive(Debug)]
pub(crate) enum Vacated {
    /// The current stream is still trusted; nothing was removed.
    Healthy,
    /// The slot is now empty. Holds the removed stream, if there was one.
    Empty(Option<DeviceStream>),
}

impl Connection {
    pub fn new(address: impl Into<String>, timeouts: Timeouts, signal: Arc<ReconnectSignal>) -> Self {
        Self {
            address: address.into(),
            slot: Mutex::new(None),
            signal,
            timeouts,
        }
    }

    /// Run one exchange on the current stream.
    ///
    /// Fails fast with [`SessionError::NotConnected`] (after requesting a
    /// reconnect) when there is no trusted stream; it never waits for the
    /// supervisor to reconnect.
    pub async fn dispatch(&self, command: CommandType, payload: &[u8]) -> Result<Frame> {
        self.dispatch_checked(command, payload, Ok).await
    }

    /// Run one exchange and check the response before releasing the slot.
    ///
    /// A protocol error from `check` marks the stream untrusted and requests
    /// a reconnect while the lock is still held, so no queued caller ever
    /// exchanges on it.
    pub async fn dispatch_checked<T>(
        &self,
        command: CommandType,
        payload: &[u8],
        check: impl FnOnce(Frame) -> Result<T>,
    ) -> Result<T> {
        let mut slot = self.slot.lock().await;
        let Some(stream) = slot.as_mut().filter(|stream| stream.is_trusted()) else {
            self.signal.raise();
            return Err(SessionError::NotConnected(self.address.clone()));
        };
        let response = exchange(stream, &self.signal, &self.timeouts, command, payload).await?;
        let checked = check(response);
        if let Err(err) = &checked {
            if err.is_protocol() {
                warn!(peer = %stream.peer_addr(), request = %command, %err, "response violates protocol, dropping connection");
                stream.mark_untrusted();
                self.signal.raise();
            }
        }
        checked
    }

    /// True if a trusted stream is installed.
    pub async fn is_connected(&self) -> bool {
        self.slot
            .lock()
            .await
            .as_ref()
            .is_some_and(DeviceStream::is_trusted)
    }

    /// Device address this connection dials.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Empty the slot unless it holds a trusted stream.
    pub(crate) async fn vacate_unless_healthy(&self) -> Vacated {
        let mut slot = self.slot.lock().await;
        if slot.as_ref().is_some_and(DeviceStream::is_trusted) {
            return Vacated::Healthy;
        }
        Vacated::Empty(slot.take())
    }

    /// Empty the slot unconditionally.
    pub(crate) async fn take(&self) -> Option<DeviceStream> {
        self.slot.lock().await.take()
    }

    /// Install a freshly dialed stream.
    pub(crate) async fn install(&self, stream: DeviceStream) {
        debug!(peer = %stream.peer_addr(), "installing connection");
        let previous = self.slot.lock().await.replace(stream);
        if let Some(previous) = previous {
            previous.close().await;
        }
    }
}
