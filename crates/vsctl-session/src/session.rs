use std::fmt;
use std::sync::{Arc, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use vsctl_frame::{CommandType, Frame};

use crate::config::SessionConfig;
use crate::connection::Connection;
use crate::error::{Result, SessionError};
use crate::signal::ReconnectSignal;
use crate::supervisor::Supervisor;

const CONNECT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// A self-healing control session with one device.
///
/// Safe to share between tasks (wrap it in an `Arc`); concurrent calls are
/// serialized on the wire. While the link is down every call fails fast with
/// [`SessionError::NotConnected`] and the background supervisor keeps
/// redialing with exponential backoff until [`Session::close`].
pub struct Session {
    connection: Arc<Connection>,
    signal: Arc<ReconnectSignal>,
    shutdown: CancellationToken,
    supervisor: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Session {
    /// Start a session and its supervisor. The first dial happens in the
    /// background; use [`Session::wait_connected`] to wait for it.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(config: SessionConfig) -> Self {
        let signal = Arc::new(ReconnectSignal::new());
        let connection = Arc::new(Connection::new(
            config.address.clone(),
            config.timeouts,
            Arc::clone(&signal),
        ));
        let shutdown = CancellationToken::new();

        let supervisor = Supervisor::new(
            &config,
            Arc::clone(&connection),
            Arc::clone(&signal),
            shutdown.clone(),
        )
        .spawn();
        signal.raise();
        info!(address = %config.address, "session started");

        Self {
            connection,
            signal,
            shutdown,
            supervisor: std::sync::Mutex::new(Some(supervisor)),
        }
    }

    /// Start a session and wait up to `timeout` for the first connection.
    ///
    /// On failure the session is closed before the error is returned.
    pub async fn connect(config: SessionConfig, timeout: Duration) -> Result<Self> {
        let session = Self::start(config);
        match session.wait_connected(timeout).await {
            Ok(()) => Ok(session),
            Err(err) => {
                session.close().await;
                Err(err)
            }
        }
    }

    /// Device address of this session.
    pub fn address(&self) -> &str {
        self.connection.address()
    }

    /// True if a usable connection is installed right now.
    pub async fn is_connected(&self) -> bool {
        self.connection.is_connected().await
    }

    /// Poll until connected, the session is closed, or `timeout` elapses.
    pub async fn wait_connected(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_closed() {
                return Err(SessionError::Closed);
            }
            if self.is_connected().await {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(SessionError::NotConnected(self.address().to_string()));
            }
            tokio::time::sleep(CONNECT_POLL_INTERVAL).await;
        }
    }

    /// Ask the supervisor to redial once the current stream is unusable.
    ///
    /// Returns `false` if a request was already pending.
    pub fn request_reconnect(&self) -> bool {
        self.signal.raise()
    }

    /// Run one raw exchange. The typed accessors are built on this.
    pub async fn dispatch(&self, command: CommandType, payload: &[u8]) -> Result<Frame> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        self.connection.dispatch(command, payload).await
    }

    pub(crate) async fn dispatch_checked<T>(
        &self,
        command: CommandType,
        payload: &[u8],
        check: impl FnOnce(Frame) -> Result<T>,
    ) -> Result<T> {
        if self.is_closed() {
            return Err(SessionError::Closed);
        }
        self.connection.dispatch_checked(command, payload, check).await
    }

    /// True once [`Session::close`] has been called or the session dropped.
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Stop the supervisor and close the connection.
    ///
    /// Exchanges already in flight are not aborted; they finish or fail on
    /// their own deadlines.
    pub async fn close(&self) {
        self.shutdown.cancel();
        let handle = self
            .supervisor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!(address = %self.address(), %err, "supervisor ended abnormally");
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.address())
            .field("closed", &self.is_closed())
            .finish()
    }
}
