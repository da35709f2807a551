//! Background task that owns socket replacement.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vsctl_frame::CommandType;
use vsctl_transport::{DeviceStream, DialConfig};

use crate::access::read_request;
use crate::backoff::Backoff;
use crate::config::SessionConfig;
use crate::connection::{Connection, Vacated};
use crate::error::SessionError;
use crate::signal::ReconnectSignal;

/// Reacts to reconnect requests, health-check ticks and shutdown, one event
/// at a time. It is the only writer of the connection slot.
pub(crate) struct Supervisor {
    connection: Arc<Connection>,
    signal: Arc<ReconnectSignal>,
    shutdown: CancellationToken,
    dial: DialConfig,
    backoff: Backoff,
    health_check_interval: Duration,
    health_check_register: u16,
}

impl Supervisor {
    pub(crate) fn new(
        config: &SessionConfig,
        connection: Arc<Connection>,
        signal: Arc<ReconnectSignal>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            connection,
            signal,
            shutdown,
            dial: config.dial_config(),
            backoff: Backoff::new(config.backoff),
            health_check_interval: config.health_check_interval,
            health_check_register: config.health_check_register,
        }
    }

    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        let period = self.health_check_interval;
        let mut health = interval_at(Instant::now() + period, period);
        health.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = self.signal.wait() => self.reconnect().await,
                _ = health.tick() => self.health_check().await,
            }
        }

        if let Some(stream) = self.connection.take().await {
            stream.close().await;
        }
        info!(address = %self.connection.address(), "supervisor stopped");
    }

    async fn reconnect(&mut self) {
        match self.connection.vacate_unless_healthy().await {
            Vacated::Healthy => {
                debug!("connection healthy, dropping stale reconnect request");
                return;
            }
            Vacated::Empty(Some(stale)) => stale.close().await,
            Vacated::Empty(None) => {}
        }

        let address = self.connection.address().to_string();
        let dialed = tokio::select! {
            _ = self.shutdown.cancelled() => return,
            dialed = DeviceStream::connect(&address, &self.dial) => dialed,
        };

        match dialed {
            Ok(stream) => {
                info!(%address, peer = %stream.peer_addr(), "connected");
                self.backoff.reset();
                self.connection.install(stream).await;
            }
            Err(err) => {
                let delay = self.backoff.next_delay();
                warn!(%address, %err, retry_in = ?delay, "connect failed");
                tokio::select! {
                    _ = self.shutdown.cancelled() => {}
                    _ = tokio::time::sleep(delay) => {
                        self.signal.raise();
                    }
                }
            }
        }
    }

    async fn health_check(&self) {
        let request = read_request(self.health_check_register);
        match self.connection.dispatch(CommandType::Read, &request).await {
            Ok(response) => debug!(response = %response.command, "health check ok"),
            // dispatch has already requested a reconnect
            Err(SessionError::NotConnected(_)) => debug!("health check found no connection"),
            Err(err) => warn!(address = %self.connection.address(), %err, "health check failed"),
        }
    }
}
