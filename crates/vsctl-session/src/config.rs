use std::time::Duration;

use vsctl_transport::DialConfig;

/// Register polled by the health check (power state).
pub const DEFAULT_HEALTH_CHECK_REGISTER: u16 = 0x1100;

/// Deadlines applied to each phase of an exchange.
///
/// The body deadline is separate from, and much tighter than,
/// the header deadline: once a header has arrived the body is expected to
/// follow immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Resolve and TCP connect. Default: 5 s.
    pub connect: Duration,
    /// Writing the request frame. Default: 2 s.
    pub write: Duration,
    /// Reading the 5-byte response header. Default: 2 s.
    pub header: Duration,
    /// Reading the response body and checksum. Default: 100 ms.
    pub body: Duration,
    /// Per-read window while discarding stray bytes. Default: 1 ms.
    pub drain: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            write: Duration::from_secs(2),
            header: Duration::from_secs(2),
            body: Duration::from_millis(100),
            drain: Duration::from_millis(1),
        }
    }
}

/// Exponential backoff between failed dial attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffConfig {
    /// First delay, and the delay after any successful dial. Default: 2 s.
    pub min: Duration,
    /// Upper bound for the delay. Default: 30 s.
    pub max: Duration,
    /// Growth per consecutive failure. Default: 1.19.
    pub factor: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(2),
            max: Duration::from_secs(30),
            factor: 1.19,
        }
    }
}

/// Configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Device address, `host:port` or bare host (default port 4661).
    pub address: String,
    /// Enable TCP keep-alive. Default: on.
    pub keepalive: bool,
    /// Exchange and dial deadlines.
    pub timeouts: Timeouts,
    /// Reconnect backoff.
    pub backoff: BackoffConfig,
    /// Period of the background health check. Default: 30 s.
    pub health_check_interval: Duration,
    /// Register read by the health check.
    pub health_check_register: u16,
}

impl SessionConfig {
    /// Configuration with defaults for the given device address.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            keepalive: true,
            timeouts: Timeouts::default(),
            backoff: BackoffConfig::default(),
            health_check_interval: Duration::from_secs(30),
            health_check_register: DEFAULT_HEALTH_CHECK_REGISTER,
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    pub(crate) fn dial_config(&self) -> DialConfig {
        DialConfig {
            connect_timeout: self.timeouts.connect,
            keepalive: self.keepalive,
            ..DialConfig::default()
        }
    }
}
