use std::time::Duration;

use crate::config::BackoffConfig;

/// Delay schedule between failed dial attempts.
///
/// The n-th consecutive failure waits `min * factor^n`, capped at `max`.
/// A successful dial resets the schedule to `min`.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    attempt: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// The delay the next failure will wait.
    pub fn current(&self) -> Duration {
        let min = self.config.min;
        let max = self.config.max.max(min);
        let factor = self.config.factor.max(1.0);
        let exponent = self.attempt.min(i32::MAX as u32) as i32;
        let secs = min.as_secs_f64() * factor.powi(exponent);
        if !secs.is_finite() || secs >= max.as_secs_f64() {
            return max;
        }
        Duration::from_secs_f64(secs).max(min)
    }

    /// Return the delay for this failure and grow the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current();
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    /// Back to `min` after a successful dial.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Consecutive failures since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}
