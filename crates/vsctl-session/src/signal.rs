//! Single-slot reconnect request.
//!
//! Any number of failures may raise the signal concurrently; they collapse
//! into at most one pending request, which the supervisor consumes.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Coalescing, non-blocking reconnect request flag.
#[derive(Debug, Default)]
pub struct ReconnectSignal {
    pending: AtomicBool,
    notify: Notify,
}

impl ReconnectSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a reconnect. Never blocks.
    ///
    /// Returns `true` if this call armed the signal, `false` if a request was
    /// already pending.
    pub fn raise(&self) -> bool {
        if self.pending.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.notify.notify_one();
        true
    }

    /// Whether a request is waiting to be consumed.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Consume the pending request, if any.
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Wait until a request is pending and consume it.
    ///
    /// Cancel safe: dropping the future leaves a pending request in place.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            if self.take() {
                return;
            }
            notified.await;
        }
    }
}
