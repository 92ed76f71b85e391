//! Polling policy and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Bounds for the confirmation polling loop.
///
/// The attempt budget is the sole timeout mechanism: the loop gives up
/// after `max_attempts` checks, roughly `initial_delay +
/// interval × (max_attempts - 1)` of wall clock.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Grace period before the first check, giving the provider time to
    /// register the transaction.
    pub initial_delay: Duration,
    /// Delay between checks.
    pub interval: Duration,
    /// Maximum number of status checks.
    pub max_attempts: u32,
}

impl PollPolicy {
    /// Create a policy with the given attempt budget.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Set the initial grace delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the interval between checks.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Upper bound on how long the loop can run.
    pub fn max_wait(&self) -> Duration {
        let polls = self.max_attempts.saturating_sub(1);
        self.initial_delay + self.interval * polls
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(5),
            interval: Duration::from_secs(5),
            max_attempts: 12,
        }
    }
}

/// Cooperative cancellation flag for a polling loop.
///
/// Cloneable; cancelling any clone stops the loop at its next check. A
/// poll result that arrives after cancellation is discarded, but a
/// status already applied to the order is not rolled back.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, un-cancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
