//! Refresh scheduling.
//!
//! The engine keeps exactly one pending wake-up: a deadline plus the
//! reason it was scheduled. Success and failure reschedule on different
//! intervals, which bounds retries without a separate backoff state
//! machine, and makes the timing testable without wall-clock waits.

use tokio::time::Instant;

use crate::config::BackdropConfig;

/// Why the next cycle was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeReason {
    /// Regular polling after a successful (or clean no-op) cycle.
    Poll,
    /// Retry after a transient failure.
    Backoff,
    /// An out-of-band request wants a cycle as soon as possible.
    Immediate,
}

/// The single scheduled wake-up of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSchedule {
    deadline: Instant,
    reason: WakeReason,
}

impl RefreshSchedule {
    /// Schedules the next poll after a successful cycle.
    #[must_use]
    pub fn after_success(config: &BackdropConfig) -> Self {
        Self {
            deadline: Instant::now() + config.poll_interval(),
            reason: WakeReason::Poll,
        }
    }

    /// Schedules a retry after a transient failure.
    #[must_use]
    pub fn after_failure(config: &BackdropConfig) -> Self {
        Self {
            deadline: Instant::now() + config.error_interval(),
            reason: WakeReason::Backoff,
        }
    }

    /// Schedules a cycle for right now.
    #[must_use]
    pub fn immediately() -> Self {
        Self {
            deadline: Instant::now(),
            reason: WakeReason::Immediate,
        }
    }

    /// The instant the engine should run its next cycle.
    #[must_use]
    pub const fn deadline(&self) -> Instant { self.deadline }

    /// Why this wake-up exists.
    #[must_use]
    pub const fn reason(&self) -> WakeReason { self.reason }
}
