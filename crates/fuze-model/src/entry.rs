use std::time::{Duration, SystemTime};

use crate::retry::RetryFlag;

/// Immutable snapshot of a propagated request budget.
///
/// Produced by decoding a carrier or by direct construction; never mutated
/// in place. "No deadline" is `None`, not a zero-valued sentinel, so an
/// absent budget can never be confused with a real deadline near the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BudgetEntry {
    timeout: Duration,
    deadline: Option<SystemTime>,
    retry: RetryFlag,
}

impl BudgetEntry {
    /// Build an entry from explicit parts.
    pub fn new(timeout: Duration, deadline: Option<SystemTime>, retry: RetryFlag) -> Self {
        Self {
            timeout,
            deadline,
            retry,
        }
    }

    /// Build an entry whose deadline is `now + timeout`.
    ///
    /// A zero timeout yields no deadline at all.
    pub fn from_timeout(timeout: Duration, retry: RetryFlag) -> Self {
        let deadline = (timeout > Duration::ZERO).then(|| SystemTime::now() + timeout);
        Self {
            timeout,
            deadline,
            retry,
        }
    }

    /// Timeout the deadline was derived from.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute deadline, if one exists.
    pub fn deadline(&self) -> Option<SystemTime> {
        self.deadline
    }

    /// Propagated retry permission.
    pub fn retry(&self) -> RetryFlag {
        self.retry
    }

    /// Budget left at `now`, floored at zero.
    ///
    /// `None` when the entry carries no deadline.
    pub fn remaining_at(&self, now: SystemTime) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.duration_since(now).unwrap_or(Duration::ZERO))
    }
}
