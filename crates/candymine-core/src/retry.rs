//! Bounded retry for a single work item
//!
//! Each item walks an explicit state machine:
//!
//! ```text
//! Pending -> Attempting -> (FailedAttempt -> Attempting)* -> Succeeded | Exhausted
//! ```
//!
//! Nothing here survives past one item.

use std::time::Duration;

use crate::shutdown::{is_shutdown_requested, sleep_unless_shutdown};

/// Retries beyond the first attempt (5 attempts in total).
pub const MAX_RETRIES: u32 = 4;

/// Wait before the first retry; doubles for every retry after it.
pub const DEFAULT_MIN_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub min_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: MAX_RETRIES,
            min_backoff: DEFAULT_MIN_BACKOFF,
        }
    }
}

impl RetryPolicy {
    /// Default ceiling with a custom first backoff (zero disables the wait).
    pub fn with_min_backoff(min_backoff: Duration) -> Self {
        Self {
            min_backoff,
            ..Self::default()
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.retries + 1
    }

    /// Backoff after failed attempt `attempt` (1-based): min, 2*min, 4*min, ...
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.min_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Where a work item stands in its retry cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemState {
    Pending,
    Attempting { attempt: u32 },
    FailedAttempt { attempt: u32 },
    Succeeded { attempts: u32 },
    Exhausted { attempts: u32 },
}

impl ItemState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Exhausted { .. })
    }
}

/// Per-item retry state machine.
#[derive(Debug)]
pub struct RetryState {
    policy: RetryPolicy,
    state: ItemState,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: ItemState::Pending,
        }
    }

    pub fn state(&self) -> ItemState {
        self.state
    }

    /// Enter `Attempting`, returning the 1-based attempt number.
    pub fn begin_attempt(&mut self) -> u32 {
        let attempt = match self.state {
            ItemState::Pending => 1,
            ItemState::FailedAttempt { attempt } => attempt + 1,
            other => panic!("begin_attempt from {other:?}"),
        };
        self.state = ItemState::Attempting { attempt };
        attempt
    }

    pub fn record_success(&mut self) {
        let ItemState::Attempting { attempt } = self.state else {
            panic!("record_success from {:?}", self.state);
        };
        self.state = ItemState::Succeeded { attempts: attempt };
    }

    /// Record a failed attempt. Returns `true` if another attempt is allowed.
    pub fn record_failure(&mut self, retryable: bool) -> bool {
        let ItemState::Attempting { attempt } = self.state else {
            panic!("record_failure from {:?}", self.state);
        };
        if retryable && attempt < self.policy.total_attempts() {
            self.state = ItemState::FailedAttempt { attempt };
            true
        } else {
            self.state = ItemState::Exhausted { attempts: attempt };
            false
        }
    }
}

/// One failed attempt, as handed to the failure callback.
#[derive(Debug)]
pub struct FailedAttempt<'a, E> {
    /// 1-based attempt number
    pub attempt: u32,
    /// Attempt ceiling for this item
    pub max_attempts: u32,
    /// `true` when no further attempt follows
    pub last: bool,
    pub error: &'a E,
}

/// Terminal outcome of one work item.
#[derive(Debug)]
pub enum ItemOutcome<T, E> {
    Succeeded { value: T, attempts: u32 },
    Exhausted { error: E, attempts: u32 },
}

impl<T, E> ItemOutcome<T, E> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Succeeded { attempts, .. } | Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Self::Succeeded { value, .. } => Some(value),
            Self::Exhausted { .. } => None,
        }
    }
}

/// Attempt `attempt_fn` until it succeeds, fails non-retryably, or the
/// ceiling is reached.
///
/// `on_failed_attempt` runs exactly once per failed attempt, including the
/// last one. Between attempts the policy's backoff is slept; a shutdown
/// request ends the item at the next failure or during the wait.
pub fn retry<T, E>(
    policy: &RetryPolicy,
    mut attempt_fn: impl FnMut(u32) -> Result<T, E>,
    is_retryable: impl Fn(&E) -> bool,
    mut on_failed_attempt: impl FnMut(&FailedAttempt<'_, E>),
) -> ItemOutcome<T, E> {
    let mut state = RetryState::new(*policy);
    loop {
        let attempt = state.begin_attempt();
        match attempt_fn(attempt) {
            Ok(value) => {
                state.record_success();
                return ItemOutcome::Succeeded {
                    value,
                    attempts: attempt,
                };
            }
            Err(error) => {
                // A pending shutdown turns this failure into the last one
                let again = state.record_failure(is_retryable(&error) && !is_shutdown_requested());
                on_failed_attempt(&FailedAttempt {
                    attempt,
                    max_attempts: policy.total_attempts(),
                    last: !again,
                    error: &error,
                });
                if !again {
                    return ItemOutcome::Exhausted {
                        error,
                        attempts: attempt,
                    };
                }
                let wait = policy.backoff(attempt);
                if !wait.is_zero() {
                    log::debug!("attempt {attempt} failed, next in {wait:?}");
                }
                if !sleep_unless_shutdown(wait) {
                    log::debug!("shutdown requested, abandoning after attempt {attempt}");
                    return ItemOutcome::Exhausted {
                        error,
                        attempts: attempt,
                    };
                }
            }
        }
    }
}
