//! Account lockout policy.
//!
//! Tracks failed login attempts per identity and computes lock/unlock
//! transitions. The policy is a pure state machine: every function takes
//! `now` explicitly and returns the next state, so callers decide when and
//! how to persist it. The repository applies transitions from a fresh row
//! read inside a transaction so two concurrent failures cannot both derive
//! a stale "not yet locked" state.

use chrono::{DateTime, Duration, Utc};

use crate::config::LockoutConfig;

/// Lock state of an identity, derived from its persisted counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// Not locked; `attempts` failures counted so far.
    Unlocked { attempts: u32 },
    /// Locked until the given time. `attempts` is the counter value at the
    /// moment the lock was taken.
    Locked {
        attempts: u32,
        until: DateTime<Utc>,
    },
}

impl LockState {
    /// The failed-attempt counter to persist for this state.
    pub fn attempts(&self) -> u32 {
        match self {
            LockState::Unlocked { attempts } => *attempts,
            LockState::Locked { attempts, .. } => *attempts,
        }
    }

    /// The lock expiry to persist, if any.
    pub fn locked_until(&self) -> Option<DateTime<Utc>> {
        match self {
            LockState::Unlocked { .. } => None,
            LockState::Locked { until, .. } => Some(*until),
        }
    }

    /// Whether the state is an active lock at `now`.
    pub fn is_locked(&self, now: DateTime<Utc>) -> bool {
        match self {
            LockState::Unlocked { .. } => false,
            LockState::Locked { until, .. } => now < *until,
        }
    }
}

/// Lockout policy: failure threshold, lock duration, and the idle window
/// after which the failure counter decays.
#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    max_attempts: u32,
    lockout_duration: Duration,
    reset_attempts_after: Duration,
}

impl LockoutPolicy {
    /// Create a policy from configuration.
    pub fn new(config: &LockoutConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            lockout_duration: Duration::seconds(config.lockout_duration_secs as i64),
            reset_attempts_after: Duration::seconds(config.reset_attempts_after_secs as i64),
        }
    }

    /// Derive the current state from persisted identity fields.
    pub fn state_of(
        &self,
        failed_attempts: u32,
        locked_until: Option<DateTime<Utc>>,
    ) -> LockState {
        match locked_until {
            Some(until) => LockState::Locked {
                attempts: failed_attempts,
                until,
            },
            None => LockState::Unlocked {
                attempts: failed_attempts,
            },
        }
    }

    /// Whether an identity with the given fields is locked at `now`.
    pub fn is_locked(
        &self,
        failed_attempts: u32,
        locked_until: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        self.state_of(failed_attempts, locked_until).is_locked(now)
    }

    /// Transition on a failed authentication attempt.
    ///
    /// - An active lock is left unchanged (callers reject before counting).
    /// - An expired lock restarts the counter at 1.
    /// - A counter whose last failure is older than the decay window
    ///   restarts at 1 rather than accumulating stale history.
    /// - Reaching the threshold takes the lock for the configured duration.
    pub fn on_failure(
        &self,
        failed_attempts: u32,
        last_failed_at: Option<DateTime<Utc>>,
        locked_until: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> LockState {
        if let Some(until) = locked_until {
            if now < until {
                return LockState::Locked {
                    attempts: failed_attempts,
                    until,
                };
            }
            // Lock expired: this failure starts a fresh count
            return LockState::Unlocked { attempts: 1 };
        }

        let attempts = match last_failed_at {
            Some(t) if now - t < self.reset_attempts_after => failed_attempts + 1,
            _ => 1,
        };

        if attempts >= self.max_attempts {
            LockState::Locked {
                attempts,
                until: now + self.lockout_duration,
            }
        } else {
            LockState::Unlocked { attempts }
        }
    }

    /// Transition on successful authentication: unconditional reset.
    pub fn on_success(&self) -> LockState {
        LockState::Unlocked { attempts: 0 }
    }

    /// Failure threshold.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Lock duration.
    pub fn lockout_duration(&self) -> Duration {
        self.lockout_duration
    }
}
