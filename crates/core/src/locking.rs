//! Lock policy: timeout constants, bounds validation, and the pure
//! acquire/release decisions.
//!
//! The repository enforces the single-active-lock invariant with a partial
//! unique index; the decisions here determine what that invariant means for
//! a caller -- idempotent re-acquire, expiry reclaim, holder reported on
//! conflict -- so the API and any tooling agree on the semantics.

use crate::types::{DbId, Timestamp};

/// Default lock lifetime in minutes.
pub const DEFAULT_LOCK_TIMEOUT_MINS: i64 = 15;

/// Minimum configurable lock lifetime in minutes.
pub const MIN_LOCK_TIMEOUT_MINS: i64 = 1;

/// Maximum configurable lock lifetime in minutes (4 hours).
pub const MAX_LOCK_TIMEOUT_MINS: i64 = 240;

/// How often the expired-lock sweep runs (in seconds).
pub const LOCK_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Validate a configured lock timeout. Returns `Ok(())` or an error message.
pub fn validate_lock_timeout(minutes: i64) -> Result<(), String> {
    if minutes < MIN_LOCK_TIMEOUT_MINS {
        return Err(format!(
            "Lock timeout must be at least {MIN_LOCK_TIMEOUT_MINS} minute(s), got {minutes}"
        ));
    }
    if minutes > MAX_LOCK_TIMEOUT_MINS {
        return Err(format!(
            "Lock timeout must be at most {MAX_LOCK_TIMEOUT_MINS} minutes, got {minutes}"
        ));
    }
    Ok(())
}

/// The currently recorded lock on an example, as read from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveLock {
    pub locked_by: DbId,
    pub expires_at: Timestamp,
}

impl ActiveLock {
    /// A lock past its expiry is invalid and may be reclaimed silently.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        self.expires_at > now
    }
}

/// Outcome of an acquire attempt against the recorded lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireDecision {
    /// No valid lock exists; grant a fresh one (reclaiming any expired row).
    Granted,
    /// The caller already holds a valid lock; extend its expiry.
    Extended,
    /// Another user holds a valid lock.
    Conflict { holder: DbId },
}

/// Decide an acquire attempt. Re-acquiring your own valid lock extends it.
pub fn decide_acquire(
    existing: Option<&ActiveLock>,
    caller: DbId,
    now: Timestamp,
) -> AcquireDecision {
    match existing {
        Some(lock) if lock.is_valid_at(now) => {
            if lock.locked_by == caller {
                AcquireDecision::Extended
            } else {
                AcquireDecision::Conflict {
                    holder: lock.locked_by,
                }
            }
        }
        _ => AcquireDecision::Granted,
    }
}

/// Outcome of a release attempt against the recorded lock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseDecision {
    /// The caller holds the lock (or it had already expired); release it.
    Released,
    /// Nothing to release; treated as success.
    NotHeld,
    /// A different user holds a valid lock; a soft failure, never a crash.
    HeldByOther { holder: DbId },
}

/// Decide a release attempt. Releasing a lock you do not hold is reported,
/// not raised; releasing an expired or absent lock is a no-op.
pub fn decide_release(
    existing: Option<&ActiveLock>,
    caller: DbId,
    now: Timestamp,
) -> ReleaseDecision {
    match existing {
        Some(lock) if lock.is_valid_at(now) => {
            if lock.locked_by == caller {
                ReleaseDecision::Released
            } else {
                ReleaseDecision::HeldByOther {
                    holder: lock.locked_by,
                }
            }
        }
        Some(_) => ReleaseDecision::Released,
        None => ReleaseDecision::NotHeld,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn lock(holder: DbId, expires_in_mins: i64) -> ActiveLock {
        ActiveLock {
            locked_by: holder,
            expires_at: Utc::now() + Duration::minutes(expires_in_mins),
        }
    }

    #[test]
    fn acquire_on_unlocked_example_is_granted() {
        assert_eq!(decide_acquire(None, 7, Utc::now()), AcquireDecision::Granted);
    }

    #[test]
    fn reacquire_by_holder_extends() {
        let existing = lock(7, 10);
        assert_eq!(
            decide_acquire(Some(&existing), 7, Utc::now()),
            AcquireDecision::Extended
        );
    }

    #[test]
    fn acquire_against_valid_foreign_lock_reports_the_holder() {
        let existing = lock(7, 10);
        assert_eq!(
            decide_acquire(Some(&existing), 8, Utc::now()),
            AcquireDecision::Conflict { holder: 7 }
        );
    }

    #[test]
    fn expired_lock_is_silently_reclaimed() {
        let existing = lock(7, -1);
        assert_eq!(
            decide_acquire(Some(&existing), 8, Utc::now()),
            AcquireDecision::Granted
        );
    }

    #[test]
    fn release_by_holder_succeeds() {
        let existing = lock(7, 10);
        assert_eq!(
            decide_release(Some(&existing), 7, Utc::now()),
            ReleaseDecision::Released
        );
    }

    #[test]
    fn release_of_foreign_lock_is_a_soft_failure() {
        let existing = lock(7, 10);
        assert_eq!(
            decide_release(Some(&existing), 8, Utc::now()),
            ReleaseDecision::HeldByOther { holder: 7 }
        );
    }

    #[test]
    fn release_with_no_lock_is_a_noop() {
        assert_eq!(decide_release(None, 7, Utc::now()), ReleaseDecision::NotHeld);

        // An expired row is dead weight either way.
        let existing = lock(9, -5);
        assert_eq!(
            decide_release(Some(&existing), 7, Utc::now()),
            ReleaseDecision::Released
        );
    }

    #[test]
    fn timeout_bounds() {
        assert!(validate_lock_timeout(MIN_LOCK_TIMEOUT_MINS).is_ok());
        assert!(validate_lock_timeout(DEFAULT_LOCK_TIMEOUT_MINS).is_ok());
        assert!(validate_lock_timeout(MAX_LOCK_TIMEOUT_MINS).is_ok());

        assert!(validate_lock_timeout(0).is_err());
        assert!(validate_lock_timeout(-3).is_err());
        assert!(validate_lock_timeout(MAX_LOCK_TIMEOUT_MINS + 1).is_err());
    }
}
