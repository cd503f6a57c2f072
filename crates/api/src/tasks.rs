//! Background tasks spawned by the server binary.

use pecha_core::locking::LOCK_CLEANUP_INTERVAL_SECS;
use pecha_db::repositories::LockRepo;
use pecha_db::DbPool;
use tokio::task::JoinHandle;

/// Periodically sweep expired editing locks.
///
/// Expiry is also enforced inline on acquire, so this task only keeps the
/// lock table tidy and the `is_locked` flag accurate for long-idle examples.
pub fn start_lock_cleanup(pool: DbPool) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(std::time::Duration::from_secs(LOCK_CLEANUP_INTERVAL_SECS));
        loop {
            interval.tick().await;
            match LockRepo::cleanup_expired(&pool).await {
                Ok(0) => {}
                Ok(released) => {
                    tracing::debug!(released, "Expired locks swept");
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Expired-lock sweep failed");
                }
            }
        }
    })
}
