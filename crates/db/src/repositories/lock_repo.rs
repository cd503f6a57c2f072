//! Repository for the `example_locks` table.
//!
//! The partial unique index on active locks makes concurrent acquisition
//! safe: `INSERT ... ON CONFLICT DO NOTHING` either grants the lock or
//! returns nothing, and the caller reports the holder. Expired rows are
//! reclaimed inline on acquire and swept periodically by the cleanup task.

use pecha_core::types::DbId;
use sqlx::PgPool;

use crate::models::lock::{ExampleLock, LockWithHolder};

/// Column list for `example_locks` queries.
const LOCK_COLUMNS: &str =
    "id, example_id, locked_by, acquired_at, expires_at, released_at, is_active";

pub struct LockRepo;

impl LockRepo {
    /// Attempt to insert a fresh active lock.
    ///
    /// Returns the lock on success, or `None` when an active row already
    /// exists (the partial unique index rejected the insert).
    pub async fn try_insert(
        pool: &PgPool,
        example_id: DbId,
        user_id: DbId,
        timeout_mins: i64,
    ) -> Result<Option<ExampleLock>, sqlx::Error> {
        let query = format!(
            "INSERT INTO example_locks (example_id, locked_by, expires_at) \
             VALUES ($1, $2, NOW() + ($3::int * INTERVAL '1 minute')) \
             ON CONFLICT (example_id) WHERE is_active \
             DO NOTHING \
             RETURNING {LOCK_COLUMNS}"
        );
        sqlx::query_as::<_, ExampleLock>(&query)
            .bind(example_id)
            .bind(user_id)
            .bind(timeout_mins as i32)
            .fetch_optional(pool)
            .await
    }

    /// Extend the caller's active lock. Returns `None` when the caller does
    /// not hold one.
    pub async fn extend(
        pool: &PgPool,
        example_id: DbId,
        user_id: DbId,
        timeout_mins: i64,
    ) -> Result<Option<ExampleLock>, sqlx::Error> {
        let query = format!(
            "UPDATE example_locks \
             SET expires_at = NOW() + ($3::int * INTERVAL '1 minute') \
             WHERE example_id = $1 AND locked_by = $2 AND is_active = true \
             RETURNING {LOCK_COLUMNS}"
        );
        sqlx::query_as::<_, ExampleLock>(&query)
            .bind(example_id)
            .bind(user_id)
            .bind(timeout_mins as i32)
            .fetch_optional(pool)
            .await
    }

    /// Release the caller's active lock. Returns `true` if a row was released.
    pub async fn release(
        pool: &PgPool,
        example_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE example_locks SET is_active = false, released_at = NOW() \
             WHERE example_id = $1 AND locked_by = $2 AND is_active = true",
        )
        .bind(example_id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Release an example's active lock regardless of holder (admin unlock).
    pub async fn force_release(pool: &PgPool, example_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE example_locks SET is_active = false, released_at = NOW() \
             WHERE example_id = $1 AND is_active = true",
        )
        .bind(example_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// The active lock row for an example, expired or not.
    pub async fn get_active(
        pool: &PgPool,
        example_id: DbId,
    ) -> Result<Option<ExampleLock>, sqlx::Error> {
        let query = format!(
            "SELECT {LOCK_COLUMNS} FROM example_locks \
             WHERE example_id = $1 AND is_active = true"
        );
        sqlx::query_as::<_, ExampleLock>(&query)
            .bind(example_id)
            .fetch_optional(pool)
            .await
    }

    /// The active, unexpired lock joined with the holder's username.
    pub async fn get_active_with_holder(
        pool: &PgPool,
        example_id: DbId,
    ) -> Result<Option<LockWithHolder>, sqlx::Error> {
        sqlx::query_as::<_, LockWithHolder>(
            "SELECT l.example_id, l.locked_by, u.username AS locked_by_username, l.expires_at \
             FROM example_locks l \
             JOIN users u ON u.id = l.locked_by \
             WHERE l.example_id = $1 AND l.is_active = true AND l.expires_at > NOW()",
        )
        .bind(example_id)
        .fetch_optional(pool)
        .await
    }

    /// Deactivate an expired active lock on one example so a fresh insert
    /// can reclaim it. Returns `true` if a row was reclaimed.
    pub async fn reclaim_expired(pool: &PgPool, example_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE example_locks SET is_active = false, released_at = NOW() \
             WHERE example_id = $1 AND is_active = true AND expires_at <= NOW()",
        )
        .bind(example_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Sweep all expired active locks. Returns the number released.
    pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE example_locks SET is_active = false, released_at = NOW() \
             WHERE is_active = true AND expires_at <= NOW()",
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
