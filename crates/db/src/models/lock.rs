//! Example lock rows and DTOs.

use pecha_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `example_locks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExampleLock {
    pub id: DbId,
    pub example_id: DbId,
    pub locked_by: DbId,
    pub acquired_at: Timestamp,
    pub expires_at: Timestamp,
    pub released_at: Option<Timestamp>,
    pub is_active: bool,
}

/// An active lock joined with the holder's username, for conflict messages
/// and the tracking snapshot.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LockWithHolder {
    pub example_id: DbId,
    pub locked_by: DbId,
    pub locked_by_username: String,
    pub expires_at: Timestamp,
}
