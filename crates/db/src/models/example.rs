//! Example rows and DTOs. Examples are opaque units of work; the tracker
//! never interprets their body.

use pecha_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `examples` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Example {
    pub id: DbId,
    pub project_id: DbId,
    pub body: String,
    pub created_at: Timestamp,
}

/// DTO for creating an example.
#[derive(Debug, Deserialize)]
pub struct CreateExampleRequest {
    pub body: String,
}
