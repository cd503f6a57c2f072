//! Assignment rows and DTOs.
//!
//! An assignment binds one example to one annotator and carries the tracking
//! status. Records are never deleted: reassignment deactivates the old row
//! (status `reassigned`) and inserts a fresh active one, preserving history.

use pecha_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `assignments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Assignment {
    pub id: DbId,
    pub project_id: DbId,
    pub example_id: DbId,
    pub assigned_to: DbId,
    pub assigned_by: Option<DbId>,
    pub status: String,
    pub started_at: Option<Timestamp>,
    pub submitted_at: Option<Timestamp>,
    pub reviewed_by: Option<DbId>,
    pub reviewed_at: Option<Timestamp>,
    pub review_notes: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An assignment joined with usernames, for listings and export.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AssignmentWithNames {
    pub id: DbId,
    pub example_id: DbId,
    pub assigned_to: String,
    pub status: String,
    pub started_at: Option<Timestamp>,
    pub submitted_at: Option<Timestamp>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<Timestamp>,
    pub review_notes: Option<String>,
}

/// Raw aggregation input row; converted into
/// [`pecha_core::stats::AssignmentRecord`] by the repository.
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentRecordRow {
    pub example_id: DbId,
    pub assigned_to: Option<String>,
    pub status: String,
    pub reviewed_by: Option<String>,
}

/// DTO for creating an assignment (manager assigns an example).
#[derive(Debug, Deserialize)]
pub struct CreateAssignmentRequest {
    pub example_id: DbId,
    pub assigned_to: DbId,
}

/// DTO for the approve action. Notes are optional feedback.
#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

/// DTO for the reject action. Notes are mandatory feedback for the
/// annotator; emptiness is rejected by the workflow guard.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

/// DTO for reassigning a rejected example. Defaults to the current annotator
/// when no new assignee is given.
#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    #[serde(default)]
    pub assigned_to: Option<DbId>,
}

/// Offset/limit paging for assignment listings.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}
