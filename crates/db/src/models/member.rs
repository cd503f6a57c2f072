//! Project membership rows and DTOs.

use pecha_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `members` table. The role is stored as its string code;
/// [`pecha_core::roles::Role::parse`] turns it into the closed enum.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Member {
    pub id: DbId,
    pub project_id: DbId,
    pub user_id: DbId,
    pub role: String,
    pub created_at: Timestamp,
}

/// A membership joined with the user's name, for listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MemberWithUser {
    pub user_id: DbId,
    pub username: String,
    pub role: String,
}

/// DTO for adding a member to a project.
#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub user_id: DbId,
    pub role: String,
}
