//! Per-project role guards.
//!
//! Roles live on the membership row, not in the token, so these guards are
//! helper functions taking the project id from the request path rather than
//! extractors. Each resolves the caller's membership and checks a capability
//! on the closed [`Role`] enum; a failed check is 403 and never mutates
//! anything downstream.

use pecha_core::error::CoreError;
use pecha_core::roles::Role;
use pecha_core::types::DbId;
use pecha_db::repositories::MemberRepo;
use pecha_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;

/// The caller must be a member of the project. Returns their role.
pub async fn require_member(
    pool: &DbPool,
    project_id: DbId,
    auth: &AuthUser,
) -> AppResult<Role> {
    MemberRepo::find_role(pool, project_id, auth.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Forbidden(
                "You are not a member of this project".into(),
            ))
        })
}

/// The caller must be able to review (approver or above). Returns their role.
pub async fn require_reviewer(
    pool: &DbPool,
    project_id: DbId,
    auth: &AuthUser,
) -> AppResult<Role> {
    let role = require_member(pool, project_id, auth).await?;
    if !role.can_review() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Approver role required".into(),
        )));
    }
    Ok(role)
}

/// The caller must be able to manage (project manager or above). Returns
/// their role.
pub async fn require_manager(
    pool: &DbPool,
    project_id: DbId,
    auth: &AuthUser,
) -> AppResult<Role> {
    let role = require_member(pool, project_id, auth).await?;
    if !role.can_manage() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Manager role required".into(),
        )));
    }
    Ok(role)
}

/// The caller must be a project admin. Returns their role.
pub async fn require_admin(pool: &DbPool, project_id: DbId, auth: &AuthUser) -> AppResult<Role> {
    let role = require_member(pool, project_id, auth).await?;
    if !role.is_admin() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Admin role required".into(),
        )));
    }
    Ok(role)
}
