//! Handlers for the per-example tracking workflow: status, locks, and the
//! start/submit/approve/reject/reassign transitions.
//!
//! Every transition goes through [`pecha_core::workflow::next_status`] before
//! anything is written, so a failed guard can never leave a partial mutation
//! behind. Responses return the fresh [`TrackingSnapshot`], which the client
//! treats as authoritative.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;

use pecha_core::error::CoreError;
use pecha_core::locking::{
    decide_acquire, decide_release, AcquireDecision, ActiveLock, ReleaseDecision,
};
use pecha_core::status::{style_for_code, TrackingStatus};
use pecha_core::types::DbId;
use pecha_core::view::TrackingSnapshot;
use pecha_core::workflow::{next_status, validate_review_notes, ActorContext, WorkflowEvent};
use pecha_db::models::assignment::{Assignment, ApproveRequest, ReassignRequest, RejectRequest};
use pecha_db::repositories::{AssignmentRepo, ExampleRepo, LockRepo};
use pecha_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{require_manager, require_member, require_reviewer};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /api/v1/projects/{p}/tracking/{e}/status
///
/// The derived tracking view for one example. An example with no assignment
/// reads as `pending`.
pub async fn get_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, example_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    require_member(&state.pool, project_id, &auth).await?;
    ensure_example_exists(&state.pool, project_id, example_id).await?;

    let snapshot = load_snapshot(&state.pool, example_id).await?;
    Ok(Json(DataResponse { data: snapshot }))
}

// ---------------------------------------------------------------------------
// Locks
// ---------------------------------------------------------------------------

/// POST /api/v1/projects/{p}/tracking/{e}/lock
///
/// Acquire the editing lock. Re-acquiring your own valid lock extends it;
/// an expired foreign lock is silently reclaimed; a valid foreign lock is a
/// 409 naming the holder.
pub async fn acquire_lock(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, example_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    require_member(&state.pool, project_id, &auth).await?;
    ensure_example_exists(&state.pool, project_id, example_id).await?;

    let timeout = state.config.lock_timeout_mins;
    let existing = LockRepo::get_active(&state.pool, example_id).await?;
    let existing_state = existing.as_ref().map(|l| ActiveLock {
        locked_by: l.locked_by,
        expires_at: l.expires_at,
    });

    let decision = decide_acquire(existing_state.as_ref(), auth.user_id, chrono::Utc::now());
    let lock = match decision {
        AcquireDecision::Extended => LockRepo::extend(&state.pool, example_id, auth.user_id, timeout)
            .await?
            .ok_or_else(|| {
                // The lock vanished between the read and the extend; re-acquire.
                AppError::Core(CoreError::Conflict(
                    "Lock state changed, please retry".into(),
                ))
            })?,
        AcquireDecision::Granted => {
            LockRepo::reclaim_expired(&state.pool, example_id).await?;
            match LockRepo::try_insert(&state.pool, example_id, auth.user_id, timeout).await? {
                Some(lock) => lock,
                // Lost the race against a concurrent acquirer.
                None => return Err(lock_conflict(&state.pool, example_id).await?),
            }
        }
        AcquireDecision::Conflict { .. } => {
            return Err(lock_conflict(&state.pool, example_id).await?)
        }
    };

    tracing::info!(
        user_id = auth.user_id,
        example_id,
        expires_at = %lock.expires_at,
        "Lock acquired"
    );
    Ok(Json(DataResponse { data: lock }))
}

/// POST /api/v1/projects/{p}/tracking/{e}/unlock
///
/// Release the editing lock. Only the holder (or an admin) releases a valid
/// lock; releasing nothing is a no-op success.
pub async fn release_lock(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, example_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let role = require_member(&state.pool, project_id, &auth).await?;
    ensure_example_exists(&state.pool, project_id, example_id).await?;

    let existing = LockRepo::get_active(&state.pool, example_id).await?;
    let existing_state = existing.as_ref().map(|l| ActiveLock {
        locked_by: l.locked_by,
        expires_at: l.expires_at,
    });

    let released = match decide_release(existing_state.as_ref(), auth.user_id, chrono::Utc::now())
    {
        ReleaseDecision::Released => {
            // Covers both the holder's own lock and an expired foreign row.
            LockRepo::force_release(&state.pool, example_id).await?
        }
        ReleaseDecision::NotHeld => false,
        ReleaseDecision::HeldByOther { holder } => {
            if role.is_admin() {
                LockRepo::force_release(&state.pool, example_id).await?
            } else {
                tracing::debug!(user_id = auth.user_id, holder, example_id, "Unlock denied");
                return Err(AppError::Core(CoreError::Forbidden(
                    "Cannot unlock an example locked by another user".into(),
                )));
            }
        }
    };

    Ok(Json(DataResponse {
        data: serde_json::json!({ "released": released }),
    }))
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// POST /api/v1/projects/{p}/tracking/{e}/start
///
/// Begin editing: requires a held lock. An unassigned example is
/// self-assigned to the caller; an example assigned to someone else cannot
/// be started.
pub async fn start_editing(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, example_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let role = require_member(&state.pool, project_id, &auth).await?;
    ensure_example_exists(&state.pool, project_id, example_id).await?;

    let assignment = match AssignmentRepo::find_active_for_example(&state.pool, example_id).await? {
        Some(a) if a.assigned_to != auth.user_id => {
            return Err(AppError::Core(CoreError::Forbidden(
                "This example is assigned to another annotator".into(),
            )));
        }
        Some(a) => a,
        // Unassigned examples can be picked up by any member.
        None => {
            AssignmentRepo::create(&state.pool, project_id, example_id, auth.user_id, auth.user_id)
                .await?
        }
    };

    let actor = actor_context(&state.pool, role, &assignment, &auth, example_id).await?;
    let current = current_status(&assignment)?;
    next_status(current, WorkflowEvent::StartEditing, &actor, None)?;

    let updated = AssignmentRepo::mark_started(&state.pool, assignment.id).await?;
    tracing::info!(user_id = auth.user_id, example_id, "Editing started");

    respond_with_snapshot(&state.pool, updated.example_id).await
}

/// POST /api/v1/projects/{p}/tracking/{e}/submit
///
/// Submit the caller's work for review. The editing lock is released as part
/// of a successful submit.
pub async fn submit(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, example_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let role = require_member(&state.pool, project_id, &auth).await?;
    ensure_example_exists(&state.pool, project_id, example_id).await?;

    let assignment = require_active_assignment(&state.pool, example_id).await?;
    let actor = actor_context(&state.pool, role, &assignment, &auth, example_id).await?;
    let current = current_status(&assignment)?;
    next_status(current, WorkflowEvent::Submit, &actor, None)?;

    let updated = AssignmentRepo::mark_submitted(&state.pool, assignment.id).await?;
    LockRepo::release(&state.pool, example_id, auth.user_id).await?;

    tracing::info!(user_id = auth.user_id, example_id, "Example submitted for review");
    respond_with_snapshot(&state.pool, updated.example_id).await
}

/// POST /api/v1/projects/{p}/tracking/{e}/approve
///
/// Approve a submission. Approver role required; notes optional.
pub async fn approve(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, example_id)): Path<(DbId, DbId)>,
    Json(input): Json<ApproveRequest>,
) -> AppResult<impl IntoResponse> {
    let role = require_reviewer(&state.pool, project_id, &auth).await?;
    ensure_example_exists(&state.pool, project_id, example_id).await?;

    let assignment = require_active_assignment(&state.pool, example_id).await?;
    let actor = actor_context(&state.pool, role, &assignment, &auth, example_id).await?;
    let current = current_status(&assignment)?;
    let target = next_status(current, WorkflowEvent::Approve, &actor, None)?;

    let notes = input
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());
    let updated =
        AssignmentRepo::record_review(&state.pool, assignment.id, target, auth.user_id, notes)
            .await?;

    tracing::info!(
        user_id = auth.user_id,
        example_id,
        annotator = updated.assigned_to,
        "Example approved"
    );
    respond_with_snapshot(&state.pool, updated.example_id).await
}

/// POST /api/v1/projects/{p}/tracking/{e}/reject
///
/// Reject a submission. Approver role required; notes mandatory so the
/// annotator knows what to fix.
pub async fn reject(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, example_id)): Path<(DbId, DbId)>,
    Json(input): Json<RejectRequest>,
) -> AppResult<impl IntoResponse> {
    let role = require_reviewer(&state.pool, project_id, &auth).await?;
    ensure_example_exists(&state.pool, project_id, example_id).await?;

    let assignment = require_active_assignment(&state.pool, example_id).await?;
    let actor = actor_context(&state.pool, role, &assignment, &auth, example_id).await?;
    let current = current_status(&assignment)?;
    let target = next_status(
        current,
        WorkflowEvent::Reject,
        &actor,
        input.notes.as_deref(),
    )?;

    let notes = validate_review_notes(input.notes.as_deref().unwrap_or(""))?;
    let updated = AssignmentRepo::record_review(
        &state.pool,
        assignment.id,
        target,
        auth.user_id,
        Some(notes),
    )
    .await?;

    tracing::info!(
        user_id = auth.user_id,
        example_id,
        annotator = updated.assigned_to,
        "Example rejected"
    );
    respond_with_snapshot(&state.pool, updated.example_id).await
}

/// POST /api/v1/projects/{p}/tracking/{e}/reassign
///
/// Put a rejected example back into the pool. Manager role required. The
/// old record is superseded, never deleted.
pub async fn reassign(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((project_id, example_id)): Path<(DbId, DbId)>,
    Json(input): Json<ReassignRequest>,
) -> AppResult<impl IntoResponse> {
    let role = require_manager(&state.pool, project_id, &auth).await?;
    ensure_example_exists(&state.pool, project_id, example_id).await?;

    let assignment = require_active_assignment(&state.pool, example_id).await?;
    let actor = actor_context(&state.pool, role, &assignment, &auth, example_id).await?;
    let current = current_status(&assignment)?;
    next_status(current, WorkflowEvent::Reassign, &actor, None)?;

    let assigned_to = input.assigned_to.unwrap_or(assignment.assigned_to);
    let updated =
        AssignmentRepo::reassign(&state.pool, &assignment, assigned_to, auth.user_id).await?;

    tracing::info!(
        user_id = auth.user_id,
        example_id,
        assigned_to,
        "Example reassigned"
    );
    respond_with_snapshot(&state.pool, updated.example_id).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// 404 unless the example exists in this project.
pub async fn ensure_example_exists(
    pool: &DbPool,
    project_id: DbId,
    example_id: DbId,
) -> AppResult<()> {
    ExampleRepo::find_in_project(pool, project_id, example_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Example",
            id: example_id,
        }))?;
    Ok(())
}

async fn require_active_assignment(pool: &DbPool, example_id: DbId) -> AppResult<Assignment> {
    AssignmentRepo::find_active_for_example(pool, example_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Example has no active assignment".into(),
            ))
        })
}

fn current_status(assignment: &Assignment) -> AppResult<TrackingStatus> {
    TrackingStatus::parse(&assignment.status).ok_or_else(|| {
        AppError::InternalError(format!(
            "Assignment {} carries unknown status \"{}\"",
            assignment.id, assignment.status
        ))
    })
}

async fn actor_context(
    pool: &DbPool,
    role: pecha_core::roles::Role,
    assignment: &Assignment,
    auth: &AuthUser,
    example_id: DbId,
) -> AppResult<ActorContext> {
    let lock = LockRepo::get_active(pool, example_id).await?;
    let holds_lock = lock
        .map(|l| {
            let state = ActiveLock {
                locked_by: l.locked_by,
                expires_at: l.expires_at,
            };
            state.locked_by == auth.user_id && state.is_valid_at(chrono::Utc::now())
        })
        .unwrap_or(false);

    Ok(ActorContext {
        role,
        is_assignee: assignment.assigned_to == auth.user_id,
        holds_lock,
    })
}

/// Build the 409 for a lock held by someone else, naming the holder.
async fn lock_conflict(pool: &DbPool, example_id: DbId) -> Result<AppError, AppError> {
    match LockRepo::get_active_with_holder(pool, example_id).await? {
        Some(holder) => Ok(AppError::LockConflict {
            locked_by: holder.locked_by_username,
        }),
        // The lock was released between the conflict and this query.
        None => Ok(AppError::Core(CoreError::Conflict(
            "Lock state changed, please retry".into(),
        ))),
    }
}

/// Load the derived tracking view for an example.
pub async fn load_snapshot(pool: &DbPool, example_id: DbId) -> AppResult<TrackingSnapshot> {
    let assignment = AssignmentRepo::find_active_with_names(pool, example_id).await?;
    let lock = LockRepo::get_active_with_holder(pool, example_id).await?;

    let snapshot = match assignment {
        Some(a) => TrackingSnapshot {
            example_id,
            status_display: style_for_code(&a.status).label.to_string(),
            status: a.status,
            annotated_by: Some(a.assigned_to),
            reviewed_by: a.reviewed_by,
            is_locked: lock.is_some(),
            locked_by: lock.map(|l| l.locked_by_username),
        },
        None => {
            let mut snapshot = TrackingSnapshot::pending(example_id);
            if let Some(l) = lock {
                snapshot.is_locked = true;
                snapshot.locked_by = Some(l.locked_by_username);
            }
            snapshot
        }
    };
    Ok(snapshot)
}

async fn respond_with_snapshot(
    pool: &DbPool,
    example_id: DbId,
) -> AppResult<Json<DataResponse<TrackingSnapshot>>> {
    let snapshot = load_snapshot(pool, example_id).await?;
    Ok(Json(DataResponse { data: snapshot }))
}
