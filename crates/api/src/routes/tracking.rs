//! Route definitions for the tracking workflow.
//!
//! All endpoints require authentication; role requirements are enforced
//! per-handler since they depend on the project membership.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{stats, tracking};
use crate::state::AppState;

/// Tracking routes mounted at `/projects/{project_id}/tracking`.
///
/// ```text
/// GET  /summary                    -> summary
/// GET  /annotators                 -> annotators (manager)
/// GET  /approvers                  -> approvers (manager)
/// GET  /export                     -> export (manager, CSV)
/// GET  /{example_id}/status        -> get_status
/// POST /{example_id}/lock          -> acquire_lock
/// POST /{example_id}/unlock        -> release_lock
/// POST /{example_id}/start         -> start_editing
/// POST /{example_id}/submit        -> submit
/// POST /{example_id}/approve       -> approve (approver)
/// POST /{example_id}/reject        -> reject (approver)
/// POST /{example_id}/reassign      -> reassign (manager)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", get(stats::summary))
        .route("/annotators", get(stats::annotators))
        .route("/approvers", get(stats::approvers))
        .route("/export", get(stats::export))
        .route("/{example_id}/status", get(tracking::get_status))
        .route("/{example_id}/lock", post(tracking::acquire_lock))
        .route("/{example_id}/unlock", post(tracking::release_lock))
        .route("/{example_id}/start", post(tracking::start_editing))
        .route("/{example_id}/submit", post(tracking::submit))
        .route("/{example_id}/approve", post(tracking::approve))
        .route("/{example_id}/reject", post(tracking::reject))
        .route("/{example_id}/reassign", post(tracking::reassign))
}
