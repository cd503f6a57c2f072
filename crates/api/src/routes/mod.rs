pub mod auth;
pub mod health;
pub mod project;
pub mod tracking;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                                   register (public)
/// /auth/login                                      login (public)
/// /auth/refresh                                    refresh (public)
/// /auth/logout                                     logout (requires auth)
///
/// /projects                                        list, create
/// /projects/{p}                                    get
/// /projects/{p}/members                            list, add (admin)
/// /projects/{p}/examples                           create (manager)
/// /projects/{p}/assignments                        list, create (manager)
///
/// /projects/{p}/tracking/summary                   completion summary
/// /projects/{p}/tracking/annotators                annotator stats (manager)
/// /projects/{p}/tracking/approvers                 approver stats (manager)
/// /projects/{p}/tracking/export                    CSV export (manager)
/// /projects/{p}/tracking/{e}/status                tracking snapshot
/// /projects/{p}/tracking/{e}/lock                  acquire editing lock
/// /projects/{p}/tracking/{e}/unlock                release editing lock
/// /projects/{p}/tracking/{e}/start                 start editing
/// /projects/{p}/tracking/{e}/submit                submit for review
/// /projects/{p}/tracking/{e}/approve               approve (approver)
/// /projects/{p}/tracking/{e}/reject                reject (approver)
/// /projects/{p}/tracking/{e}/reassign              reassign (manager)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/projects", project::router())
        .nest("/projects/{project_id}/tracking", tracking::router())
}
