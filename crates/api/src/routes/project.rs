//! Route definitions for projects, members, examples, and assignments.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{assignment, project};
use crate::state::AppState;

/// Project routes mounted at `/projects`.
///
/// ```text
/// GET  /                          -> list_projects
/// POST /                          -> create_project
/// GET  /{p}                       -> get_project
/// GET  /{p}/members               -> list_members
/// POST /{p}/members               -> add_member (admin)
/// POST /{p}/examples              -> create_example (manager)
/// GET  /{p}/assignments           -> list_assignments
/// POST /{p}/assignments           -> create_assignment (manager)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list_projects).post(project::create_project))
        .route("/{project_id}", get(project::get_project))
        .route(
            "/{project_id}/members",
            get(project::list_members).post(project::add_member),
        )
        .route("/{project_id}/examples", post(project::create_example))
        .route(
            "/{project_id}/assignments",
            get(assignment::list_assignments).post(assignment::create_assignment),
        )
}
