//! Handlers for assignment listing and creation.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use pecha_core::error::CoreError;
use pecha_core::types::DbId;
use pecha_db::models::assignment::{CreateAssignmentRequest, PageQuery};
use pecha_db::repositories::{AssignmentRepo, MemberRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::tracking::ensure_example_exists;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{require_manager, require_member};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/projects/{p}/assignments
///
/// Active assignments of the project, paged via `offset`/`limit`. A project
/// with no assignments returns an empty list, not an error.
pub async fn list_assignments(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Query(page): Query<PageQuery>,
) -> AppResult<impl IntoResponse> {
    require_member(&state.pool, project_id, &auth).await?;

    let assignments =
        AssignmentRepo::list_for_project(&state.pool, project_id, page.offset, page.limit).await?;
    Ok(Json(DataResponse { data: assignments }))
}

/// POST /api/v1/projects/{p}/assignments
///
/// Assign an example to an annotator. Manager role required; the assignee
/// must be a member of the project. Supersedes any previous assignment.
pub async fn create_assignment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreateAssignmentRequest>,
) -> AppResult<impl IntoResponse> {
    require_manager(&state.pool, project_id, &auth).await?;
    ensure_example_exists(&state.pool, project_id, input.example_id).await?;

    MemberRepo::find_role(&state.pool, project_id, input.assigned_to)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation(
                "Assignee is not a member of this project".into(),
            ))
        })?;

    let assignment = AssignmentRepo::create(
        &state.pool,
        project_id,
        input.example_id,
        input.assigned_to,
        auth.user_id,
    )
    .await?;

    tracing::info!(
        user_id = auth.user_id,
        example_id = input.example_id,
        assigned_to = input.assigned_to,
        "Example assigned"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: assignment })))
}
