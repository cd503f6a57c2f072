//! Handlers for the `/projects` resource: the CRUD subset the tracker needs.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use pecha_core::error::CoreError;
use pecha_core::roles::Role;
use pecha_core::types::DbId;
use pecha_db::models::example::CreateExampleRequest;
use pecha_db::models::member::AddMemberRequest;
use pecha_db::models::project::CreateProjectRequest;
use pecha_db::repositories::{ExampleRepo, MemberRepo, ProjectRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{require_admin, require_manager, require_member};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/projects
///
/// Projects the caller is a member of.
pub async fn list_projects(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let projects = ProjectRepo::list_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// POST /api/v1/projects
///
/// Create a project. The creator becomes its first project admin.
pub async fn create_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateProjectRequest>,
) -> AppResult<impl IntoResponse> {
    if input.name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Project name is required".into(),
        )));
    }

    let project = ProjectRepo::create(&state.pool, &input).await?;
    MemberRepo::add(&state.pool, project.id, auth.user_id, Role::ProjectAdmin).await?;

    tracing::info!(user_id = auth.user_id, project_id = project.id, "Project created");
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects/{p}
pub async fn get_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_member(&state.pool, project_id, &auth).await?;

    let project = ProjectRepo::find_by_id(&state.pool, project_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }))?;
    Ok(Json(DataResponse { data: project }))
}

/// GET /api/v1/projects/{p}/members
pub async fn list_members(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_member(&state.pool, project_id, &auth).await?;

    let members = MemberRepo::list_for_project(&state.pool, project_id).await?;
    Ok(Json(DataResponse { data: members }))
}

/// POST /api/v1/projects/{p}/members
///
/// Add a member with an explicit role. Admin role required. The role string
/// must be in the closed vocabulary.
pub async fn add_member(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<AddMemberRequest>,
) -> AppResult<impl IntoResponse> {
    require_admin(&state.pool, project_id, &auth).await?;

    let role = Role::parse(&input.role).ok_or_else(|| {
        AppError::Core(CoreError::Validation(format!(
            "Unknown role \"{}\"",
            input.role
        )))
    })?;

    UserRepo::find_by_id(&state.pool, input.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: input.user_id,
        }))?;

    let member = MemberRepo::add(&state.pool, project_id, input.user_id, role).await?;

    tracing::info!(
        user_id = auth.user_id,
        project_id,
        member_user_id = input.user_id,
        role = %role,
        "Member added"
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: member })))
}

/// POST /api/v1/projects/{p}/examples
///
/// Import one example. Manager role required.
pub async fn create_example(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<CreateExampleRequest>,
) -> AppResult<impl IntoResponse> {
    require_manager(&state.pool, project_id, &auth).await?;

    let example = ExampleRepo::create(&state.pool, project_id, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: example })))
}
