//! Repository for the `projects` table.

use pecha_core::types::DbId;
use sqlx::PgPool;

use crate::models::project::{CreateProjectRequest, Project};

/// Column list for `projects` queries.
const PROJECT_COLUMNS: &str = "id, name, description, created_at, updated_at";

pub struct ProjectRepo;

impl ProjectRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateProjectRequest,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (name, description) VALUES ($1, $2) \
             RETURNING {PROJECT_COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Projects the given user is a member of, newest first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Project>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            "SELECT p.id, p.name, p.description, p.created_at, p.updated_at \
             FROM projects p \
             JOIN members m ON m.project_id = p.id \
             WHERE m.user_id = $1 \
             ORDER BY p.created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
