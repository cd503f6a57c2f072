//! Repository for the `examples` table.

use pecha_core::types::DbId;
use sqlx::PgPool;

use crate::models::example::{CreateExampleRequest, Example};

/// Column list for `examples` queries.
const EXAMPLE_COLUMNS: &str = "id, project_id, body, created_at";

pub struct ExampleRepo;

impl ExampleRepo {
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        input: &CreateExampleRequest,
    ) -> Result<Example, sqlx::Error> {
        let query = format!(
            "INSERT INTO examples (project_id, body) VALUES ($1, $2) \
             RETURNING {EXAMPLE_COLUMNS}"
        );
        sqlx::query_as::<_, Example>(&query)
            .bind(project_id)
            .bind(&input.body)
            .fetch_one(pool)
            .await
    }

    /// Find an example, scoped to its project so cross-project ids 404.
    pub async fn find_in_project(
        pool: &PgPool,
        project_id: DbId,
        example_id: DbId,
    ) -> Result<Option<Example>, sqlx::Error> {
        let query =
            format!("SELECT {EXAMPLE_COLUMNS} FROM examples WHERE id = $1 AND project_id = $2");
        sqlx::query_as::<_, Example>(&query)
            .bind(example_id)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn count_for_project(pool: &PgPool, project_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM examples WHERE project_id = $1")
                .bind(project_id)
                .fetch_one(pool)
                .await?;
        Ok(count)
    }
}
