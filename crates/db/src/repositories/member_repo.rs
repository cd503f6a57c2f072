//! Repository for the `members` table (per-project roles).

use pecha_core::roles::Role;
use pecha_core::types::DbId;
use sqlx::PgPool;

use crate::models::member::{Member, MemberWithUser};

/// Column list for `members` queries.
const MEMBER_COLUMNS: &str = "id, project_id, user_id, role, created_at";

pub struct MemberRepo;

impl MemberRepo {
    pub async fn add(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
        role: Role,
    ) -> Result<Member, sqlx::Error> {
        let query = format!(
            "INSERT INTO members (project_id, user_id, role) VALUES ($1, $2, $3) \
             RETURNING {MEMBER_COLUMNS}"
        );
        sqlx::query_as::<_, Member>(&query)
            .bind(project_id)
            .bind(user_id)
            .bind(role.as_str())
            .fetch_one(pool)
            .await
    }

    /// The user's role in the project, if they are a member.
    ///
    /// Rows carrying a role code outside the closed enum are treated as
    /// non-membership and logged; roles are never guessed from other data.
    pub async fn find_role(
        pool: &PgPool,
        project_id: DbId,
        user_id: DbId,
    ) -> Result<Option<Role>, sqlx::Error> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT role FROM members WHERE project_id = $1 AND user_id = $2")
                .bind(project_id)
                .bind(user_id)
                .fetch_optional(pool)
                .await?;

        Ok(row.and_then(|(code,)| {
            let role = Role::parse(&code);
            if role.is_none() {
                tracing::warn!(project_id, user_id, role = %code, "Unknown role code on membership row");
            }
            role
        }))
    }

    /// All members of a project with usernames, sorted by username.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<MemberWithUser>, sqlx::Error> {
        sqlx::query_as::<_, MemberWithUser>(
            "SELECT m.user_id, u.username, m.role \
             FROM members m \
             JOIN users u ON u.id = m.user_id \
             WHERE m.project_id = $1 \
             ORDER BY u.username",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }
}
