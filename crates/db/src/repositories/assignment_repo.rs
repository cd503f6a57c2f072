//! Repository for the `assignments` table.
//!
//! The single-active-assignment-per-example invariant is enforced by a
//! partial unique index; superseding (never deleting) preserves the full
//! review history of every example.

use pecha_core::stats::AssignmentRecord;
use pecha_core::status::TrackingStatus;
use pecha_core::types::DbId;
use sqlx::PgPool;

use crate::models::assignment::{Assignment, AssignmentRecordRow, AssignmentWithNames};

/// Column list for `assignments` queries.
const ASSIGNMENT_COLUMNS: &str = "id, project_id, example_id, assigned_to, assigned_by, status, \
                                  started_at, submitted_at, reviewed_by, reviewed_at, \
                                  review_notes, is_active, created_at, updated_at";

/// Default page size for assignment listings.
const DEFAULT_PAGE_LIMIT: i64 = 100;

pub struct AssignmentRepo;

impl AssignmentRepo {
    /// Assign an example to an annotator.
    ///
    /// Any previously active assignment is superseded (marked `reassigned`,
    /// deactivated) in the same transaction before the fresh `assigned` row
    /// is inserted.
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        example_id: DbId,
        assigned_to: DbId,
        assigned_by: DbId,
    ) -> Result<Assignment, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE assignments SET is_active = false, status = $2, updated_at = NOW() \
             WHERE example_id = $1 AND is_active = true",
        )
        .bind(example_id)
        .bind(TrackingStatus::Reassigned.as_str())
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO assignments (project_id, example_id, assigned_to, assigned_by, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ASSIGNMENT_COLUMNS}"
        );
        let assignment = sqlx::query_as::<_, Assignment>(&query)
            .bind(project_id)
            .bind(example_id)
            .bind(assigned_to)
            .bind(assigned_by)
            .bind(TrackingStatus::Assigned.as_str())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(assignment)
    }

    /// The active assignment for an example, if any.
    pub async fn find_active_for_example(
        pool: &PgPool,
        example_id: DbId,
    ) -> Result<Option<Assignment>, sqlx::Error> {
        let query = format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM assignments \
             WHERE example_id = $1 AND is_active = true"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(example_id)
            .fetch_optional(pool)
            .await
    }

    /// Move an active assignment to `in_progress`, stamping `started_at`.
    pub async fn mark_started(pool: &PgPool, id: DbId) -> Result<Assignment, sqlx::Error> {
        let query = format!(
            "UPDATE assignments SET status = $2, started_at = NOW(), updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {ASSIGNMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(id)
            .bind(TrackingStatus::InProgress.as_str())
            .fetch_one(pool)
            .await
    }

    /// Move an active assignment to `submitted`, stamping `submitted_at`.
    pub async fn mark_submitted(pool: &PgPool, id: DbId) -> Result<Assignment, sqlx::Error> {
        let query = format!(
            "UPDATE assignments SET status = $2, submitted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {ASSIGNMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(id)
            .bind(TrackingStatus::Submitted.as_str())
            .fetch_one(pool)
            .await
    }

    /// Record a review decision (approved or rejected) with its notes.
    pub async fn record_review(
        pool: &PgPool,
        id: DbId,
        status: TrackingStatus,
        reviewer_id: DbId,
        notes: Option<&str>,
    ) -> Result<Assignment, sqlx::Error> {
        let query = format!(
            "UPDATE assignments SET status = $2, reviewed_by = $3, reviewed_at = NOW(), \
             review_notes = $4, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {ASSIGNMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Assignment>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(reviewer_id)
            .bind(notes)
            .fetch_one(pool)
            .await
    }

    /// Supersede a rejected assignment with a fresh `assigned` one.
    ///
    /// The old row keeps its review history (status `reassigned`); the new
    /// row starts clean with no review fields.
    pub async fn reassign(
        pool: &PgPool,
        old: &Assignment,
        assigned_to: DbId,
        assigned_by: DbId,
    ) -> Result<Assignment, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE assignments SET is_active = false, status = $2, updated_at = NOW() \
             WHERE id = $1",
        )
        .bind(old.id)
        .bind(TrackingStatus::Reassigned.as_str())
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO assignments (project_id, example_id, assigned_to, assigned_by, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ASSIGNMENT_COLUMNS}"
        );
        let assignment = sqlx::query_as::<_, Assignment>(&query)
            .bind(old.project_id)
            .bind(old.example_id)
            .bind(assigned_to)
            .bind(assigned_by)
            .bind(TrackingStatus::Assigned.as_str())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(assignment)
    }

    /// The active assignment for an example, joined with usernames.
    pub async fn find_active_with_names(
        pool: &PgPool,
        example_id: DbId,
    ) -> Result<Option<AssignmentWithNames>, sqlx::Error> {
        sqlx::query_as::<_, AssignmentWithNames>(
            "SELECT a.id, a.example_id, u.username AS assigned_to, a.status, \
                    a.started_at, a.submitted_at, r.username AS reviewed_by, \
                    a.reviewed_at, a.review_notes \
             FROM assignments a \
             JOIN users u ON u.id = a.assigned_to \
             LEFT JOIN users r ON r.id = a.reviewed_by \
             WHERE a.example_id = $1 AND a.is_active = true",
        )
        .bind(example_id)
        .fetch_optional(pool)
        .await
    }

    /// Active assignments of a project with usernames, paged by offset/limit
    /// and ordered by example id. An empty project yields an empty list.
    pub async fn list_for_project(
        pool: &PgPool,
        project_id: DbId,
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<AssignmentWithNames>, sqlx::Error> {
        sqlx::query_as::<_, AssignmentWithNames>(
            "SELECT a.id, a.example_id, u.username AS assigned_to, a.status, \
                    a.started_at, a.submitted_at, r.username AS reviewed_by, \
                    a.reviewed_at, a.review_notes \
             FROM assignments a \
             JOIN users u ON u.id = a.assigned_to \
             LEFT JOIN users r ON r.id = a.reviewed_by \
             WHERE a.project_id = $1 AND a.is_active = true \
             ORDER BY a.example_id \
             OFFSET $2 LIMIT $3",
        )
        .bind(project_id)
        .bind(offset.unwrap_or(0).max(0))
        .bind(limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, 1000))
        .fetch_all(pool)
        .await
    }

    /// Active assignments as aggregation records for `pecha_core::stats`.
    ///
    /// Rows with a status code outside the vocabulary are skipped with a
    /// warning rather than failing the whole aggregation.
    pub async fn list_records(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<AssignmentRecord>, sqlx::Error> {
        let rows = sqlx::query_as::<_, AssignmentRecordRow>(
            "SELECT a.example_id, u.username AS assigned_to, a.status, \
                    r.username AS reviewed_by \
             FROM assignments a \
             LEFT JOIN users u ON u.id = a.assigned_to \
             LEFT JOIN users r ON r.id = a.reviewed_by \
             WHERE a.project_id = $1 AND a.is_active = true \
             ORDER BY a.example_id",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match TrackingStatus::parse(&row.status) {
                Some(status) => Some(AssignmentRecord {
                    example_id: row.example_id,
                    assigned_to: row.assigned_to,
                    status,
                    reviewed_by: row.reviewed_by,
                }),
                None => {
                    tracing::warn!(
                        example_id = row.example_id,
                        status = %row.status,
                        "Skipping assignment with unknown status code"
                    );
                    None
                }
            })
            .collect())
    }

    /// Every assignment of a project (history included) for the CSV export,
    /// ordered by example id then recency.
    pub async fn export_rows(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<AssignmentWithNames>, sqlx::Error> {
        sqlx::query_as::<_, AssignmentWithNames>(
            "SELECT a.id, a.example_id, u.username AS assigned_to, a.status, \
                    a.started_at, a.submitted_at, r.username AS reviewed_by, \
                    a.reviewed_at, a.review_notes \
             FROM assignments a \
             JOIN users u ON u.id = a.assigned_to \
             LEFT JOIN users r ON r.id = a.reviewed_by \
             WHERE a.project_id = $1 \
             ORDER BY a.example_id, a.created_at",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }
}
