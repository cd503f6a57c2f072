//! Handlers for completion statistics: summary, per-annotator and
//! per-approver views, and the CSV export.
//!
//! All aggregation is done by the pure functions in `pecha_core::stats`;
//! these handlers only fetch records and serialize results.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use pecha_core::stats::{per_annotator_stats, per_approver_stats, summarize};
use pecha_core::status::style_for_code;
use pecha_core::types::DbId;
use pecha_db::repositories::{AssignmentRepo, ExampleRepo};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{require_manager, require_member};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/projects/{p}/tracking/summary
///
/// Project-wide completion summary. A project with zero examples returns
/// zeroed counts and rates, never an error.
pub async fn summary(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_member(&state.pool, project_id, &auth).await?;

    let total = ExampleRepo::count_for_project(&state.pool, project_id).await?;
    let records = AssignmentRepo::list_records(&state.pool, project_id).await?;
    let summary = summarize(&records, total.max(0) as u64);

    Ok(Json(DataResponse { data: summary }))
}

/// GET /api/v1/projects/{p}/tracking/annotators
///
/// Per-annotator statistics, sorted by username. Manager role required.
pub async fn annotators(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_manager(&state.pool, project_id, &auth).await?;

    let records = AssignmentRepo::list_records(&state.pool, project_id).await?;
    Ok(Json(DataResponse {
        data: per_annotator_stats(&records),
    }))
}

/// GET /api/v1/projects/{p}/tracking/approvers
///
/// Per-approver statistics, sorted by username. Manager role required.
pub async fn approvers(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_manager(&state.pool, project_id, &auth).await?;

    let records = AssignmentRepo::list_records(&state.pool, project_id).await?;
    Ok(Json(DataResponse {
        data: per_approver_stats(&records),
    }))
}

/// GET /api/v1/projects/{p}/tracking/export
///
/// Full tracking history as CSV, ordered by example id. Manager role
/// required.
pub async fn export(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_manager(&state.pool, project_id, &auth).await?;

    let rows = AssignmentRepo::export_rows(&state.pool, project_id).await?;

    let mut csv = String::from(
        "example_id,status,annotated_by,submitted_at,reviewed_by,reviewed_at,review_notes\n",
    );
    for row in rows {
        let submitted_at = row
            .submitted_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        let reviewed_at = row.reviewed_at.map(|t| t.to_rfc3339()).unwrap_or_default();
        csv.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            row.example_id,
            csv_field(style_for_code(&row.status).label),
            csv_field(&row.assigned_to),
            submitted_at,
            csv_field(row.reviewed_by.as_deref().unwrap_or("")),
            reviewed_at,
            csv_field(row.review_notes.as_deref().unwrap_or("")),
        ));
    }

    let headers = [
        (header::CONTENT_TYPE, "text/csv".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"tracking_report_{project_id}.csv\""),
        ),
    ];
    Ok((StatusCode::OK, headers, csv))
}

/// Quote a CSV field when it contains a delimiter, quote, or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::csv_field;

    #[test]
    fn plain_fields_pass_through() {
        assert_eq!(csv_field("dolma"), "dolma");
        assert_eq!(csv_field(""), "");
    }

    #[test]
    fn delimiters_and_quotes_are_escaped() {
        assert_eq!(csv_field("audio, unclear"), "\"audio, unclear\"");
        assert_eq!(csv_field("say \"om\""), "\"say \"\"om\"\"\"");
        assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
    }
}
