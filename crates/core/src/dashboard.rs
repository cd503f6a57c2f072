//! Read model for the completion dashboard.
//!
//! A pure projection of the aggregates into renderable rows. An empty stat
//! table becomes an explicit [`DashboardSection::NoData`] so a UI can tell
//! "nothing to show" apart from "failed to load" (a failed load never reaches
//! this module at all).

use serde::Serialize;

use crate::stats::{AnnotatorStat, ApproverStat, Summary};

/// A section of the dashboard: either rows to render, or an explicit
/// no-data marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "rows", rename_all = "snake_case")]
pub enum DashboardSection<T> {
    Rows(Vec<T>),
    NoData,
}

impl<T> DashboardSection<T> {
    fn from_rows(rows: Vec<T>) -> Self {
        if rows.is_empty() {
            DashboardSection::NoData
        } else {
            DashboardSection::Rows(rows)
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, DashboardSection::NoData)
    }
}

/// One labelled figure on the summary strip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub label: &'static str,
    pub value: String,
}

/// The whole dashboard, ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub summary: Vec<SummaryRow>,
    pub annotators: DashboardSection<AnnotatorStat>,
    pub approvers: DashboardSection<ApproverStat>,
}

/// Format a `[0, 1]` rate as a percentage with one decimal, e.g. `"66.7%"`.
fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

/// Build the dashboard view. Pure; tolerates empty inputs.
pub fn build_dashboard(
    summary: &Summary,
    annotators: Vec<AnnotatorStat>,
    approvers: Vec<ApproverStat>,
) -> DashboardView {
    let summary_rows = vec![
        SummaryRow {
            label: "Total examples",
            value: summary.total_examples.to_string(),
        },
        SummaryRow {
            label: "Assigned",
            value: summary.assigned_examples.to_string(),
        },
        SummaryRow {
            label: "Completed",
            value: summary.completed_examples.to_string(),
        },
        SummaryRow {
            label: "Approved",
            value: summary.approved_examples.to_string(),
        },
        SummaryRow {
            label: "Completion rate",
            value: percent(summary.completion_rate),
        },
        SummaryRow {
            label: "Approval rate",
            value: percent(summary.approval_rate),
        },
    ];

    DashboardView {
        summary: summary_rows,
        annotators: DashboardSection::from_rows(annotators),
        approvers: DashboardSection::from_rows(approvers),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{per_annotator_stats, summarize};

    #[test]
    fn empty_project_renders_explicit_no_data_sections() {
        let summary = summarize(&[], 0);
        let view = build_dashboard(&summary, per_annotator_stats(&[]), vec![]);

        assert!(view.annotators.is_no_data());
        assert!(view.approvers.is_no_data());

        // The summary strip still renders, with zeroed figures.
        assert_eq!(view.summary[0].value, "0");
        assert_eq!(view.summary[4].value, "0.0%");
    }

    #[test]
    fn populated_sections_keep_their_rows() {
        let summary = summarize(&[], 0);
        let annotators = vec![AnnotatorStat {
            username: "dolma".into(),
            total_assigned: 4,
            completed: 2,
            in_progress: 1,
            submitted: 1,
            approved: 1,
            completion_rate: 0.5,
        }];

        let view = build_dashboard(&summary, annotators, vec![]);
        match &view.annotators {
            DashboardSection::Rows(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!(rows[0].username, "dolma");
            }
            DashboardSection::NoData => panic!("expected rows"),
        }
        assert!(view.approvers.is_no_data());
    }

    #[test]
    fn percent_formatting_is_stable() {
        assert_eq!(percent(0.0), "0.0%");
        assert_eq!(percent(0.6667), "66.7%");
        assert_eq!(percent(1.0), "100.0%");
    }
}
