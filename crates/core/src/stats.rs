//! Completion aggregation: project summary and per-user statistics.
//!
//! Everything here is a pure function over assignment records. Rates are
//! fractions in `[0, 1]`; a zero denominator yields `0.0`, never NaN or
//! infinity. Grouped output is sorted by username so results are stable
//! enough for snapshot-style assertions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::status::TrackingStatus;
use crate::types::DbId;

/// One active assignment as the aggregator sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub example_id: DbId,
    /// Username of the annotator, if the example has been assigned.
    pub assigned_to: Option<String>,
    pub status: TrackingStatus,
    /// Username of the reviewer; set only once approved or rejected (and
    /// retained across a resubmission until the next review).
    pub reviewed_by: Option<String>,
}

/// Project-wide completion summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_examples: u64,
    pub assigned_examples: u64,
    pub completed_examples: u64,
    pub approved_examples: u64,
    pub rejected_examples: u64,
    /// completed / total, in [0, 1].
    pub completion_rate: f64,
    /// approved / (approved + rejected), in [0, 1].
    pub approval_rate: f64,
}

/// Per-annotator completion statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatorStat {
    pub username: String,
    pub total_assigned: u64,
    pub completed: u64,
    pub in_progress: u64,
    pub submitted: u64,
    pub approved: u64,
    pub completion_rate: f64,
}

/// Per-approver review statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproverStat {
    pub username: String,
    /// Resubmitted work awaiting this reviewer again.
    pub pending_review: u64,
    pub approved: u64,
    pub rejected: u64,
    pub approval_rate: f64,
}

/// Division that returns `0.0` instead of NaN/infinity on a zero denominator.
fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Summarize a project's assignment records.
///
/// `total_examples` is the project's example count, which can exceed the
/// number of records (unassigned examples have no assignment row). A project
/// with zero examples summarizes to all-zero counts and rates.
pub fn summarize(records: &[AssignmentRecord], total_examples: u64) -> Summary {
    let assigned_examples = records.iter().filter(|r| r.assigned_to.is_some()).count() as u64;
    let completed_examples = records
        .iter()
        .filter(|r| r.status.is_completed_work())
        .count() as u64;
    let approved_examples = records
        .iter()
        .filter(|r| r.status == TrackingStatus::Approved)
        .count() as u64;
    let rejected_examples = records
        .iter()
        .filter(|r| r.status == TrackingStatus::Rejected)
        .count() as u64;

    Summary {
        total_examples,
        assigned_examples,
        completed_examples,
        approved_examples,
        rejected_examples,
        completion_rate: ratio(completed_examples, total_examples),
        approval_rate: ratio(approved_examples, approved_examples + rejected_examples),
    }
}

/// Group records by annotator, sorted by username.
///
/// Records with no annotator are skipped; the summed `total_assigned` over
/// the output therefore equals the count of input records with an assignee.
pub fn per_annotator_stats(records: &[AssignmentRecord]) -> Vec<AnnotatorStat> {
    let mut groups: BTreeMap<&str, Vec<&AssignmentRecord>> = BTreeMap::new();
    for record in records {
        if let Some(username) = record.assigned_to.as_deref() {
            groups.entry(username).or_default().push(record);
        }
    }

    groups
        .into_iter()
        .map(|(username, group)| {
            let total_assigned = group.len() as u64;
            let completed = group.iter().filter(|r| r.status.is_completed_work()).count() as u64;
            let in_progress = group
                .iter()
                .filter(|r| r.status == TrackingStatus::InProgress)
                .count() as u64;
            let submitted = group
                .iter()
                .filter(|r| r.status == TrackingStatus::Submitted)
                .count() as u64;
            let approved = group
                .iter()
                .filter(|r| r.status == TrackingStatus::Approved)
                .count() as u64;

            AnnotatorStat {
                username: username.to_string(),
                total_assigned,
                completed,
                in_progress,
                submitted,
                approved,
                completion_rate: ratio(completed, total_assigned),
            }
        })
        .collect()
}

/// Group records by reviewer, sorted by username.
///
/// A record counts toward `pending_review` when it has been resubmitted
/// after a review (status back to submitted with the reviewer retained).
pub fn per_approver_stats(records: &[AssignmentRecord]) -> Vec<ApproverStat> {
    let mut groups: BTreeMap<&str, Vec<&AssignmentRecord>> = BTreeMap::new();
    for record in records {
        if let Some(username) = record.reviewed_by.as_deref() {
            groups.entry(username).or_default().push(record);
        }
    }

    groups
        .into_iter()
        .map(|(username, group)| {
            let pending_review = group
                .iter()
                .filter(|r| r.status == TrackingStatus::Submitted)
                .count() as u64;
            let approved = group
                .iter()
                .filter(|r| r.status == TrackingStatus::Approved)
                .count() as u64;
            let rejected = group
                .iter()
                .filter(|r| r.status == TrackingStatus::Rejected)
                .count() as u64;

            ApproverStat {
                username: username.to_string(),
                pending_review,
                approved,
                rejected,
                approval_rate: ratio(approved, approved + rejected),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        example_id: DbId,
        assigned_to: Option<&str>,
        status: TrackingStatus,
        reviewed_by: Option<&str>,
    ) -> AssignmentRecord {
        AssignmentRecord {
            example_id,
            assigned_to: assigned_to.map(str::to_string),
            status,
            reviewed_by: reviewed_by.map(str::to_string),
        }
    }

    #[test]
    fn empty_project_summarizes_to_zero_rates_not_errors() {
        let summary = summarize(&[], 0);
        assert_eq!(summary.total_examples, 0);
        assert_eq!(summary.completion_rate, 0.0);
        assert_eq!(summary.approval_rate, 0.0);
        assert!(summary.completion_rate.is_finite());
        assert!(summary.approval_rate.is_finite());
    }

    #[test]
    fn rates_stay_within_unit_interval() {
        let records = vec![
            record(1, Some("dolma"), TrackingStatus::Approved, Some("tenzin")),
            record(2, Some("dolma"), TrackingStatus::Rejected, Some("tenzin")),
            record(3, Some("pema"), TrackingStatus::Submitted, None),
            record(4, Some("pema"), TrackingStatus::InProgress, None),
            record(5, None, TrackingStatus::Pending, None),
        ];

        let summary = summarize(&records, 10);
        assert!((0.0..=1.0).contains(&summary.completion_rate));
        assert!((0.0..=1.0).contains(&summary.approval_rate));
        assert_eq!(summary.assigned_examples, 4);
        assert_eq!(summary.completed_examples, 2);
        assert_eq!(summary.approved_examples, 1);
        assert_eq!(summary.rejected_examples, 1);
        assert_eq!(summary.completion_rate, 0.2);
        assert_eq!(summary.approval_rate, 0.5);
    }

    #[test]
    fn approval_rate_is_zero_when_nothing_reviewed() {
        let records = vec![record(1, Some("dolma"), TrackingStatus::Submitted, None)];
        let summary = summarize(&records, 1);
        assert_eq!(summary.approval_rate, 0.0);
    }

    #[test]
    fn legacy_completed_status_counts_as_completed_work() {
        let records = vec![record(1, Some("dolma"), TrackingStatus::Completed, None)];
        let summary = summarize(&records, 1);
        assert_eq!(summary.completed_examples, 1);
        assert_eq!(summary.completion_rate, 1.0);
    }

    #[test]
    fn annotator_stats_are_sorted_and_conserve_totals() {
        let records = vec![
            record(1, Some("tenzin"), TrackingStatus::Submitted, None),
            record(2, Some("dolma"), TrackingStatus::Approved, Some("tenzin")),
            record(3, Some("dolma"), TrackingStatus::InProgress, None),
            record(4, Some("pema"), TrackingStatus::Assigned, None),
            record(5, None, TrackingStatus::Pending, None),
        ];

        let stats = per_annotator_stats(&records);
        let usernames: Vec<&str> = stats.iter().map(|s| s.username.as_str()).collect();
        assert_eq!(usernames, vec!["dolma", "pema", "tenzin"]);

        let summed: u64 = stats.iter().map(|s| s.total_assigned).sum();
        let assigned_inputs = records.iter().filter(|r| r.assigned_to.is_some()).count() as u64;
        assert_eq!(summed, assigned_inputs);

        let dolma = &stats[0];
        assert_eq!(dolma.total_assigned, 2);
        assert_eq!(dolma.completed, 1);
        assert_eq!(dolma.in_progress, 1);
        assert_eq!(dolma.approved, 1);
        assert_eq!(dolma.completion_rate, 0.5);
    }

    #[test]
    fn approver_stats_group_by_reviewer() {
        let records = vec![
            record(1, Some("dolma"), TrackingStatus::Approved, Some("tenzin")),
            record(2, Some("dolma"), TrackingStatus::Rejected, Some("tenzin")),
            record(3, Some("pema"), TrackingStatus::Approved, Some("tenzin")),
            // Resubmitted after an earlier review: pending for karma.
            record(4, Some("pema"), TrackingStatus::Submitted, Some("karma")),
        ];

        let stats = per_approver_stats(&records);
        let usernames: Vec<&str> = stats.iter().map(|s| s.username.as_str()).collect();
        assert_eq!(usernames, vec!["karma", "tenzin"]);

        let karma = &stats[0];
        assert_eq!(karma.pending_review, 1);
        assert_eq!(karma.approval_rate, 0.0);

        let tenzin = &stats[1];
        assert_eq!(tenzin.approved, 2);
        assert_eq!(tenzin.rejected, 1);
        assert!((tenzin.approval_rate - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn stats_on_empty_input_are_empty_collections() {
        assert!(per_annotator_stats(&[]).is_empty());
        assert!(per_approver_stats(&[]).is_empty());
    }
}
