//! The closed tracking-status vocabulary and its display metadata.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tracking status of one example's active assignment.
///
/// Ordering of the variants reflects the typical progression, but transitions
/// are governed by [`crate::workflow`], not by this ordering. `Completed` is a
/// legacy alias some imported data carries; the workflow never produces it,
/// but the aggregator counts it as completed work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingStatus {
    Pending,
    Assigned,
    InProgress,
    Submitted,
    Completed,
    Approved,
    Rejected,
    Reassigned,
}

/// Display metadata for a status: what a UI should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusStyle {
    pub label: &'static str,
    pub color: &'static str,
    pub icon: &'static str,
}

/// Rendering used for any status code outside the closed vocabulary.
pub const UNKNOWN_STYLE: StatusStyle = StatusStyle {
    label: "Unknown",
    color: "grey",
    icon: "mdi-help-circle-outline",
};

impl TrackingStatus {
    /// The wire/database code for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            TrackingStatus::Pending => "pending",
            TrackingStatus::Assigned => "assigned",
            TrackingStatus::InProgress => "in_progress",
            TrackingStatus::Submitted => "submitted",
            TrackingStatus::Completed => "completed",
            TrackingStatus::Approved => "approved",
            TrackingStatus::Rejected => "rejected",
            TrackingStatus::Reassigned => "reassigned",
        }
    }

    /// Parse a status code. Returns `None` for codes outside the vocabulary;
    /// callers that only need a rendering should use [`style_for_code`],
    /// which degrades gracefully instead.
    pub fn parse(code: &str) -> Option<TrackingStatus> {
        match code {
            "pending" => Some(TrackingStatus::Pending),
            "assigned" => Some(TrackingStatus::Assigned),
            "in_progress" => Some(TrackingStatus::InProgress),
            "submitted" => Some(TrackingStatus::Submitted),
            "completed" => Some(TrackingStatus::Completed),
            "approved" => Some(TrackingStatus::Approved),
            "rejected" => Some(TrackingStatus::Rejected),
            "reassigned" => Some(TrackingStatus::Reassigned),
            _ => None,
        }
    }

    /// Human-readable label for this status.
    pub fn label(self) -> &'static str {
        self.style().label
    }

    /// Display metadata (label, color, icon) for this status.
    pub fn style(self) -> StatusStyle {
        match self {
            TrackingStatus::Pending => StatusStyle {
                label: "Pending",
                color: "grey",
                icon: "mdi-clock-outline",
            },
            TrackingStatus::Assigned => StatusStyle {
                label: "Assigned",
                color: "blue-grey",
                icon: "mdi-account-arrow-right",
            },
            TrackingStatus::InProgress => StatusStyle {
                label: "In Progress",
                color: "blue",
                icon: "mdi-pencil",
            },
            TrackingStatus::Submitted => StatusStyle {
                label: "Submitted",
                color: "orange",
                icon: "mdi-send-check",
            },
            TrackingStatus::Completed => StatusStyle {
                label: "Completed",
                color: "teal",
                icon: "mdi-check",
            },
            TrackingStatus::Approved => StatusStyle {
                label: "Approved",
                color: "green",
                icon: "mdi-check-decagram",
            },
            TrackingStatus::Rejected => StatusStyle {
                label: "Needs Revision",
                color: "red",
                icon: "mdi-close-octagon",
            },
            TrackingStatus::Reassigned => StatusStyle {
                label: "Reassigned",
                color: "purple",
                icon: "mdi-account-convert",
            },
        }
    }

    /// True for statuses the aggregator counts as completed work.
    pub fn is_completed_work(self) -> bool {
        matches!(
            self,
            TrackingStatus::Submitted | TrackingStatus::Completed | TrackingStatus::Approved
        )
    }
}

impl fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display metadata for an arbitrary status code.
///
/// Unknown codes get the generic [`UNKNOWN_STYLE`] rendering rather than an
/// error, so a UI fed a code from a newer server version still renders.
pub fn style_for_code(code: &str) -> StatusStyle {
    TrackingStatus::parse(code)
        .map(TrackingStatus::style)
        .unwrap_or(UNKNOWN_STYLE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for status in [
            TrackingStatus::Pending,
            TrackingStatus::Assigned,
            TrackingStatus::InProgress,
            TrackingStatus::Submitted,
            TrackingStatus::Completed,
            TrackingStatus::Approved,
            TrackingStatus::Rejected,
            TrackingStatus::Reassigned,
        ] {
            assert_eq!(TrackingStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn serde_codes_match_as_str() {
        let json = serde_json::to_string(&TrackingStatus::InProgress).unwrap();
        assert_eq!(json, r#""in_progress""#);

        let parsed: TrackingStatus = serde_json::from_str(r#""reassigned""#).unwrap();
        assert_eq!(parsed, TrackingStatus::Reassigned);
    }

    #[test]
    fn unknown_code_degrades_to_generic_style() {
        let style = style_for_code("archived");
        assert_eq!(style, UNKNOWN_STYLE);

        let style = style_for_code("");
        assert_eq!(style.label, "Unknown");
    }

    #[test]
    fn known_code_styles_are_distinct_from_unknown() {
        let style = style_for_code("approved");
        assert_eq!(style.label, "Approved");
        assert_eq!(style.color, "green");
    }

    #[test]
    fn completed_work_covers_submitted_and_beyond() {
        assert!(TrackingStatus::Submitted.is_completed_work());
        assert!(TrackingStatus::Completed.is_completed_work());
        assert!(TrackingStatus::Approved.is_completed_work());

        assert!(!TrackingStatus::Pending.is_completed_work());
        assert!(!TrackingStatus::InProgress.is_completed_work());
        assert!(!TrackingStatus::Rejected.is_completed_work());
    }
}
