//! The derived per-example tracking view shared by server and client.

use serde::{Deserialize, Serialize};

use crate::status::{style_for_code, StatusStyle, TrackingStatus};
use crate::types::DbId;

/// Read view of one example's tracking state.
///
/// Computed server-side from the active assignment and lock; the client
/// treats it as authoritative and caches it until the next mutating call.
/// The status travels as its string code so a client can still render a
/// snapshot whose code it does not know (see [`style_for_code`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    pub example_id: DbId,
    pub status: String,
    pub status_display: String,
    pub annotated_by: Option<String>,
    pub reviewed_by: Option<String>,
    pub is_locked: bool,
    pub locked_by: Option<String>,
}

impl TrackingSnapshot {
    /// The view of an example with no assignment and no lock.
    pub fn pending(example_id: DbId) -> Self {
        TrackingSnapshot {
            example_id,
            status: TrackingStatus::Pending.as_str().to_string(),
            status_display: TrackingStatus::Pending.label().to_string(),
            annotated_by: None,
            reviewed_by: None,
            is_locked: false,
            locked_by: None,
        }
    }

    /// Typed status, if the code is in the closed vocabulary.
    pub fn status_enum(&self) -> Option<TrackingStatus> {
        TrackingStatus::parse(&self.status)
    }

    /// Rendering metadata for this snapshot's status, degrading gracefully
    /// for unknown codes.
    pub fn style(&self) -> StatusStyle {
        style_for_code(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::UNKNOWN_STYLE;

    #[test]
    fn pending_snapshot_has_no_actors_and_no_lock() {
        let snap = TrackingSnapshot::pending(42);
        assert_eq!(snap.example_id, 42);
        assert_eq!(snap.status, "pending");
        assert_eq!(snap.status_display, "Pending");
        assert!(snap.annotated_by.is_none());
        assert!(snap.reviewed_by.is_none());
        assert!(!snap.is_locked);
        assert!(snap.locked_by.is_none());
    }

    #[test]
    fn snapshot_with_unknown_code_still_renders() {
        let snap = TrackingSnapshot {
            status: "archived".to_string(),
            status_display: "Archived".to_string(),
            ..TrackingSnapshot::pending(1)
        };
        assert_eq!(snap.status_enum(), None);
        assert_eq!(snap.style(), UNKNOWN_STYLE);
    }
}
