//! The review workflow state machine.
//!
//! One pure function, [`next_status`], owns every status transition and its
//! guards. The API calls it before touching the database; the client calls
//! the same guards (notes validation) before touching the network. A failed
//! guard never mutates anything -- the caller simply receives the error.

use crate::error::CoreError;
use crate::roles::Role;
use crate::status::TrackingStatus;

/// Events that drive the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowEvent {
    /// Annotator opens the example for editing.
    StartEditing,
    /// Annotator submits their work for review.
    Submit,
    /// Reviewer accepts the submission. Notes optional.
    Approve,
    /// Reviewer sends the submission back. Notes required.
    Reject,
    /// Manager puts a rejected example back into the assignable pool.
    Reassign,
}

impl WorkflowEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowEvent::StartEditing => "start_editing",
            WorkflowEvent::Submit => "submit",
            WorkflowEvent::Approve => "approve",
            WorkflowEvent::Reject => "reject",
            WorkflowEvent::Reassign => "reassign",
        }
    }
}

/// Who is attempting a transition, and what they hold.
///
/// Built by the API from the authenticated user, their membership role, the
/// active assignment, and the lock table. The client builds a best-effort
/// local version from its own session state.
#[derive(Debug, Clone, Copy)]
pub struct ActorContext {
    pub role: Role,
    /// Caller is the annotator on the active assignment.
    pub is_assignee: bool,
    /// Caller holds a valid lock on the example.
    pub holds_lock: bool,
}

/// Validate review notes for a rejection: required, non-empty after trimming.
///
/// Returns the trimmed notes on success so callers store a canonical form.
pub fn validate_review_notes(notes: &str) -> Result<&str, CoreError> {
    let trimmed = notes.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Rejection notes are required and cannot be empty".into(),
        ));
    }
    Ok(trimmed)
}

/// Compute the status a successful transition lands on.
///
/// Guard failures:
///
/// - wrong source status -> [`CoreError::Conflict`] naming the current status
/// - missing role capability -> [`CoreError::Forbidden`]
/// - missing lock on `StartEditing` -> [`CoreError::Conflict`]
/// - empty rejection notes -> [`CoreError::Validation`]
pub fn next_status(
    current: TrackingStatus,
    event: WorkflowEvent,
    actor: &ActorContext,
    notes: Option<&str>,
) -> Result<TrackingStatus, CoreError> {
    match event {
        WorkflowEvent::StartEditing => {
            require_source(
                current,
                &[TrackingStatus::Pending, TrackingStatus::Assigned],
                event,
            )?;
            if !actor.holds_lock {
                return Err(CoreError::Conflict(
                    "Acquire the lock before starting to edit".into(),
                ));
            }
            Ok(TrackingStatus::InProgress)
        }
        WorkflowEvent::Submit => {
            require_source(current, &[TrackingStatus::InProgress], event)?;
            if !actor.is_assignee {
                return Err(CoreError::Forbidden(
                    "Only the assigned annotator can submit this example".into(),
                ));
            }
            Ok(TrackingStatus::Submitted)
        }
        WorkflowEvent::Approve => {
            require_source(current, &[TrackingStatus::Submitted], event)?;
            if !actor.role.can_review() {
                return Err(CoreError::Forbidden("Approver role required".into()));
            }
            Ok(TrackingStatus::Approved)
        }
        WorkflowEvent::Reject => {
            require_source(current, &[TrackingStatus::Submitted], event)?;
            if !actor.role.can_review() {
                return Err(CoreError::Forbidden("Approver role required".into()));
            }
            validate_review_notes(notes.unwrap_or(""))?;
            Ok(TrackingStatus::Rejected)
        }
        WorkflowEvent::Reassign => {
            require_source(current, &[TrackingStatus::Rejected], event)?;
            if !actor.role.can_manage() {
                return Err(CoreError::Forbidden("Manager role required".into()));
            }
            Ok(TrackingStatus::Assigned)
        }
    }
}

fn require_source(
    current: TrackingStatus,
    allowed: &[TrackingStatus],
    event: WorkflowEvent,
) -> Result<(), CoreError> {
    if allowed.contains(&current) {
        return Ok(());
    }
    Err(CoreError::Conflict(format!(
        "Cannot {} an example with status \"{}\"",
        event.as_str(),
        current.as_str()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn annotator() -> ActorContext {
        ActorContext {
            role: Role::Annotator,
            is_assignee: true,
            holds_lock: true,
        }
    }

    fn approver() -> ActorContext {
        ActorContext {
            role: Role::Approver,
            is_assignee: false,
            holds_lock: false,
        }
    }

    fn manager() -> ActorContext {
        ActorContext {
            role: Role::ProjectManager,
            is_assignee: false,
            holds_lock: false,
        }
    }

    #[test]
    fn start_editing_requires_the_lock() {
        let mut actor = annotator();
        actor.holds_lock = false;

        let err = next_status(
            TrackingStatus::Assigned,
            WorkflowEvent::StartEditing,
            &actor,
            None,
        )
        .unwrap_err();
        assert_matches!(err, CoreError::Conflict(_));

        actor.holds_lock = true;
        let next = next_status(
            TrackingStatus::Assigned,
            WorkflowEvent::StartEditing,
            &actor,
            None,
        )
        .unwrap();
        assert_eq!(next, TrackingStatus::InProgress);
    }

    #[test]
    fn start_editing_accepts_pending_and_assigned_only() {
        let actor = annotator();
        for source in [TrackingStatus::Pending, TrackingStatus::Assigned] {
            assert!(next_status(source, WorkflowEvent::StartEditing, &actor, None).is_ok());
        }
        for source in [
            TrackingStatus::InProgress,
            TrackingStatus::Submitted,
            TrackingStatus::Approved,
            TrackingStatus::Rejected,
        ] {
            let err =
                next_status(source, WorkflowEvent::StartEditing, &actor, None).unwrap_err();
            assert_matches!(err, CoreError::Conflict(_));
        }
    }

    #[test]
    fn submit_requires_the_assignee() {
        let mut actor = annotator();
        actor.is_assignee = false;

        let err = next_status(
            TrackingStatus::InProgress,
            WorkflowEvent::Submit,
            &actor,
            None,
        )
        .unwrap_err();
        assert_matches!(err, CoreError::Forbidden(_));
    }

    #[test]
    fn approve_requires_reviewer_capability_and_leaves_notes_optional() {
        let err = next_status(
            TrackingStatus::Submitted,
            WorkflowEvent::Approve,
            &annotator(),
            None,
        )
        .unwrap_err();
        assert_matches!(err, CoreError::Forbidden(_));

        let next = next_status(
            TrackingStatus::Submitted,
            WorkflowEvent::Approve,
            &approver(),
            None,
        )
        .unwrap();
        assert_eq!(next, TrackingStatus::Approved);
    }

    #[test]
    fn reject_requires_non_empty_notes() {
        for notes in [None, Some(""), Some("   "), Some("\n\t")] {
            let err = next_status(
                TrackingStatus::Submitted,
                WorkflowEvent::Reject,
                &approver(),
                notes,
            )
            .unwrap_err();
            assert_matches!(err, CoreError::Validation(_));
        }

        let next = next_status(
            TrackingStatus::Submitted,
            WorkflowEvent::Reject,
            &approver(),
            Some("audio unclear"),
        )
        .unwrap();
        assert_eq!(next, TrackingStatus::Rejected);
    }

    #[test]
    fn reject_role_guard_fires_before_notes_validation_never_mutates() {
        // An annotator rejecting with perfectly good notes is still Forbidden.
        let err = next_status(
            TrackingStatus::Submitted,
            WorkflowEvent::Reject,
            &annotator(),
            Some("looks wrong"),
        )
        .unwrap_err();
        assert_matches!(err, CoreError::Forbidden(_));
    }

    #[test]
    fn reassign_requires_manager_and_rejected_source() {
        let err = next_status(
            TrackingStatus::Rejected,
            WorkflowEvent::Reassign,
            &approver(),
            None,
        )
        .unwrap_err();
        assert_matches!(err, CoreError::Forbidden(_));

        let err = next_status(
            TrackingStatus::Submitted,
            WorkflowEvent::Reassign,
            &manager(),
            None,
        )
        .unwrap_err();
        assert_matches!(err, CoreError::Conflict(_));

        let next = next_status(
            TrackingStatus::Rejected,
            WorkflowEvent::Reassign,
            &manager(),
            None,
        )
        .unwrap();
        assert_eq!(next, TrackingStatus::Assigned);
    }

    #[test]
    fn validate_review_notes_trims_to_canonical_form() {
        assert_eq!(validate_review_notes("  audio unclear  ").unwrap(), "audio unclear");
        assert_matches!(validate_review_notes("   "), Err(CoreError::Validation(_)));
    }

    /// Full review cycle: submit, reject with notes, reassign, back to assigned.
    #[test]
    fn rejection_cycle_returns_example_to_the_pool() {
        let status = next_status(
            TrackingStatus::InProgress,
            WorkflowEvent::Submit,
            &annotator(),
            None,
        )
        .unwrap();
        assert_eq!(status, TrackingStatus::Submitted);

        let status = next_status(
            status,
            WorkflowEvent::Reject,
            &approver(),
            Some("audio unclear"),
        )
        .unwrap();
        assert_eq!(status, TrackingStatus::Rejected);

        let status = next_status(status, WorkflowEvent::Reassign, &manager(), None).unwrap();
        assert_eq!(status, TrackingStatus::Assigned);
    }
}
