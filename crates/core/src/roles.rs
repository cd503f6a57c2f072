//! Per-project membership roles.
//!
//! A role is an explicit claim stored on the project membership record and
//! resolved on every guarded operation. It is a closed enum: nothing is ever
//! inferred from usernames, group names, or any other free text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a user within one project.
///
/// Capabilities are cumulative:
///
/// - `Annotator` works on assigned examples only.
/// - `Approver` additionally reviews (approve/reject) submitted work.
/// - `ProjectManager` additionally reassigns rejected work and sees the
///   completion dashboard.
/// - `ProjectAdmin` additionally manages membership and project settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Annotator,
    Approver,
    ProjectManager,
    ProjectAdmin,
}

impl Role {
    /// The wire/database representation of this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Annotator => "annotator",
            Role::Approver => "approver",
            Role::ProjectManager => "project_manager",
            Role::ProjectAdmin => "project_admin",
        }
    }

    /// Parse a stored role string. Returns `None` for anything outside the
    /// closed set.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "annotator" => Some(Role::Annotator),
            "approver" => Some(Role::Approver),
            "project_manager" => Some(Role::ProjectManager),
            "project_admin" => Some(Role::ProjectAdmin),
            _ => None,
        }
    }

    /// Every member may annotate their own assignments.
    pub fn can_annotate(self) -> bool {
        true
    }

    /// Approvers and above may approve/reject submitted work.
    pub fn can_review(self) -> bool {
        self >= Role::Approver
    }

    /// Managers and above may reassign rejected work and read the
    /// per-annotator/per-approver statistics.
    pub fn can_manage(self) -> bool {
        self >= Role::ProjectManager
    }

    /// Admins may manage membership and unlock on behalf of others.
    pub fn is_admin(self) -> bool {
        self == Role::ProjectAdmin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
