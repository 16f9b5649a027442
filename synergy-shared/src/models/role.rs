//! User roles
//!
//! The hub has a fixed set of five roles. Roles are compared by exact
//! membership only: there is no hierarchy and no inheritance between them.
//!
//! # Roles
//!
//! - **Administrator**: everything, including user management
//! - **HR/Admin**: projects, company resources, all project access
//! - **Project Manager**: projects and all tasks
//! - **Team Member**: own tasks only
//! - **Guest/Viewer**: read-only, plus tasks they own

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role assigned to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Full control, the only role allowed to manage users
    #[serde(rename = "Administrator")]
    Administrator,

    /// Manages projects and company resources
    #[serde(rename = "HR/Admin")]
    HrAdmin,

    /// Manages projects and every task
    #[serde(rename = "Project Manager")]
    ProjectManager,

    /// Works on assigned tasks
    #[serde(rename = "Team Member")]
    TeamMember,

    /// Read-only access
    #[serde(rename = "Guest/Viewer")]
    Guest,
}

/// Error returned when parsing a role label that is not in the enumeration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    /// Every role, in display order
    pub const ALL: [Role; 5] = [
        Role::Administrator,
        Role::HrAdmin,
        Role::ProjectManager,
        Role::TeamMember,
        Role::Guest,
    ];

    /// Label used on the wire and in the UI
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "Administrator",
            Role::HrAdmin => "HR/Admin",
            Role::ProjectManager => "Project Manager",
            Role::TeamMember => "Team Member",
            Role::Guest => "Guest/Viewer",
        }
    }

    /// Parses a label, returning `None` for anything outside the enumeration
    pub fn from_label(label: &str) -> Option<Role> {
        label.parse().ok()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_labels_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_serializes_as_label() {
        let json = serde_json::to_string(&Role::HrAdmin).unwrap();
        assert_eq!(json, "\"HR/Admin\"");

        let role: Role = serde_json::from_str("\"Guest/Viewer\"").unwrap();
        assert_eq!(role, Role::Guest);
    }

    #[test]
    fn test_unknown_role() {
        assert!(Role::from_label("Superuser").is_none());
        // Exact match only
        assert!(Role::from_label("administrator").is_none());

        let err = "Owner".parse::<Role>().unwrap_err();
        assert!(err.to_string().contains("Owner"));
    }
}
