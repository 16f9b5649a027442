//! Permission checks
//!
//! Role-based access control for the hub. Checks are exact role
//! membership: there is no role hierarchy. A missing role (`None`) never
//! matches any allowed set.
//!
//! # Permission Model
//!
//! | Operation                 | Roles                                     | Override        |
//! |---------------------------|-------------------------------------------|-----------------|
//! | manage projects           | Administrator, HR/Admin, Project Manager  |                 |
//! | manage users              | Administrator                             |                 |
//! | upload company resources  | Administrator, HR/Admin                   |                 |
//! | manage a task             | Administrator, Project Manager            | assignee/creator|
//! | access a project          | Administrator, HR/Admin                   | project member  |
//!
//! The `can_*` predicates are pure. The `require_*` guards apply the same
//! rules to a [`Session`] and return an [`AuthzError`] for services to
//! propagate.
//!
//! # Example
//!
//! ```
//! use synergy_shared::auth::authorization::{can_manage_projects, can_manage_users};
//! use synergy_shared::models::Role;
//!
//! assert!(can_manage_projects(Some(Role::HrAdmin)));
//! assert!(!can_manage_users(Some(Role::HrAdmin)));
//! assert!(!can_manage_users(None));
//! ```

use super::session::{CurrentUser, Session};
use crate::models::{Project, RecordId, Role, Task};

/// Roles allowed to create, edit and delete projects
pub const PROJECT_MANAGER_ROLES: &[Role] =
    &[Role::Administrator, Role::HrAdmin, Role::ProjectManager];

/// Roles allowed to manage users
pub const USER_MANAGER_ROLES: &[Role] = &[Role::Administrator];

/// Roles allowed to upload company resources
pub const RESOURCE_UPLOADER_ROLES: &[Role] = &[Role::Administrator, Role::HrAdmin];

/// Roles allowed to manage every task regardless of ownership
pub const TASK_MANAGER_ROLES: &[Role] = &[Role::Administrator, Role::ProjectManager];

/// Roles allowed into every project regardless of membership
pub const PROJECT_OVERSEER_ROLES: &[Role] = &[Role::Administrator, Role::HrAdmin];

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Nobody is signed in
    #[error("Not signed in")]
    Unauthenticated,

    /// The session role is not in the allowed set
    #[error("Insufficient permissions: requires one of {required:?}, has {actual:?}")]
    InsufficientRole {
        required: Vec<Role>,
        actual: Option<Role>,
    },

    /// Task is neither assigned to nor created by the caller
    #[error("Not authorized to manage task {0}")]
    NotOwner(RecordId),

    /// Caller is not a member of the project
    #[error("Not a member of project {0}")]
    NotMember(RecordId),
}

/// Exact membership test of `role` in `allowed`
pub fn has_permission(role: Option<Role>, allowed: &[Role]) -> bool {
    role.is_some_and(|role| allowed.contains(&role))
}

pub fn can_manage_projects(role: Option<Role>) -> bool {
    has_permission(role, PROJECT_MANAGER_ROLES)
}

pub fn can_manage_users(role: Option<Role>) -> bool {
    has_permission(role, USER_MANAGER_ROLES)
}

pub fn can_upload_company_resources(role: Option<Role>) -> bool {
    has_permission(role, RESOURCE_UPLOADER_ROLES)
}

/// Whether the caller may edit, move or delete a task
///
/// True for task-manager roles, or when `user_id` is the task's assignee or
/// creator. Ownership needs both a task and a caller id; absent ids never
/// match each other.
pub fn can_manage_tasks(role: Option<Role>, task: Option<&Task>, user_id: Option<RecordId>) -> bool {
    if has_permission(role, TASK_MANAGER_ROLES) {
        return true;
    }

    match (task, user_id) {
        (Some(task), Some(user_id)) => task.is_owned_by(user_id),
        _ => false,
    }
}

/// Whether the caller may open a project
pub fn can_access_project(
    role: Option<Role>,
    project: Option<&Project>,
    user_id: Option<RecordId>,
) -> bool {
    if has_permission(role, PROJECT_OVERSEER_ROLES) {
        return true;
    }

    match (project, user_id) {
        (Some(project), Some(user_id)) => project.has_member(user_id),
        _ => false,
    }
}

/// Requires a signed-in user
pub fn require_signed_in(session: &Session) -> Result<&CurrentUser, AuthzError> {
    session.user().ok_or(AuthzError::Unauthenticated)
}

/// Requires the session role to be one of `allowed`
pub fn require_role(session: &Session, allowed: &[Role]) -> Result<(), AuthzError> {
    require_signed_in(session)?;

    if !has_permission(session.role(), allowed) {
        return Err(AuthzError::InsufficientRole {
            required: allowed.to_vec(),
            actual: session.role(),
        });
    }

    Ok(())
}

pub fn require_project_management(session: &Session) -> Result<(), AuthzError> {
    require_role(session, PROJECT_MANAGER_ROLES)
}

pub fn require_user_management(session: &Session) -> Result<(), AuthzError> {
    require_role(session, USER_MANAGER_ROLES)
}

pub fn require_resource_upload(session: &Session) -> Result<(), AuthzError> {
    require_role(session, RESOURCE_UPLOADER_ROLES)
}

/// Requires task-manager role or ownership of `task`
pub fn require_task_management(session: &Session, task: &Task) -> Result<(), AuthzError> {
    require_signed_in(session)?;

    if !can_manage_tasks(session.role(), Some(task), session.user_id()) {
        return Err(AuthzError::NotOwner(task.id));
    }

    Ok(())
}

/// Requires overseer role or membership of `project`
pub fn require_project_access(session: &Session, project: &Project) -> Result<(), AuthzError> {
    require_signed_in(session)?;

    if !can_access_project(session.role(), Some(project), session.user_id()) {
        return Err(AuthzError::NotMember(project.id));
    }

    Ok(())
}
