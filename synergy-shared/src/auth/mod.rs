//! Session and authorization utilities
//!
//! # Modules
//!
//! - [`session`]: explicit signed-in user state, persisted as JSON
//! - [`authorization`]: role-membership permission checks and guards
//!
//! Roles never inherit from each other: every check is an exact membership
//! test against a fixed allowed set, optionally relaxed by resource
//! ownership (task assignee/creator, project membership).

pub mod authorization;
pub mod session;

pub use authorization::AuthzError;
pub use session::{CurrentUser, Session};
