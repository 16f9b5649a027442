//! Session context
//!
//! The signed-in user (identity and role) is carried explicitly as a
//! [`Session`] value and passed to every permission check and service call.
//! Role switching for demos mutates this value, never shared global state.
//!
//! A session can be persisted as a small JSON file holding the current user.
//! Loading is forgiving: a missing or unreadable file yields an anonymous
//! session rather than an error.
//!
//! # Example
//!
//! ```ignore
//! use synergy_shared::auth::session::{CurrentUser, Session};
//! use synergy_shared::models::Role;
//!
//! # async fn example() -> std::io::Result<()> {
//! let mut session = Session::load(".synergy/session.json").await;
//! if session.is_anonymous() {
//!     session = Session::signed_in(CurrentUser::new(1, "Sarah", Role::Administrator));
//!     session.save(".synergy/session.json").await?;
//! }
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::models::{RecordId, Role, User};

/// The signed-in user as persisted in local state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    #[serde(rename = "Id")]
    pub id: RecordId,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    /// `None` when the persisted label is not a known role
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Option<Role>,
}

fn lenient_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let label = Option::<String>::deserialize(deserializer)?;
    Ok(label.as_deref().and_then(Role::from_label))
}

impl CurrentUser {
    pub fn new(id: RecordId, name: impl Into<String>, role: Role) -> Self {
        CurrentUser {
            id,
            name: name.into(),
            email: String::new(),
            role: Some(role),
        }
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        CurrentUser {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Explicit session state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    user: Option<CurrentUser>,
}

impl Session {
    /// A session with nobody signed in
    pub fn anonymous() -> Self {
        Session { user: None }
    }

    pub fn signed_in(user: CurrentUser) -> Self {
        Session { user: Some(user) }
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<RecordId> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().and_then(|u| u.role)
    }

    pub fn is_anonymous(&self) -> bool {
        self.user.is_none()
    }

    /// Switches the signed-in user's role (demo role switcher)
    ///
    /// Does nothing for an anonymous session.
    pub fn switch_role(&mut self, role: Role) {
        if let Some(user) = self.user.as_mut() {
            tracing::debug!(user_id = user.id, role = %role, "Switching session role");
            user.role = Some(role);
        }
    }

    pub fn sign_out(&mut self) {
        self.user = None;
    }

    /// Loads the persisted current user
    ///
    /// Never fails: an absent file, invalid JSON or a JSON `null` all give an
    /// anonymous session.
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match tokio::fs::read_to_string(path).await {
            Ok(raw) => Self::from_json(&raw),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "No persisted session");
                Session::anonymous()
            }
        }
    }

    /// Parses a persisted current user, tolerating garbage
    pub fn from_json(raw: &str) -> Self {
        match serde_json::from_str::<Option<CurrentUser>>(raw) {
            Ok(user) => Session { user },
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed persisted session");
                Session::anonymous()
            }
        }
    }

    /// Persists the current user as JSON (`null` when anonymous)
    pub async fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let raw = serde_json::to_string_pretty(&self.user)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        tokio::fs::write(path, raw).await
    }
}
