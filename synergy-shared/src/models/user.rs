//! User model
//!
//! # Wire Shape
//!
//! ```text
//! user_c
//!   Id            integer (store-assigned)
//!   name_c        text
//!   email_c       email
//!   role_c        picklist (Administrator | HR/Admin | Project Manager |
//!                           Team Member | Guest/Viewer)
//!   department_c  text
//!   job_title_c   text
//!   avatar_url_c  url
//!   created_at_c  datetime
//!   last_login_c  datetime
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use super::{Entity, RecordId, Role};

/// A person using the hub
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned id
    #[serde(rename = "Id")]
    pub id: RecordId,

    /// Display name
    #[serde(rename = "name_c", default)]
    pub name: String,

    /// Email address
    #[serde(rename = "email_c", default)]
    pub email: String,

    /// Role; `None` when the store holds a label outside the enumeration
    #[serde(rename = "role_c", default, deserialize_with = "lenient_role")]
    pub role: Option<Role>,

    /// Department
    #[serde(rename = "department_c", default)]
    pub department: Option<String>,

    /// Job title
    #[serde(rename = "job_title_c", default)]
    pub job_title: Option<String>,

    /// Avatar image URL
    #[serde(rename = "avatar_url_c", default)]
    pub avatar_url: Option<String>,

    /// When the user was created
    #[serde(rename = "created_at_c", default)]
    pub created_at: Option<DateTime<Utc>>,

    /// Last sign-in (null if never)
    #[serde(rename = "last_login_c", default)]
    pub last_login: Option<DateTime<Utc>>,
}

fn lenient_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let label = Option::<String>::deserialize(deserializer)?;
    Ok(label.as_deref().and_then(Role::from_label))
}

impl Entity for User {
    const COLLECTION: &'static str = "user_c";
    const FIELDS: &'static [&'static str] = &[
        "Id",
        "name_c",
        "email_c",
        "role_c",
        "department_c",
        "job_title_c",
        "avatar_url_c",
        "created_at_c",
        "last_login_c",
    ];

    fn id(&self) -> RecordId {
        self.id
    }
}

impl User {
    /// Case-insensitive match on name, email or department
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self.email.to_lowercase().contains(&needle)
            || self
                .department
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

/// Input for creating a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUser {
    #[serde(rename = "name_c")]
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[serde(rename = "email_c")]
    #[validate(email(message = "Email must be a valid address"))]
    pub email: String,

    #[serde(rename = "role_c")]
    pub role: Role,

    #[serde(rename = "department_c", skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(rename = "job_title_c", skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,

    #[serde(rename = "created_at_c")]
    pub created_at: DateTime<Utc>,
}

impl CreateUser {
    /// Builds a create payload stamped with the current time
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        CreateUser {
            name: name.into(),
            email: email.into(),
            role,
            department: None,
            job_title: None,
            created_at: Utc::now(),
        }
    }
}

/// Field replacement for an existing user
///
/// Only the fields that are `Some` are sent to the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateUser {
    #[serde(rename = "Id")]
    pub id: RecordId,

    #[serde(rename = "name_c", skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,

    #[serde(rename = "email_c", skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,

    #[serde(rename = "role_c", skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    #[serde(rename = "department_c", skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(rename = "job_title_c", skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
}

impl UpdateUser {
    /// Empty patch for the given user
    pub fn for_user(id: RecordId) -> Self {
        UpdateUser {
            id,
            ..Default::default()
        }
    }
}
