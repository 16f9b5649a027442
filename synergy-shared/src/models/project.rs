//! Project model
//!
//! # Wire Shape
//!
//! ```text
//! project_c
//!   Id             integer (store-assigned)
//!   name_c         text
//!   description_c  multiline text
//!   status_c       picklist (Planning | Active | On Hold | Completed)
//!   start_date_c   date (YYYY-MM-DD, passed through as text)
//!   end_date_c     date
//!   progress_c     number 0-100
//!   members_c      comma-joined user ids, e.g. "1,4,7"
//!   created_by_c   lookup -> user_c
//!   created_at_c   datetime
//!   updated_at_c   datetime
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::{lookup, Entity, RecordId};

/// Project status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectStatus {
    #[default]
    #[serde(rename = "Planning")]
    Planning,

    #[serde(rename = "Active")]
    Active,

    #[serde(rename = "On Hold")]
    OnHold,

    #[serde(rename = "Completed")]
    Completed,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        ProjectStatus::Planning,
        ProjectStatus::Active,
        ProjectStatus::OnHold,
        ProjectStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planning => "Planning",
            ProjectStatus::Active => "Active",
            ProjectStatus::OnHold => "On Hold",
            ProjectStatus::Completed => "Completed",
        }
    }

    /// Parses a label; `None` when it is not a project status
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == label.trim())
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(rename = "Id")]
    pub id: RecordId,

    #[serde(rename = "name_c", default)]
    pub name: String,

    #[serde(rename = "description_c", default)]
    pub description: Option<String>,

    #[serde(rename = "status_c", default)]
    pub status: ProjectStatus,

    #[serde(rename = "start_date_c", default)]
    pub start_date: Option<String>,

    #[serde(rename = "end_date_c", default)]
    pub end_date: Option<String>,

    /// Completion percentage, 0-100
    #[serde(rename = "progress_c", default)]
    pub progress: i32,

    /// Member user ids, in the order they were added
    #[serde(rename = "members_c", default, with = "members")]
    pub members: Vec<RecordId>,

    #[serde(
        rename = "created_by_c",
        default,
        with = "lookup",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_by: Option<RecordId>,

    #[serde(rename = "created_at_c", default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(rename = "updated_at_c", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Project {
    const COLLECTION: &'static str = "project_c";
    const FIELDS: &'static [&'static str] = &[
        "Id",
        "name_c",
        "description_c",
        "status_c",
        "start_date_c",
        "end_date_c",
        "progress_c",
        "members_c",
        "created_by_c",
        "created_at_c",
        "updated_at_c",
    ];

    fn id(&self) -> RecordId {
        self.id
    }
}

impl Project {
    /// Whether the user is listed among the project members
    pub fn has_member(&self, user_id: RecordId) -> bool {
        self.members.contains(&user_id)
    }
}

/// Input for creating a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CreateProject {
    #[serde(rename = "name_c")]
    #[validate(length(min = 1, message = "Project name is required"))]
    pub name: String,

    #[serde(rename = "description_c", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "status_c")]
    pub status: ProjectStatus,

    #[serde(rename = "start_date_c", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    #[serde(rename = "end_date_c", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    /// New projects always start at 0
    #[serde(rename = "progress_c")]
    #[validate(range(min = 0, max = 100, message = "Progress must be 0-100"))]
    pub progress: i32,

    #[serde(rename = "members_c", with = "members", default)]
    pub members: Vec<RecordId>,

    #[serde(
        rename = "created_by_c",
        with = "lookup",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub created_by: Option<RecordId>,

    #[serde(rename = "created_at_c")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updated_at_c")]
    pub updated_at: DateTime<Utc>,
}

impl CreateProject {
    /// A planning-stage project with no members, stamped now
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        CreateProject {
            name: name.into(),
            description: None,
            status: ProjectStatus::Planning,
            start_date: None,
            end_date: None,
            progress: 0,
            members: Vec::new(),
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Field replacement for an existing project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpdateProject {
    #[serde(rename = "Id")]
    pub id: RecordId,

    #[serde(rename = "name_c", skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Project name cannot be empty"))]
    pub name: Option<String>,

    #[serde(rename = "description_c", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "status_c", skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,

    #[serde(rename = "start_date_c", skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    #[serde(rename = "end_date_c", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,

    #[serde(rename = "progress_c", skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0, max = 100, message = "Progress must be 0-100"))]
    pub progress: Option<i32>,

    #[serde(
        rename = "members_c",
        with = "optional_members",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub members: Option<Vec<RecordId>>,

    /// Refreshed by the service on every update
    #[serde(rename = "updated_at_c", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UpdateProject {
    pub fn for_project(id: RecordId) -> Self {
        UpdateProject {
            id,
            ..Default::default()
        }
    }
}

/// `members_c` codec: a comma-joined id list on the wire
///
/// Decoding also accepts an array of ids or of lookup objects, which some
/// store endpoints return for multi-lookup fields. Stored entries that are
/// not ids are logged and skipped, so one bad value never hides a project.
pub mod members {
    use super::super::lookup::record_id_from_value;
    use super::RecordId;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value as JsonValue;
    use std::fmt::Display;

    /// Joins ids with commas (`[1, 4, 7]` -> `"1,4,7"`)
    pub fn join(ids: &[RecordId]) -> String {
        ids.iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Splits a comma-joined list, skipping blanks
    ///
    /// Returns the first entry that is not an integer as the error.
    pub fn split(raw: &str) -> Result<Vec<RecordId>, String> {
        raw.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<RecordId>().map_err(|_| part.to_string()))
            .collect()
    }

    pub fn serialize<S>(ids: &[RecordId], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&join(ids))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<RecordId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<JsonValue>::deserialize(deserializer)?;
        Ok(from_value(value.as_ref()))
    }

    /// Member ids of a stored value, without the entries that are not ids
    pub(crate) fn from_value(value: Option<&JsonValue>) -> Vec<RecordId> {
        match value {
            None | Some(JsonValue::Null) => Vec::new(),
            Some(JsonValue::String(raw)) => raw
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .filter_map(|part| keep(part.parse().ok(), part))
                .collect(),
            Some(JsonValue::Array(items)) => items
                .iter()
                .filter_map(|item| keep(record_id_from_value(item), item))
                .collect(),
            Some(JsonValue::Number(n)) => keep(n.as_i64(), n).into_iter().collect(),
            Some(other) => {
                tracing::warn!(value = %other, "Ignoring unsupported members value");
                Vec::new()
            }
        }
    }

    fn keep(id: Option<RecordId>, entry: impl Display) -> Option<RecordId> {
        if id.is_none() {
            tracing::warn!(entry = %entry, "Skipping invalid member id");
        }
        id
    }
}

mod optional_members {
    use super::RecordId;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value as JsonValue;

    pub fn serialize<S>(ids: &Option<Vec<RecordId>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match ids {
            Some(ids) => super::members::serialize(ids, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Vec<RecordId>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<JsonValue>::deserialize(deserializer)?;
        Ok(match value {
            None | Some(JsonValue::Null) => None,
            Some(v) => Some(super::members::from_value(Some(&v))),
        })
    }
}
