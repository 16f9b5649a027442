//! Activity log model
//!
//! Activities are append-only: they are created and read, never updated or
//! deleted through the hub.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lookup, Entity, RecordId};

/// One activity log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "Id")]
    pub id: RecordId,

    /// Free-form type tag, e.g. `task_completed`
    #[serde(rename = "type_c", default)]
    pub kind: String,

    #[serde(rename = "description_c", default)]
    pub description: String,

    /// Actor
    #[serde(rename = "user_id_c", default, with = "lookup")]
    pub user_id: Option<RecordId>,

    #[serde(rename = "project_id_c", default, with = "lookup")]
    pub project_id: Option<RecordId>,

    #[serde(rename = "task_id_c", default, with = "lookup")]
    pub task_id: Option<RecordId>,

    #[serde(rename = "created_at_c", default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for Activity {
    const COLLECTION: &'static str = "activity_c";
    const FIELDS: &'static [&'static str] = &[
        "Id",
        "type_c",
        "description_c",
        "user_id_c",
        "project_id_c",
        "task_id_c",
        "created_at_c",
    ];

    fn id(&self) -> RecordId {
        self.id
    }
}

/// Input for appending an activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivity {
    #[serde(rename = "type_c")]
    pub kind: String,

    #[serde(rename = "description_c")]
    pub description: String,

    #[serde(
        rename = "user_id_c",
        with = "lookup",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub user_id: Option<RecordId>,

    #[serde(
        rename = "project_id_c",
        with = "lookup",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub project_id: Option<RecordId>,

    #[serde(
        rename = "task_id_c",
        with = "lookup",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub task_id: Option<RecordId>,

    #[serde(rename = "created_at_c")]
    pub created_at: DateTime<Utc>,
}

impl NewActivity {
    pub fn new(kind: impl Into<String>, description: impl Into<String>) -> Self {
        NewActivity {
            kind: kind.into(),
            description: description.into(),
            user_id: None,
            project_id: None,
            task_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn by_user(mut self, user_id: RecordId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn on_project(mut self, project_id: RecordId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn on_task(mut self, task_id: RecordId) -> Self {
        self.task_id = Some(task_id);
        self
    }
}
