//! Task model
//!
//! # Status Lifecycle
//!
//! ```text
//! To Do ⇄ In Progress ⇄ Review ⇄ Done
//! ```
//!
//! The four labels form an open set: any status may move to any other.
//! A move persists only `status_c` and a refreshed `updated_at_c`.
//!
//! # Wire Shape
//!
//! ```text
//! task_c
//!   Id             integer (store-assigned)
//!   title_c        text
//!   description_c  multiline text
//!   priority_c     picklist (Low | Medium | High | Critical)
//!   status_c       picklist (To Do | In Progress | Review | Done)
//!   due_date_c     date (passed through as text)
//!   project_id_c   lookup -> project_c
//!   assignee_id_c  lookup -> user_c
//!   created_by_c   lookup -> user_c
//!   created_at_c   datetime
//!   updated_at_c   datetime
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::{lookup, Entity, RecordId};

/// Task status label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "To Do")]
    ToDo,

    #[serde(rename = "In Progress")]
    InProgress,

    #[serde(rename = "Review")]
    Review,

    #[serde(rename = "Done")]
    Done,
}

impl TaskStatus {
    /// Board column order
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::ToDo,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::ToDo => "To Do",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Review => "Review",
            TaskStatus::Done => "Done",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == label.trim())
    }

    pub fn is_done(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TaskPriority {
    #[serde(rename = "Low")]
    Low,

    #[default]
    #[serde(rename = "Medium")]
    Medium,

    #[serde(rename = "High")]
    High,

    #[serde(rename = "Critical")]
    Critical,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 4] = [
        TaskPriority::Low,
        TaskPriority::Medium,
        TaskPriority::High,
        TaskPriority::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
            TaskPriority::Critical => "Critical",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.as_str() == label.trim())
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "Id")]
    pub id: RecordId,

    #[serde(rename = "title_c", default)]
    pub title: String,

    #[serde(rename = "description_c", default)]
    pub description: Option<String>,

    #[serde(rename = "priority_c", default)]
    pub priority: TaskPriority,

    #[serde(rename = "status_c", default)]
    pub status: TaskStatus,

    #[serde(rename = "due_date_c", default)]
    pub due_date: Option<String>,

    #[serde(rename = "project_id_c", default, with = "lookup")]
    pub project_id: Option<RecordId>,

    #[serde(rename = "assignee_id_c", default, with = "lookup")]
    pub assignee_id: Option<RecordId>,

    #[serde(rename = "created_by_c", default, with = "lookup")]
    pub created_by: Option<RecordId>,

    #[serde(rename = "created_at_c", default)]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(rename = "updated_at_c", default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Task {
    const COLLECTION: &'static str = "task_c";
    const FIELDS: &'static [&'static str] = &[
        "Id",
        "title_c",
        "description_c",
        "priority_c",
        "status_c",
        "due_date_c",
        "project_id_c",
        "assignee_id_c",
        "created_by_c",
        "created_at_c",
        "updated_at_c",
    ];

    fn id(&self) -> RecordId {
        self.id
    }
}

impl Task {
    /// Whether the user is this task's assignee or creator
    pub fn is_owned_by(&self, user_id: RecordId) -> bool {
        self.assignee_id == Some(user_id) || self.created_by == Some(user_id)
    }
}

/// Input for creating a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CreateTask {
    #[serde(rename = "title_c")]
    #[validate(length(min = 1, message = "Task title is required"))]
    pub title: String,

    #[serde(rename = "description_c", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "priority_c")]
    pub priority: TaskPriority,

    #[serde(rename = "status_c")]
    pub status: TaskStatus,

    #[serde(rename = "due_date_c", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,

    #[serde(rename = "project_id_c", with = "lookup", default)]
    #[validate(required(message = "Project is required"))]
    pub project_id: Option<RecordId>,

    #[serde(
        rename = "assignee_id_c",
        with = "lookup",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub assignee_id: Option<RecordId>,

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

impl CreateTask {
    /// A medium-priority "To Do" task in the given project, stamped now
    pub fn new(title: impl Into<String>, project_id: RecordId) -> Self {
        let now = Utc::now();
        CreateTask {
            title: title.into(),
            description: None,
            priority: TaskPriority::Medium,
            status: TaskStatus::ToDo,
            due_date: None,
            project_id: Some(project_id),
            assignee_id: None,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Field replacement for an existing task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpdateTask {
    #[serde(rename = "Id")]
    pub id: RecordId,

    #[serde(rename = "title_c", skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Task title cannot be empty"))]
    pub title: Option<String>,

    #[serde(rename = "description_c", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "priority_c", skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,

    #[serde(rename = "status_c", skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,

    #[serde(rename = "due_date_c", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,

    #[serde(
        rename = "project_id_c",
        with = "lookup",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub project_id: Option<RecordId>,

    #[serde(
        rename = "assignee_id_c",
        with = "lookup",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub assignee_id: Option<RecordId>,

    /// Refreshed by the service on every update
    #[serde(rename = "updated_at_c", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl UpdateTask {
    pub fn for_task(id: RecordId) -> Self {
        UpdateTask {
            id,
            ..Default::default()
        }
    }

    /// The single-field status move: new status plus a fresh timestamp
    pub fn status_change(id: RecordId, status: TaskStatus, at: DateTime<Utc>) -> Self {
        UpdateTask {
            id,
            status: Some(status),
            updated_at: Some(at),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_labels() {
        assert_eq!(TaskStatus::from_label("In Progress"), Some(TaskStatus::InProgress));
        assert_eq!(TaskStatus::from_label(" Done "), Some(TaskStatus::Done));
        assert_eq!(TaskStatus::from_label("Blocked"), None);
        assert_eq!(serde_json::to_value(TaskStatus::ToDo).unwrap(), json!("To Do"));
    }

    #[test]
    fn test_priority_order() {
        assert!(TaskPriority::Critical > TaskPriority::High);
        assert!(TaskPriority::Low < TaskPriority::Medium);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn test_task_ownership() {
        let task: Task = serde_json::from_value(json!({
            "Id": 10,
            "title_c": "Write brief",
            "assignee_id_c": {"Id": 7, "Name": "Ana"},
            "created_by_c": 3
        }))
        .unwrap();

        assert!(task.is_owned_by(7));
        assert!(task.is_owned_by(3));
        assert!(!task.is_owned_by(4));
    }

    #[test]
    fn test_status_change_payload_has_two_fields() {
        let at = "2024-03-01T10:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let patch = UpdateTask::status_change(12, TaskStatus::Review, at);

        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            value,
            json!({
                "Id": 12,
                "status_c": "Review",
                "updated_at_c": "2024-03-01T10:00:00Z"
            })
        );
    }

    #[test]
    fn test_create_task_requires_project() {
        let mut payload = CreateTask::new("Plan sprint", 1);
        assert!(payload.validate().is_ok());

        payload.project_id = None;
        payload.title.clear();
        let errors = payload.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("project_id"));
        assert!(errors.field_errors().contains_key("title"));
    }
}
