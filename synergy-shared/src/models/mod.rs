//! Record models for Synergy Hub
//!
//! Every entity lives in one collection of the remote record store. Custom
//! fields carry the store's `_c` suffix on the wire; the identifier is the
//! store-assigned `Id`.
//!
//! # Models
//!
//! - `role`: the fixed role enumeration driving authorization
//! - `user`: people using the hub
//! - `project`: projects with status, schedule and member list
//! - `task`: tasks with priority and the four-label status lifecycle
//! - `resource`: company resources (policies, templates, ...)
//! - `activity`: append-only activity log

pub mod activity;
pub mod project;
pub mod resource;
pub mod role;
pub mod task;
pub mod user;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use activity::{Activity, NewActivity};
pub use project::{CreateProject, Project, ProjectStatus, UpdateProject};
pub use resource::{CompanyResource, CreateResource, ResourceCategory};
pub use role::{Role, UnknownRole};
pub use task::{CreateTask, Task, TaskPriority, TaskStatus, UpdateTask};
pub use user::{CreateUser, UpdateUser, User};

/// Store-assigned record identifier
pub type RecordId = i64;

/// A record type persisted in one collection of the record store
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection name in the remote store (e.g. `task_c`)
    const COLLECTION: &'static str;

    /// Fields requested when fetching records of this type
    const FIELDS: &'static [&'static str];

    /// Store-assigned identifier
    fn id(&self) -> RecordId;
}

/// Serde helpers for reference ("lookup") fields
///
/// The store returns references either as a bare id, a numeric string, or an
/// object carrying `Id` (and a display `Name`). All three decode to the id;
/// encoding always writes the bare id.
pub(crate) mod lookup {
    use super::RecordId;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value as JsonValue;

    pub fn serialize<S>(value: &Option<RecordId>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(id) => serializer.serialize_i64(*id),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<RecordId>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<JsonValue>::deserialize(deserializer)?;
        Ok(value.as_ref().and_then(record_id_from_value))
    }

    /// Extracts an id from a lookup value, if it holds one
    pub fn record_id_from_value(value: &JsonValue) -> Option<RecordId> {
        match value {
            JsonValue::Number(n) => n.as_i64(),
            JsonValue::String(s) => s.trim().parse().ok(),
            JsonValue::Object(map) => map
                .get("Id")
                .or_else(|| map.get("user_id"))
                .and_then(record_id_from_value),
            _ => None,
        }
    }
}
