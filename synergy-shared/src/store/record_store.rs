//! Record store trait and types
//!
//! This module defines the contract every record store backend implements.
//! A backend exposes named collections of JSON records with
//! store-assigned integer ids and five operations: fetch, get by id,
//! create, update and delete. Write operations are batched and report a
//! [`RecordOutcome`] per submitted record.
//!
//! # Failure Model
//!
//! ```text
//! transport failure / whole batch rejected  -> Err(StoreError)
//! some records rejected inside a batch      -> Ok(outcomes), failures itemized
//! single record not found                   -> Ok(None)
//! ```
//!
//! Nothing here retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::query::Query;
use crate::models::RecordId;

/// Record store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Request never produced a usable response
    #[error("Record store transport error: {0}")]
    Transport(String),

    /// Store answered with a non-success HTTP status
    #[error("Record store returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Store answered `success: false` for the whole request
    #[error("Record store rejected request on {collection}: {message}")]
    Rejected { collection: String, message: String },

    /// Response body could not be decoded
    #[error("Failed to decode record store response: {0}")]
    Decode(String),

    /// Client misconfiguration
    #[error("Record store configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            StoreError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// Record store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Result for one record inside a batch write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordOutcome {
    pub success: bool,

    /// The stored record (create/update) on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,

    /// Reason the store gave for a failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RecordOutcome {
    pub fn succeeded(data: JsonValue) -> Self {
        RecordOutcome {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        RecordOutcome {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Failure message, or a generic one when the store gave none
    pub fn failure_message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| "Record rejected by store".to_string())
    }
}

/// One page of fetched records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub records: Vec<JsonValue>,

    /// Matching records across all pages, when the store reports it
    #[serde(default)]
    pub total: Option<u64>,
}

/// Response envelope used by every store endpoint
///
/// Reads return `data`; batch writes return `results`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,

    #[serde(default = "none")]
    pub data: Option<T>,

    #[serde(default)]
    pub results: Option<Vec<RecordOutcome>>,

    #[serde(default)]
    pub total: Option<u64>,

    #[serde(default)]
    pub message: Option<String>,
}

fn none<T>() -> Option<T> {
    None
}

/// Operation kinds, used for logging and call accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Fetch,
    Get,
    Create,
    Update,
    Delete,
}

impl StoreOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOperation::Fetch => "fetch",
            StoreOperation::Get => "get",
            StoreOperation::Create => "create",
            StoreOperation::Update => "update",
            StoreOperation::Delete => "delete",
        }
    }
}

/// Core record store trait
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Backend name, for logging
    fn name(&self) -> &str;

    /// Fetches the records of `collection` matching `query`
    async fn fetch_records(&self, collection: &str, query: &Query) -> StoreResult<Page>;

    /// Fetches one record; `Ok(None)` when it does not exist
    async fn get_record_by_id(
        &self,
        collection: &str,
        id: RecordId,
        fields: &[String],
    ) -> StoreResult<Option<JsonValue>>;

    /// Creates records, returning one outcome per input in input order
    async fn create_records(
        &self,
        collection: &str,
        records: Vec<JsonValue>,
    ) -> StoreResult<Vec<RecordOutcome>>;

    /// Replaces the supplied fields of existing records (each carries `Id`)
    async fn update_records(
        &self,
        collection: &str,
        records: Vec<JsonValue>,
    ) -> StoreResult<Vec<RecordOutcome>>;

    /// Deletes records by id, returning one outcome per id in input order
    async fn delete_records(
        &self,
        collection: &str,
        ids: &[RecordId],
    ) -> StoreResult<Vec<RecordOutcome>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_outcome_constructors() {
        let ok = RecordOutcome::succeeded(json!({"Id": 1}));
        assert!(ok.success);
        assert_eq!(ok.data.unwrap()["Id"], 1);

        let failed = RecordOutcome::failed("Name is required");
        assert!(!failed.success);
        assert_eq!(failed.failure_message(), "Name is required");

        let bare = RecordOutcome {
            success: false,
            data: None,
            message: None,
        };
        assert_eq!(bare.failure_message(), "Record rejected by store");
    }

    #[test]
    fn test_envelope_batch_results() {
        let envelope: Envelope<JsonValue> = serde_json::from_value(json!({
            "success": true,
            "results": [
                {"success": true, "data": {"Id": 4}},
                {"success": false, "message": "Duplicate name"}
            ]
        }))
        .unwrap();

        let results = envelope.results.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].message.as_deref(), Some("Duplicate name"));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_envelope_failure() {
        let envelope: Envelope<Vec<JsonValue>> = serde_json::from_value(json!({
            "success": false,
            "message": "Invalid project key"
        }))
        .unwrap();

        assert!(!envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("Invalid project key"));
    }

    #[test]
    fn test_store_error_display() {
        let err = StoreError::Rejected {
            collection: "task_c".to_string(),
            message: "quota exceeded".to_string(),
        };
        assert!(err.to_string().contains("task_c"));
        assert!(err.to_string().contains("quota exceeded"));
    }
}
