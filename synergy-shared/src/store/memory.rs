//! In-memory record store for tests and demos
//!
//! [`MemoryStore`] implements [`RecordStore`] over process-local maps. It
//! assigns ids, applies `where` conditions, ordering, paging and field
//! selection the way the hosted store does, and records every call so tests
//! can assert what was (or was not) sent.
//!
//! Two knobs simulate store behaviour:
//!
//! - [`MemoryStore::require_field`] rejects individual records missing a
//!   field, giving partial batch failures
//! - [`MemoryStore::set_offline`] fails every request with a transport error
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use synergy_shared::store::{MemoryStore, StoreOperation};
//!
//! let store = MemoryStore::new();
//! let id = store.seed("project_c", json!({"name_c": "Website"}));
//! assert_eq!(id, 1);
//! assert_eq!(store.records("project_c").len(), 1);
//! assert!(store.calls_of(StoreOperation::Create).is_empty());
//! ```

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use super::query::{Condition, Operator, Query, SortDirection};
use super::record_store::{
    Page, RecordOutcome, RecordStore, StoreError, StoreOperation, StoreResult,
};
use crate::models::lookup::record_id_from_value;
use crate::models::RecordId;

/// One call observed by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub operation: StoreOperation,
    pub collection: String,

    /// Records or ids submitted (1 for fetch/get)
    pub count: usize,
}

#[derive(Default)]
struct State {
    collections: HashMap<String, BTreeMap<RecordId, JsonValue>>,
    next_id: HashMap<String, RecordId>,
    required: HashMap<String, Vec<String>>,
    locked: HashMap<String, Vec<RecordId>>,
    offline: bool,
    calls: Vec<StoreCall>,
}

impl State {
    fn allocate_id(&mut self, collection: &str) -> RecordId {
        let next = self.next_id.entry(collection.to_string()).or_insert(1);
        let id = *next;
        *next += 1;
        id
    }

    fn insert(&mut self, collection: &str, fields: JsonValue) -> JsonValue {
        let id = self.allocate_id(collection);
        let mut record = match fields {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        record.insert("Id".to_string(), JsonValue::from(id));
        let record = JsonValue::Object(record);

        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id, record.clone());
        record
    }

    fn missing_required(&self, collection: &str, record: &JsonValue) -> Option<String> {
        self.required.get(collection).and_then(|fields| {
            fields
                .iter()
                .find(|field| is_blank(record.get(field.as_str())))
                .cloned()
        })
    }
}

/// Process-local record store
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Inserts a record directly, bypassing call accounting
    ///
    /// Returns the assigned id.
    pub fn seed(&self, collection: &str, fields: JsonValue) -> RecordId {
        let mut state = self.lock();
        let record = state.insert(collection, fields);
        record_id_from_value(&record["Id"]).unwrap_or_default()
    }

    /// Rejects created records of `collection` whose `field` is absent or blank
    pub fn require_field(&self, collection: &str, field: &str) {
        self.lock()
            .required
            .entry(collection.to_string())
            .or_default()
            .push(field.to_string());
    }

    /// Refuses deletes of one record, which stays stored
    pub fn lock_record(&self, collection: &str, id: RecordId) {
        self.lock()
            .locked
            .entry(collection.to_string())
            .or_default()
            .push(id);
    }

    /// Makes every subsequent request fail (or succeed again)
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn calls_of(&self, operation: StoreOperation) -> Vec<StoreCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Stored records of a collection, in id order
    pub fn records(&self, collection: &str) -> Vec<JsonValue> {
        self.lock()
            .collections
            .get(collection)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn record(&self, collection: &str, id: RecordId) -> Option<JsonValue> {
        self.lock()
            .collections
            .get(collection)
            .and_then(|records| records.get(&id).cloned())
    }

    fn begin(
        &self,
        operation: StoreOperation,
        collection: &str,
        count: usize,
    ) -> StoreResult<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(StoreCall {
            operation,
            collection: collection.to_string(),
            count,
        });

        if state.offline {
            return Err(StoreError::Transport(format!(
                "memory store offline ({} {})",
                operation.as_str(),
                collection
            )));
        }

        Ok(state)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch_records(&self, collection: &str, query: &Query) -> StoreResult<Page> {
        let state = self.begin(StoreOperation::Fetch, collection, 1)?;

        let mut matched: Vec<&JsonValue> = state
            .collections
            .get(collection)
            .map(|records| {
                records
                    .values()
                    .filter(|record| query.conditions.iter().all(|c| matches(record, c)))
                    .collect()
            })
            .unwrap_or_default();

        for order in query.order_by.iter().rev() {
            matched.sort_by(|a, b| {
                let ordering = compare_values(a.get(&order.field), b.get(&order.field));
                match order.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        let total = matched.len() as u64;
        let (offset, limit) = match query.paging {
            Some(paging) => (paging.offset as usize, paging.limit as usize),
            None => (0, matched.len()),
        };

        let records = matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|record| project_fields(record, &query.fields))
            .collect();

        Ok(Page {
            records,
            total: Some(total),
        })
    }

    async fn get_record_by_id(
        &self,
        collection: &str,
        id: RecordId,
        fields: &[String],
    ) -> StoreResult<Option<JsonValue>> {
        let state = self.begin(StoreOperation::Get, collection, 1)?;

        Ok(state
            .collections
            .get(collection)
            .and_then(|records| records.get(&id))
            .map(|record| project_fields(record, fields)))
    }

    async fn create_records(
        &self,
        collection: &str,
        records: Vec<JsonValue>,
    ) -> StoreResult<Vec<RecordOutcome>> {
        let mut state = self.begin(StoreOperation::Create, collection, records.len())?;

        let outcomes = records
            .into_iter()
            .map(|record| {
                if !record.is_object() {
                    return RecordOutcome::failed("Record must be an object");
                }
                if let Some(field) = state.missing_required(collection, &record) {
                    return RecordOutcome::failed(format!("Field {} is required", field));
                }
                RecordOutcome::succeeded(state.insert(collection, record))
            })
            .collect();

        Ok(outcomes)
    }

    async fn update_records(
        &self,
        collection: &str,
        records: Vec<JsonValue>,
    ) -> StoreResult<Vec<RecordOutcome>> {
        let mut state = self.begin(StoreOperation::Update, collection, records.len())?;
        let stored = state.collections.entry(collection.to_string()).or_default();

        let outcomes = records
            .into_iter()
            .map(|record| {
                let Some(id) = record.get("Id").and_then(record_id_from_value) else {
                    return RecordOutcome::failed("Id is required for update");
                };
                let Some(existing) = stored.get_mut(&id) else {
                    return RecordOutcome::failed(format!("Record {} not found", id));
                };

                if let (Some(target), JsonValue::Object(changes)) = (existing.as_object_mut(), record)
                {
                    for (key, value) in changes {
                        if key != "Id" {
                            target.insert(key, value);
                        }
                    }
                }
                RecordOutcome::succeeded(existing.clone())
            })
            .collect();

        Ok(outcomes)
    }

    async fn delete_records(
        &self,
        collection: &str,
        ids: &[RecordId],
    ) -> StoreResult<Vec<RecordOutcome>> {
        let mut state = self.begin(StoreOperation::Delete, collection, ids.len())?;
        let locked = state.locked.get(collection).cloned().unwrap_or_default();
        let stored = state.collections.entry(collection.to_string()).or_default();

        Ok(ids
            .iter()
            .map(|id| {
                if locked.contains(id) {
                    return RecordOutcome::failed(format!("Record {} is locked", id));
                }
                match stored.remove(id) {
                    Some(_) => RecordOutcome {
                        success: true,
                        data: None,
                        message: None,
                    },
                    None => RecordOutcome::failed(format!("Record {} not found", id)),
                }
            })
            .collect())
    }
}

fn is_blank(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => true,
        Some(JsonValue::String(s)) => s.trim().is_empty(),
        _ => false,
    }
}

/// Keeps only the selected fields (plus `Id`); all fields when none selected
fn project_fields(record: &JsonValue, fields: &[String]) -> JsonValue {
    if fields.is_empty() {
        return record.clone();
    }

    let wanted: HashSet<&str> = fields.iter().map(String::as_str).collect();
    let projected = record
        .as_object()
        .map(|map| {
            map.iter()
                .filter(|(key, _)| key.as_str() == "Id" || wanted.contains(key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect::<Map<String, JsonValue>>()
        })
        .unwrap_or_default();

    JsonValue::Object(projected)
}

/// Comparable text of a scalar or lookup value
fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        JsonValue::Object(_) => record_id_from_value(value).map(|id| id.to_string()),
        JsonValue::Array(_) => Some(value.to_string()),
    }
}

fn matches(record: &JsonValue, condition: &Condition) -> bool {
    let Some(actual) = record.get(&condition.field).and_then(scalar_text) else {
        return condition.operator == Operator::NotEqualTo;
    };

    let mut candidates = condition.values.iter().filter_map(scalar_text);
    match condition.operator {
        Operator::EqualTo | Operator::ExactMatch => candidates.any(|v| v == actual),
        Operator::NotEqualTo => candidates.all(|v| v != actual),
        Operator::Contains => {
            let haystack = actual.to_lowercase();
            candidates.any(|v| haystack.contains(&v.to_lowercase()))
        }
        Operator::GreaterThan => {
            candidates.any(|v| compare_text(&actual, &v) == Ordering::Greater)
        }
        Operator::LessThan => candidates.any(|v| compare_text(&actual, &v) == Ordering::Less),
    }
}

/// Numeric comparison when both sides parse as numbers, text otherwise
fn compare_text(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

/// Orders missing values first
fn compare_values(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a.and_then(scalar_text), b.and_then(scalar_text)) {
        (Some(x), Some(y)) => compare_text(&x, &y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
