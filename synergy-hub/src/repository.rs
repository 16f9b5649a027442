//! Generic entity repository
//!
//! [`Repository<E>`] provides the CRUD surface shared by every entity: it
//! fills in the entity's field selection, decodes store records into `E`,
//! and turns batch write results into typed outcomes. Entity services wrap
//! one repository each and add permission checks.
//!
//! # Write results
//!
//! ```text
//! create_many   one store call, outcomes index-aligned with the payloads
//! create/update single-record batch, a rejected record is an error
//! delete_selected  one store call per id, sequential, failures collected
//! delete_all    fetch ids, then one delete call (none when empty)
//! ```

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::marker::PhantomData;
use std::sync::Arc;

use synergy_shared::models::{Entity, RecordId};
use synergy_shared::store::{Query, RecordOutcome, RecordStore, StoreError};

use crate::error::{ServiceError, ServiceResult};

/// Records fetched per request by [`Repository::fetch_all`]
pub const PAGE_SIZE: u32 = 100;

/// A record the store refused inside a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRecord {
    /// Position of the payload in the submitted batch
    pub index: usize,
    pub message: String,
}

/// Typed result of a bulk create
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome<E> {
    pub created: Vec<E>,
    pub failed: Vec<FailedRecord>,
}

impl<E> Default for BatchOutcome<E> {
    fn default() -> Self {
        BatchOutcome {
            created: Vec::new(),
            failed: Vec::new(),
        }
    }
}

impl<E> BatchOutcome<E> {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of a multi-record delete
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteSummary {
    pub deleted: Vec<RecordId>,
    pub failed: Vec<(RecordId, String)>,
}

impl DeleteSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// CRUD access to the collection of `E`
pub struct Repository<E> {
    store: Arc<dyn RecordStore>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Repository {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Repository {
            store,
            _entity: PhantomData,
        }
    }

    pub fn collection(&self) -> &'static str {
        E::COLLECTION
    }

    fn decode(&self, record: JsonValue) -> ServiceResult<E> {
        serde_json::from_value(record).map_err(|e| ServiceError::decode(E::COLLECTION, e))
    }

    fn aborted(&self, operation: &'static str, err: StoreError) -> ServiceError {
        tracing::error!(collection = E::COLLECTION, operation, error = %err, "Store operation failed");
        ServiceError::Store(err)
    }

    fn rejected(&self, outcome: &RecordOutcome) -> ServiceError {
        ServiceError::Store(StoreError::Rejected {
            collection: E::COLLECTION.to_string(),
            message: outcome.failure_message(),
        })
    }

    /// Fetches one page of records matching `query`
    pub async fn fetch(&self, query: Query) -> ServiceResult<Vec<E>> {
        let query = query.with_default_fields(E::FIELDS);
        tracing::debug!(collection = E::COLLECTION, conditions = query.conditions.len(), "Fetching records");

        let page = self
            .store
            .fetch_records(E::COLLECTION, &query)
            .await
            .map_err(|e| self.aborted("fetch", e))?;

        page.records.into_iter().map(|r| self.decode(r)).collect()
    }

    /// Fetches every record of the collection, page by page
    pub async fn fetch_all(&self) -> ServiceResult<Vec<E>> {
        self.fetch_all_matching(Query::default()).await
    }

    /// Fetches every record matching `query`, ignoring any paging it carries
    pub async fn fetch_all_matching(&self, query: Query) -> ServiceResult<Vec<E>> {
        let base = query.with_default_fields(E::FIELDS);
        let mut all = Vec::new();
        let mut offset = 0u32;

        loop {
            let page = self
                .store
                .fetch_records(E::COLLECTION, &base.clone().page(PAGE_SIZE, offset))
                .await
                .map_err(|e| self.aborted("fetch", e))?;

            let received = page.records.len();
            for record in page.records {
                all.push(self.decode(record)?);
            }

            // Without a reported total only a short page ends the listing
            let reached_total = page.total.is_some_and(|total| all.len() as u64 >= total);
            if received < PAGE_SIZE as usize || reached_total {
                break;
            }
            offset += PAGE_SIZE;
        }

        tracing::debug!(collection = E::COLLECTION, count = all.len(), "Fetched all records");
        Ok(all)
    }

    /// Fetches one record, `None` when absent
    pub async fn get(&self, id: RecordId) -> ServiceResult<Option<E>> {
        let fields: Vec<String> = E::FIELDS.iter().map(|f| f.to_string()).collect();
        tracing::debug!(collection = E::COLLECTION, id, "Fetching record");

        let record = self
            .store
            .get_record_by_id(E::COLLECTION, id, &fields)
            .await
            .map_err(|e| self.aborted("get", e))?;

        record.map(|r| self.decode(r)).transpose()
    }

    /// Like [`get`](Self::get) but absence is [`ServiceError::NotFound`]
    pub async fn require(&self, id: RecordId) -> ServiceResult<E> {
        self.get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(E::COLLECTION, id))
    }

    /// Creates records in one batch
    ///
    /// An empty batch makes no store call.
    pub async fn create_many<P: Serialize>(&self, payloads: &[P]) -> ServiceResult<BatchOutcome<E>> {
        if payloads.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let records = payloads
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ServiceError::Validation(format!("Unserializable payload: {}", e)))?;

        tracing::debug!(collection = E::COLLECTION, count = records.len(), "Creating records");
        let outcomes = self
            .store
            .create_records(E::COLLECTION, records)
            .await
            .map_err(|e| self.aborted("create", e))?;

        let mut batch = BatchOutcome::default();
        for (index, outcome) in outcomes.into_iter().enumerate() {
            let decoded = match (outcome.success, outcome.data.clone()) {
                (true, Some(data)) => self.decode(data).map_err(|e| e.to_string()),
                _ => Err(outcome.failure_message()),
            };

            match decoded {
                Ok(entity) => batch.created.push(entity),
                Err(message) => batch.failed.push(FailedRecord { index, message }),
            }
        }

        if batch.failed.is_empty() {
            tracing::info!(collection = E::COLLECTION, created = batch.created.len(), "Records created");
        } else {
            tracing::warn!(
                collection = E::COLLECTION,
                created = batch.created.len(),
                failed = batch.failed.len(),
                "Some records were not created"
            );
        }

        Ok(batch)
    }

    /// Creates one record
    pub async fn create<P: Serialize>(&self, payload: &P) -> ServiceResult<E> {
        let mut batch = self.create_many(std::slice::from_ref(payload)).await?;

        if let Some(failure) = batch.failed.pop() {
            return Err(ServiceError::Store(StoreError::Rejected {
                collection: E::COLLECTION.to_string(),
                message: failure.message,
            }));
        }

        batch.created.pop().ok_or_else(|| {
            ServiceError::decode(E::COLLECTION, "store returned no created record")
        })
    }

    /// Replaces the fields present in `patch` (which carries the `Id`)
    pub async fn update<P: Serialize>(&self, patch: &P) -> ServiceResult<E> {
        let record = serde_json::to_value(patch)
            .map_err(|e| ServiceError::Validation(format!("Unserializable payload: {}", e)))?;
        let id = record.get("Id").and_then(JsonValue::as_i64);
        tracing::debug!(collection = E::COLLECTION, id, "Updating record");

        let outcome = self
            .store
            .update_records(E::COLLECTION, vec![record])
            .await
            .map_err(|e| self.aborted("update", e))?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::decode(E::COLLECTION, "store returned no update result"))?;

        match outcome {
            RecordOutcome {
                success: true,
                data: Some(data),
                ..
            } => {
                let entity = self.decode(data)?;
                tracing::info!(collection = E::COLLECTION, id = entity.id(), "Record updated");
                Ok(entity)
            }
            outcome => {
                tracing::warn!(collection = E::COLLECTION, id, message = ?outcome.message, "Update rejected");
                Err(self.rejected(&outcome))
            }
        }
    }

    /// Deletes one record
    pub async fn delete(&self, id: RecordId) -> ServiceResult<()> {
        tracing::debug!(collection = E::COLLECTION, id, "Deleting record");

        let outcome = self
            .store
            .delete_records(E::COLLECTION, &[id])
            .await
            .map_err(|e| self.aborted("delete", e))?
            .into_iter()
            .next()
            .ok_or_else(|| ServiceError::decode(E::COLLECTION, "store returned no delete result"))?;

        if !outcome.success {
            tracing::warn!(collection = E::COLLECTION, id, message = ?outcome.message, "Delete rejected");
            return Err(self.rejected(&outcome));
        }

        tracing::info!(collection = E::COLLECTION, id, "Record deleted");
        Ok(())
    }

    /// Deletes the given records one at a time, in order
    ///
    /// A failed delete does not stop the remaining ones.
    pub async fn delete_selected(&self, ids: &[RecordId]) -> DeleteSummary {
        let mut summary = DeleteSummary::default();

        for &id in ids {
            match self.delete(id).await {
                Ok(()) => summary.deleted.push(id),
                Err(e) => summary.failed.push((id, e.to_string())),
            }
        }

        if !summary.all_succeeded() {
            tracing::warn!(
                collection = E::COLLECTION,
                deleted = summary.deleted.len(),
                failed = summary.failed.len(),
                "Some selected records were not deleted"
            );
        }

        summary
    }

    /// Deletes every record of the collection
    ///
    /// An empty collection succeeds without a delete call.
    pub async fn delete_all(&self) -> ServiceResult<DeleteSummary> {
        let ids: Vec<RecordId> = self
            .fetch_all_matching(Query::select(&["Id"]))
            .await?
            .iter()
            .map(|record| record.id())
            .collect();

        if ids.is_empty() {
            tracing::debug!(collection = E::COLLECTION, "Nothing to delete");
            return Ok(DeleteSummary::default());
        }

        let outcomes = self
            .store
            .delete_records(E::COLLECTION, &ids)
            .await
            .map_err(|e| self.aborted("delete", e))?;

        let mut summary = DeleteSummary::default();
        for (id, outcome) in ids.into_iter().zip(outcomes) {
            if outcome.success {
                summary.deleted.push(id);
            } else {
                summary.failed.push((id, outcome.failure_message()));
            }
        }

        if summary.all_succeeded() {
            tracing::info!(collection = E::COLLECTION, deleted = summary.deleted.len(), "All records deleted");
        } else {
            tracing::warn!(
                collection = E::COLLECTION,
                deleted = summary.deleted.len(),
                failed = summary.failed.len(),
                "Some records were not deleted"
            );
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use synergy_shared::models::{CreateProject, Project, UpdateProject};
    use synergy_shared::store::{MemoryStore, Page, StoreOperation, StoreResult};

    fn repo() -> (Arc<MemoryStore>, Repository<Project>) {
        let store = Arc::new(MemoryStore::new());
        let repo = Repository::new(store.clone() as Arc<dyn RecordStore>);
        (store, repo)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_store, repo) = repo();
        let created = repo.create(&CreateProject::new("Website")).await.unwrap();
        assert_eq!(created.name, "Website");
        assert_eq!(created.progress, 0);

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(repo.get(999).await.unwrap().is_none());
        assert!(matches!(
            repo.require(999).await,
            Err(ServiceError::NotFound { id: 999, .. })
        ));
    }

    #[tokio::test]
    async fn test_create_many_partitions_outcomes() {
        let (store, repo) = repo();
        store.require_field("project_c", "name_c");

        let batch = repo
            .create_many(&[
                json!({"name_c": "A"}),
                json!({"name_c": ""}),
                json!({"name_c": "C"}),
            ])
            .await
            .unwrap();

        assert_eq!(batch.created.len(), 2);
        assert_eq!(
            batch.failed,
            vec![FailedRecord {
                index: 1,
                message: "Field name_c is required".to_string()
            }]
        );
        assert_eq!(store.calls_of(StoreOperation::Create).len(), 1);
    }

    #[tokio::test]
    async fn test_empty_create_many_makes_no_call() {
        let (store, repo) = repo();
        let batch = repo.create_many::<JsonValue>(&[]).await.unwrap();
        assert!(batch.created.is_empty());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_sends_only_patch_fields() {
        let (store, repo) = repo();
        let id = store.seed("project_c", json!({"name_c": "Old", "description_c": "Keep"}));

        let mut patch = UpdateProject::for_project(id);
        patch.name = Some("New".to_string());
        let updated = repo.update(&patch).await.unwrap();

        assert_eq!(updated.name, "New");
        assert_eq!(updated.description.as_deref(), Some("Keep"));
    }

    #[tokio::test]
    async fn test_fetch_all_pages_through_collection() {
        let (store, repo) = repo();
        for i in 0..(PAGE_SIZE + 5) {
            store.seed("project_c", json!({"name_c": format!("P{}", i)}));
        }

        let all = repo.fetch_all().await.unwrap();
        assert_eq!(all.len(), PAGE_SIZE as usize + 5);
        assert_eq!(store.calls_of(StoreOperation::Fetch).len(), 2);
    }

    #[tokio::test]
    async fn test_delete_all_on_empty_collection() {
        let (store, repo) = repo();
        let summary = repo.delete_all().await.unwrap();
        assert!(summary.all_succeeded());
        assert!(summary.deleted.is_empty());
        assert!(store.calls_of(StoreOperation::Delete).is_empty());
    }

    #[tokio::test]
    async fn test_delete_all_single_call() {
        let (store, repo) = repo();
        store.seed("project_c", json!({"name_c": "A"}));
        store.seed("project_c", json!({"name_c": "B"}));

        let summary = repo.delete_all().await.unwrap();
        assert_eq!(summary.deleted, vec![1, 2]);
        let deletes = store.calls_of(StoreOperation::Delete);
        assert_eq!(deletes.len(), 1);
        assert_eq!(deletes[0].count, 2);
        assert!(store.records("project_c").is_empty());
    }

    #[tokio::test]
    async fn test_delete_selected_is_sequential_and_reports_failures() {
        let (store, repo) = repo();
        let a = store.seed("project_c", json!({"name_c": "A"}));
        let b = store.seed("project_c", json!({"name_c": "B"}));

        let summary = repo.delete_selected(&[a, 77, b]).await;
        assert_eq!(summary.deleted, vec![a, b]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, 77);
        assert!(!summary.all_succeeded());

        let deletes = store.calls_of(StoreOperation::Delete);
        assert_eq!(deletes.len(), 3);
        assert!(deletes.iter().all(|c| c.count == 1));
    }

    #[tokio::test]
    async fn test_transport_failure_aborts() {
        let (store, repo) = repo();
        store.set_offline(true);
        assert!(matches!(
            repo.fetch_all().await,
            Err(ServiceError::Store(StoreError::Transport(_)))
        ));
    }

    /// Forwards to a memory store but drops the reported total
    struct UncountedStore(Arc<MemoryStore>);

    #[async_trait::async_trait]
    impl RecordStore for UncountedStore {
        fn name(&self) -> &str {
            "uncounted"
        }

        async fn fetch_records(&self, collection: &str, query: &Query) -> StoreResult<Page> {
            let mut page = self.0.fetch_records(collection, query).await?;
            page.total = None;
            Ok(page)
        }

        async fn get_record_by_id(
            &self,
            collection: &str,
            id: RecordId,
            fields: &[String],
        ) -> StoreResult<Option<JsonValue>> {
            self.0.get_record_by_id(collection, id, fields).await
        }

        async fn create_records(
            &self,
            collection: &str,
            records: Vec<JsonValue>,
        ) -> StoreResult<Vec<RecordOutcome>> {
            self.0.create_records(collection, records).await
        }

        async fn update_records(
            &self,
            collection: &str,
            records: Vec<JsonValue>,
        ) -> StoreResult<Vec<RecordOutcome>> {
            self.0.update_records(collection, records).await
        }

        async fn delete_records(
            &self,
            collection: &str,
            ids: &[RecordId],
        ) -> StoreResult<Vec<RecordOutcome>> {
            self.0.delete_records(collection, ids).await
        }
    }

    #[tokio::test]
    async fn test_fetch_all_without_total_reads_until_short_page() {
        let memory = Arc::new(MemoryStore::new());
        for i in 0..150 {
            memory.seed("project_c", json!({"name_c": format!("P{}", i)}));
        }
        let repo: Repository<Project> = Repository::new(Arc::new(UncountedStore(memory.clone())));

        let all = repo.fetch_all().await.unwrap();
        assert_eq!(all.len(), 150);
        assert_eq!(memory.calls_of(StoreOperation::Fetch).len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_all_without_total_on_exact_page_boundary() {
        let memory = Arc::new(MemoryStore::new());
        for i in 0..PAGE_SIZE {
            memory.seed("project_c", json!({"name_c": format!("P{}", i)}));
        }
        let repo: Repository<Project> = Repository::new(Arc::new(UncountedStore(memory.clone())));

        assert_eq!(repo.fetch_all().await.unwrap().len(), PAGE_SIZE as usize);
        assert_eq!(memory.calls_of(StoreOperation::Fetch).len(), 2);
    }
}
