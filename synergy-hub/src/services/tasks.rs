//! Task service
//!
//! Any signed-in user may create a task. Editing, moving or deleting an
//! existing task requires a task-manager role or ownership of that task
//! (assignee or creator). Bulk deletes have no single task to own and
//! require the role.

use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

use synergy_shared::auth::authorization::{
    require_role, require_signed_in, require_task_management, TASK_MANAGER_ROLES,
};
use synergy_shared::auth::Session;
use synergy_shared::models::{CreateTask, RecordId, Task, TaskStatus, UpdateTask};
use synergy_shared::store::{Condition, Query, RecordStore, SortDirection};

use crate::error::ServiceResult;
use crate::repository::{DeleteSummary, Repository};

#[derive(Clone)]
pub struct TaskService {
    repo: Repository<Task>,
}

impl TaskService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        TaskService {
            repo: Repository::new(store),
        }
    }

    fn newest_first() -> Query {
        Query::default().order_by("created_at_c", SortDirection::Descending)
    }

    pub async fn list(&self) -> ServiceResult<Vec<Task>> {
        self.repo.fetch_all_matching(Self::newest_first()).await
    }

    pub async fn get(&self, id: RecordId) -> ServiceResult<Option<Task>> {
        self.repo.get(id).await
    }

    pub async fn by_project(&self, project_id: RecordId) -> ServiceResult<Vec<Task>> {
        self.repo
            .fetch_all_matching(Self::newest_first().filter(Condition::equal_to("project_id_c", project_id)))
            .await
    }

    pub async fn by_assignee(&self, user_id: RecordId) -> ServiceResult<Vec<Task>> {
        self.repo
            .fetch_all_matching(Self::newest_first().filter(Condition::equal_to("assignee_id_c", user_id)))
            .await
    }

    pub async fn create(&self, session: &Session, mut payload: CreateTask) -> ServiceResult<Task> {
        let user = require_signed_in(session)?;

        if payload.created_by.is_none() {
            payload.created_by = Some(user.id);
        }
        payload.validate()?;

        let task = self.repo.create(&payload).await?;
        tracing::info!(task_id = task.id, project_id = ?task.project_id, "Task created");
        Ok(task)
    }

    pub async fn update(&self, session: &Session, mut patch: UpdateTask) -> ServiceResult<Task> {
        let task = self.repo.require(patch.id).await?;
        require_task_management(session, &task)?;

        patch.validate()?;
        patch.updated_at = Some(Utc::now());
        self.repo.update(&patch).await
    }

    /// Moves a task to `status`
    ///
    /// Persists only the status and a refreshed `updated_at`.
    pub async fn update_status(
        &self,
        session: &Session,
        id: RecordId,
        status: TaskStatus,
    ) -> ServiceResult<Task> {
        let task = self.repo.require(id).await?;
        require_task_management(session, &task)?;

        let moved = self
            .repo
            .update(&UpdateTask::status_change(id, status, Utc::now()))
            .await?;

        tracing::info!(task_id = id, from = %task.status, to = %status, "Task status changed");
        Ok(moved)
    }

    pub async fn delete(&self, session: &Session, id: RecordId) -> ServiceResult<()> {
        let task = self.repo.require(id).await?;
        require_task_management(session, &task)?;
        self.repo.delete(id).await
    }

    pub async fn delete_selected(
        &self,
        session: &Session,
        ids: &[RecordId],
    ) -> ServiceResult<DeleteSummary> {
        require_role(session, TASK_MANAGER_ROLES)?;
        Ok(self.repo.delete_selected(ids).await)
    }

    pub async fn delete_all(&self, session: &Session) -> ServiceResult<DeleteSummary> {
        require_role(session, TASK_MANAGER_ROLES)?;
        self.repo.delete_all().await
    }

    pub(crate) fn repository(&self) -> &Repository<Task> {
        &self.repo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use synergy_shared::auth::authorization::AuthzError;
    use synergy_shared::auth::CurrentUser;
    use synergy_shared::models::Role;
    use synergy_shared::store::{MemoryStore, StoreOperation};

    use crate::error::ServiceError;

    fn service() -> (Arc<MemoryStore>, TaskService) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), TaskService::new(store))
    }

    fn session(id: RecordId, role: Role) -> Session {
        Session::signed_in(CurrentUser::new(id, "Alex", role))
    }

    #[tokio::test]
    async fn test_create_requires_sign_in_and_project() {
        let (store, service) = service();

        let err = service
            .create(&Session::anonymous(), CreateTask::new("T", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(AuthzError::Unauthenticated)));

        let mut orphan = CreateTask::new("T", 1);
        orphan.project_id = None;
        let err = service.create(&session(2, Role::Guest), orphan).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(store.calls().is_empty());

        let task = service
            .create(&session(2, Role::Guest), CreateTask::new("T", 1))
            .await
            .unwrap();
        assert_eq!(task.created_by, Some(2));
        assert_eq!(task.status, TaskStatus::ToDo);
    }

    #[tokio::test]
    async fn test_status_update_sends_only_status_and_timestamp() {
        let (store, service) = service();
        let id = store.seed(
            "task_c",
            json!({"title_c": "Ship", "status_c": "To Do", "assignee_id_c": 7, "created_by_c": 3}),
        );

        let moved = service
            .update_status(&session(7, Role::Guest), id, TaskStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(moved.status, TaskStatus::InProgress);
        assert_eq!(moved.title, "Ship");

        let updates = store.calls_of(StoreOperation::Update);
        assert_eq!(updates.len(), 1);
        let stored = store.record("task_c", id).unwrap();
        assert_eq!(stored["status_c"], "In Progress");
        assert!(stored["updated_at_c"].is_string());
    }

    #[tokio::test]
    async fn test_non_owner_cannot_move_task() {
        let (store, service) = service();
        let id = store.seed("task_c", json!({"title_c": "Ship", "assignee_id_c": 7, "created_by_c": 3}));

        let err = service
            .update_status(&session(9, Role::TeamMember), id, TaskStatus::Done)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(AuthzError::NotOwner(_))));
        assert!(store.calls_of(StoreOperation::Update).is_empty());

        assert!(service
            .update_status(&session(9, Role::ProjectManager), id, TaskStatus::Done)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_missing_task_is_not_found() {
        let (_store, service) = service();
        let err = service
            .delete(&session(1, Role::Administrator), 404)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { id: 404, .. }));
    }

    #[tokio::test]
    async fn test_queries_by_project_and_assignee() {
        let (store, service) = service();
        store.seed("task_c", json!({"title_c": "A", "project_id_c": 1, "assignee_id_c": 7}));
        store.seed("task_c", json!({"title_c": "B", "project_id_c": {"Id": 2, "Name": "Web"}, "assignee_id_c": 7}));
        store.seed("task_c", json!({"title_c": "C", "project_id_c": 2}));

        assert_eq!(service.by_project(2).await.unwrap().len(), 2);
        assert_eq!(service.by_assignee(7).await.unwrap().len(), 2);
        assert_eq!(service.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_bulk_deletes_require_manager_role() {
        let (store, service) = service();
        let id = store.seed("task_c", json!({"title_c": "Mine", "assignee_id_c": 4}));

        let owner = session(4, Role::TeamMember);
        assert!(service.delete_selected(&owner, &[id]).await.unwrap_err().is_forbidden());
        assert!(service.delete_all(&owner).await.unwrap_err().is_forbidden());

        // Owners may still delete their own task individually
        service.delete(&owner, id).await.unwrap();
        assert!(store.records("task_c").is_empty());
    }
}
