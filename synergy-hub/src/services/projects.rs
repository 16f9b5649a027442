//! Project service
//!
//! Reads are open to every caller. Creating, editing and deleting projects
//! requires a project-management role.

use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

use synergy_shared::auth::authorization::{can_access_project, require_project_management};
use synergy_shared::auth::Session;
use synergy_shared::models::{CreateProject, Project, ProjectStatus, RecordId, UpdateProject};
use synergy_shared::store::{Condition, Query, RecordStore, SortDirection};

use crate::error::ServiceResult;
use crate::repository::{DeleteSummary, Repository};

#[derive(Clone)]
pub struct ProjectService {
    repo: Repository<Project>,
}

impl ProjectService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        ProjectService {
            repo: Repository::new(store),
        }
    }

    /// All projects, newest first
    pub async fn list(&self) -> ServiceResult<Vec<Project>> {
        self.repo
            .fetch_all_matching(Query::default().order_by("created_at_c", SortDirection::Descending))
            .await
    }

    pub async fn get(&self, id: RecordId) -> ServiceResult<Option<Project>> {
        self.repo.get(id).await
    }

    pub async fn by_status(&self, status: ProjectStatus) -> ServiceResult<Vec<Project>> {
        self.repo
            .fetch_all_matching(
                Query::default()
                    .filter(Condition::equal_to("status_c", status.as_str()))
                    .order_by("created_at_c", SortDirection::Descending),
            )
            .await
    }

    /// Projects the session may open
    pub async fn accessible(&self, session: &Session) -> ServiceResult<Vec<Project>> {
        let projects = self.list().await?;
        Ok(projects
            .into_iter()
            .filter(|p| can_access_project(session.role(), Some(p), session.user_id()))
            .collect())
    }

    /// Creates a project
    ///
    /// Progress always starts at 0. The creator defaults to the session user.
    pub async fn create(&self, session: &Session, mut payload: CreateProject) -> ServiceResult<Project> {
        require_project_management(session)?;

        payload.progress = 0;
        if payload.created_by.is_none() {
            payload.created_by = session.user_id();
        }
        payload.validate()?;

        let project = self.repo.create(&payload).await?;
        tracing::info!(project_id = project.id, name = %project.name, "Project created");
        Ok(project)
    }

    pub async fn update(&self, session: &Session, mut patch: UpdateProject) -> ServiceResult<Project> {
        require_project_management(session)?;

        patch.validate()?;
        patch.updated_at = Some(Utc::now());
        self.repo.update(&patch).await
    }

    pub async fn delete(&self, session: &Session, id: RecordId) -> ServiceResult<()> {
        require_project_management(session)?;
        self.repo.delete(id).await
    }

    pub async fn delete_selected(
        &self,
        session: &Session,
        ids: &[RecordId],
    ) -> ServiceResult<DeleteSummary> {
        require_project_management(session)?;
        Ok(self.repo.delete_selected(ids).await)
    }

    pub async fn delete_all(&self, session: &Session) -> ServiceResult<DeleteSummary> {
        require_project_management(session)?;
        self.repo.delete_all().await
    }

    /// Bulk create used by import reconciliation
    pub(crate) fn repository(&self) -> &Repository<Project> {
        &self.repo
    }
}
