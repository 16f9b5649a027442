//! User service
//!
//! Every write requires the user-management role.

use std::sync::Arc;
use validator::Validate;

use synergy_shared::auth::authorization::require_user_management;
use synergy_shared::auth::Session;
use synergy_shared::models::{CreateUser, RecordId, Role, UpdateUser, User};
use synergy_shared::store::{Query, RecordStore, SortDirection};

use crate::error::ServiceResult;
use crate::repository::{DeleteSummary, Repository};

#[derive(Clone)]
pub struct UserService {
    repo: Repository<User>,
}

impl UserService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        UserService {
            repo: Repository::new(store),
        }
    }

    /// All users, by name
    pub async fn list(&self) -> ServiceResult<Vec<User>> {
        self.repo
            .fetch_all_matching(Query::default().order_by("name_c", SortDirection::Ascending))
            .await
    }

    pub async fn get(&self, id: RecordId) -> ServiceResult<Option<User>> {
        self.repo.get(id).await
    }

    /// Case-insensitive search on name, email and department
    ///
    /// A blank query returns every user.
    pub async fn search(&self, query: &str) -> ServiceResult<Vec<User>> {
        let users = self.list().await?;
        let query = query.trim();
        if query.is_empty() {
            return Ok(users);
        }
        Ok(users.into_iter().filter(|u| u.matches_query(query)).collect())
    }

    pub async fn create(&self, session: &Session, payload: CreateUser) -> ServiceResult<User> {
        require_user_management(session)?;
        payload.validate()?;

        let user = self.repo.create(&payload).await?;
        tracing::info!(user_id = user.id, role = ?user.role, "User created");
        Ok(user)
    }

    pub async fn update(&self, session: &Session, patch: UpdateUser) -> ServiceResult<User> {
        require_user_management(session)?;
        patch.validate()?;
        self.repo.update(&patch).await
    }

    /// Changes a stored user's role
    pub async fn update_role(&self, session: &Session, id: RecordId, role: Role) -> ServiceResult<User> {
        let mut patch = UpdateUser::for_user(id);
        patch.role = Some(role);
        self.update(session, patch).await
    }

    pub async fn delete(&self, session: &Session, id: RecordId) -> ServiceResult<()> {
        require_user_management(session)?;
        self.repo.delete(id).await
    }

    pub async fn delete_selected(
        &self,
        session: &Session,
        ids: &[RecordId],
    ) -> ServiceResult<DeleteSummary> {
        require_user_management(session)?;
        Ok(self.repo.delete_selected(ids).await)
    }

    pub async fn delete_all(&self, session: &Session) -> ServiceResult<DeleteSummary> {
        require_user_management(session)?;
        self.repo.delete_all().await
    }
}
