//! Company resource service

use std::sync::Arc;
use validator::Validate;

use synergy_shared::auth::authorization::require_resource_upload;
use synergy_shared::auth::Session;
use synergy_shared::models::{CompanyResource, CreateResource, RecordId, ResourceCategory};
use synergy_shared::store::{Condition, Query, RecordStore, SortDirection};

use crate::error::ServiceResult;
use crate::repository::Repository;

#[derive(Clone)]
pub struct ResourceService {
    repo: Repository<CompanyResource>,
}

impl ResourceService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        ResourceService {
            repo: Repository::new(store),
        }
    }

    fn newest_first() -> Query {
        Query::default().order_by("created_at_c", SortDirection::Descending)
    }

    pub async fn list(&self) -> ServiceResult<Vec<CompanyResource>> {
        self.repo.fetch_all_matching(Self::newest_first()).await
    }

    pub async fn get(&self, id: RecordId) -> ServiceResult<Option<CompanyResource>> {
        self.repo.get(id).await
    }

    pub async fn by_category(&self, category: ResourceCategory) -> ServiceResult<Vec<CompanyResource>> {
        self.repo
            .fetch_all_matching(Self::newest_first().filter(Condition::equal_to("category_c", category.as_str())))
            .await
    }

    /// Title/description search, optionally within one category
    pub async fn search(
        &self,
        query: &str,
        category: Option<ResourceCategory>,
    ) -> ServiceResult<Vec<CompanyResource>> {
        let resources = match category {
            Some(category) => self.by_category(category).await?,
            None => self.list().await?,
        };

        let query = query.trim();
        Ok(resources
            .into_iter()
            .filter(|r| query.is_empty() || r.matches_query(query))
            .collect())
    }

    /// Uploads a resource; the uploader defaults to the session user
    pub async fn create(&self, session: &Session, mut payload: CreateResource) -> ServiceResult<CompanyResource> {
        require_resource_upload(session)?;

        if payload.uploaded_by.is_none() {
            payload.uploaded_by = session.user_id();
        }
        payload.validate()?;

        let resource = self.repo.create(&payload).await?;
        tracing::info!(resource_id = resource.id, category = %resource.category, "Resource uploaded");
        Ok(resource)
    }

    pub async fn delete(&self, session: &Session, id: RecordId) -> ServiceResult<()> {
        require_resource_upload(session)?;
        self.repo.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use synergy_shared::auth::CurrentUser;
    use synergy_shared::models::Role;
    use synergy_shared::store::MemoryStore;

    fn service() -> (Arc<MemoryStore>, ResourceService) {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            "company_resource_c",
            json!({"title_c": "Leave Policy", "category_c": "Policies", "description_c": "Annual leave rules"}),
        );
        store.seed(
            "company_resource_c",
            json!({"title_c": "Brand Book", "category_c": "Branding"}),
        );
        (store.clone(), ResourceService::new(store))
    }

    #[tokio::test]
    async fn test_category_and_search() {
        let (_store, service) = service();
        assert_eq!(service.by_category(ResourceCategory::Policies).await.unwrap().len(), 1);
        assert_eq!(service.search("annual", None).await.unwrap().len(), 1);
        assert!(service
            .search("brand", Some(ResourceCategory::Policies))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(service.search("", None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_upload_permissions() {
        let (store, service) = service();
        let pm = Session::signed_in(CurrentUser::new(3, "Pat", Role::ProjectManager));
        let err = service
            .create(&pm, CreateResource::new("Template", ResourceCategory::Templates))
            .await
            .unwrap_err();
        assert!(err.is_forbidden());

        let hr = Session::signed_in(CurrentUser::new(2, "Hana", Role::HrAdmin));
        let created = service
            .create(&hr, CreateResource::new("Template", ResourceCategory::Templates))
            .await
            .unwrap();
        assert_eq!(created.uploaded_by, Some(2));
        assert_eq!(created.file_type.as_deref(), Some("PDF"));

        service.delete(&hr, created.id).await.unwrap();
        assert_eq!(store.records("company_resource_c").len(), 2);
    }
}
