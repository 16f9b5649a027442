//! Activity log service
//!
//! The log is append-only: entries are recorded and listed, never edited or
//! removed. Listings are newest first.

use std::sync::Arc;

use synergy_shared::auth::authorization::require_signed_in;
use synergy_shared::auth::Session;
use synergy_shared::models::{Activity, NewActivity, RecordId};
use synergy_shared::store::{Condition, Query, RecordStore, SortDirection};

use crate::error::ServiceResult;
use crate::repository::Repository;

/// Entries returned by [`ActivityService::recent`] when no limit is given
pub const DEFAULT_RECENT_LIMIT: usize = 10;

#[derive(Clone)]
pub struct ActivityService {
    repo: Repository<Activity>,
}

impl ActivityService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        ActivityService {
            repo: Repository::new(store),
        }
    }

    fn newest_first() -> Query {
        Query::default().order_by("created_at_c", SortDirection::Descending)
    }

    pub async fn list(&self) -> ServiceResult<Vec<Activity>> {
        self.repo.fetch_all_matching(Self::newest_first()).await
    }

    /// The latest `limit` entries (10 when `None`)
    pub async fn recent(&self, limit: Option<usize>) -> ServiceResult<Vec<Activity>> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let limit = u32::try_from(limit).unwrap_or(u32::MAX);
        self.repo.fetch(Self::newest_first().page(limit, 0)).await
    }

    pub async fn by_user(&self, user_id: RecordId) -> ServiceResult<Vec<Activity>> {
        self.repo
            .fetch_all_matching(Self::newest_first().filter(Condition::equal_to("user_id_c", user_id)))
            .await
    }

    /// Appends an entry; the actor defaults to the session user
    pub async fn record(&self, session: &Session, mut entry: NewActivity) -> ServiceResult<Activity> {
        let user = require_signed_in(session)?;
        if entry.user_id.is_none() {
            entry.user_id = Some(user.id);
        }

        let activity = self.repo.create(&entry).await?;
        tracing::debug!(activity_id = activity.id, kind = %activity.kind, "Activity recorded");
        Ok(activity)
    }
}
