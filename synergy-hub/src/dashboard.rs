//! Dashboard summary for the signed-in user

use serde::Serialize;

use synergy_shared::auth::Session;
use synergy_shared::models::{Activity, Project, ProjectStatus, Task};

use crate::error::ServiceResult;
use crate::services::Services;

/// Active projects shown on the dashboard
pub const FEATURED_PROJECTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_projects: usize,
    pub active_projects: usize,

    /// Tasks assigned to the session user
    pub my_tasks: usize,
    pub my_completed_tasks: usize,

    pub featured_projects: Vec<Project>,
    pub recent_activity: Vec<Activity>,
}

impl DashboardSummary {
    /// Builds the summary from already-loaded records
    pub fn from_records(
        session: &Session,
        projects: Vec<Project>,
        tasks: &[Task],
        recent_activity: Vec<Activity>,
    ) -> Self {
        let total_projects = projects.len();
        let active: Vec<Project> = projects
            .into_iter()
            .filter(|p| p.status == ProjectStatus::Active)
            .collect();

        let mine: Vec<&Task> = match session.user_id() {
            Some(user_id) => tasks.iter().filter(|t| t.assignee_id == Some(user_id)).collect(),
            None => Vec::new(),
        };

        DashboardSummary {
            total_projects,
            active_projects: active.len(),
            my_tasks: mine.len(),
            my_completed_tasks: mine.iter().filter(|t| t.status.is_done()).count(),
            featured_projects: active.into_iter().take(FEATURED_PROJECTS).collect(),
            recent_activity,
        }
    }

    /// Loads projects, tasks and the activity feed concurrently
    pub async fn load(
        services: &Services,
        session: &Session,
        activity_limit: usize,
    ) -> ServiceResult<Self> {
        let (projects, tasks, activity) = tokio::try_join!(
            services.projects.list(),
            services.tasks.list(),
            services.activities.recent(Some(activity_limit)),
        )?;

        let summary = Self::from_records(session, projects, &tasks, activity);
        tracing::debug!(
            total_projects = summary.total_projects,
            my_tasks = summary.my_tasks,
            "Dashboard loaded"
        );
        Ok(summary)
    }
}
