//! Entity services
//!
//! One service per collection, each wrapping a [`Repository`] and applying
//! the permission rules for its entity. Every write takes the caller's
//! [`Session`](synergy_shared::auth::Session) explicitly.
//!
//! [`Repository`]: crate::repository::Repository

pub mod activities;
pub mod projects;
pub mod resources;
pub mod tasks;
pub mod users;

use std::sync::Arc;

use synergy_shared::store::RecordStore;

pub use activities::ActivityService;
pub use projects::ProjectService;
pub use resources::ResourceService;
pub use tasks::TaskService;
pub use users::UserService;

/// Every entity service over one shared record store
#[derive(Clone)]
pub struct Services {
    pub projects: ProjectService,
    pub tasks: TaskService,
    pub users: UserService,
    pub resources: ResourceService,
    pub activities: ActivityService,
}

impl Services {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Services {
            projects: ProjectService::new(Arc::clone(&store)),
            tasks: TaskService::new(Arc::clone(&store)),
            users: UserService::new(Arc::clone(&store)),
            resources: ResourceService::new(Arc::clone(&store)),
            activities: ActivityService::new(store),
        }
    }
}
