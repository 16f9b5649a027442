//! Kanban task board
//!
//! Groups tasks into one column per status, in lifecycle order, optionally
//! restricted to a single project. The board never edits its own copy of a
//! task: every change goes to the store first, and the board reloads only
//! after the store accepted it. A failed move leaves the board as it was.
//!
//! # Example
//!
//! ```ignore
//! let mut board = TaskBoard::new(services.tasks.clone()).for_project(3);
//! board.load().await?;
//! board.move_task(&session, 12, TaskStatus::Review).await?;
//! for column in board.columns() {
//!     println!("{}: {}", column.status, column.tasks.len());
//! }
//! ```

use std::collections::BTreeSet;

use synergy_shared::auth::Session;
use synergy_shared::models::{Entity, RecordId, Task, TaskStatus};

use crate::error::{ServiceError, ServiceResult};
use crate::repository::DeleteSummary;
use crate::services::TaskService;

/// One status column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub status: TaskStatus,
    pub tasks: Vec<Task>,
}

/// Result of a board move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Task already had the target status; nothing was sent
    Unchanged,
    Moved,
}

pub struct TaskBoard {
    tasks: TaskService,
    project_id: Option<RecordId>,
    columns: Vec<Column>,
    selected: BTreeSet<RecordId>,
}

impl TaskBoard {
    pub fn new(tasks: TaskService) -> Self {
        TaskBoard {
            tasks,
            project_id: None,
            columns: group_by_status(Vec::new()),
            selected: BTreeSet::new(),
        }
    }

    /// Restricts the board to one project's tasks
    pub fn for_project(mut self, project_id: RecordId) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn project_id(&self) -> Option<RecordId> {
        self.project_id
    }

    /// Reloads every column from the store
    pub async fn load(&mut self) -> ServiceResult<()> {
        let tasks = match self.project_id {
            Some(project_id) => self.tasks.by_project(project_id).await?,
            None => self.tasks.list().await?,
        };

        tracing::debug!(project_id = ?self.project_id, count = tasks.len(), "Board loaded");
        self.selected.retain(|id| tasks.iter().any(|t| t.id == *id));
        self.columns = group_by_status(tasks);
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, status: TaskStatus) -> &[Task] {
        self.columns
            .iter()
            .find(|c| c.status == status)
            .map(|c| c.tasks.as_slice())
            .unwrap_or_default()
    }

    pub fn task_count(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }

    pub fn find(&self, id: RecordId) -> Option<&Task> {
        self.columns
            .iter()
            .flat_map(|c| c.tasks.iter())
            .find(|t| t.id() == id)
    }

    /// Drops a task into the `status` column
    ///
    /// A drop on the task's current column sends nothing. Otherwise the
    /// status change is persisted and the board reloaded.
    pub async fn move_task(
        &mut self,
        session: &Session,
        id: RecordId,
        status: TaskStatus,
    ) -> ServiceResult<MoveOutcome> {
        let current = self
            .find(id)
            .map(|t| t.status)
            .ok_or_else(|| ServiceError::not_found(Task::COLLECTION, id))?;

        if current == status {
            return Ok(MoveOutcome::Unchanged);
        }

        self.tasks.update_status(session, id, status).await?;
        self.load().await?;
        Ok(MoveOutcome::Moved)
    }

    /// Toggles a task in the selection; returns whether it is now selected
    pub fn toggle_selected(&mut self, id: RecordId) -> bool {
        if self.selected.remove(&id) {
            false
        } else if self.find(id).is_some() {
            self.selected.insert(id)
        } else {
            false
        }
    }

    pub fn select_all(&mut self) {
        self.selected = self
            .columns
            .iter()
            .flat_map(|c| c.tasks.iter().map(|t| t.id))
            .collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn selected(&self) -> Vec<RecordId> {
        self.selected.iter().copied().collect()
    }

    /// Deletes the selected tasks one by one, then reloads
    ///
    /// Tasks the store refused to delete stay selected.
    pub async fn delete_selected(&mut self, session: &Session) -> ServiceResult<DeleteSummary> {
        let ids = self.selected();
        let summary = self.tasks.delete_selected(session, &ids).await?;

        self.selected = summary.failed.iter().map(|(id, _)| *id).collect();

        self.load().await?;
        Ok(summary)
    }

    /// Deletes every task in the collection, then reloads
    pub async fn delete_all(&mut self, session: &Session) -> ServiceResult<DeleteSummary> {
        let summary = self.tasks.delete_all(session).await?;

        self.selected.clear();
        self.load().await?;
        Ok(summary)
    }
}

/// Splits tasks into the four status columns, keeping their order
pub fn group_by_status(tasks: Vec<Task>) -> Vec<Column> {
    let mut columns: Vec<Column> = TaskStatus::ALL
        .iter()
        .map(|&status| Column {
            status,
            tasks: Vec::new(),
        })
        .collect();

    for task in tasks {
        if let Some(column) = columns.iter_mut().find(|c| c.status == task.status) {
            column.tasks.push(task);
        }
    }

    columns
}
