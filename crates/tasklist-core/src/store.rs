use serde::Serialize;
use tracing::{debug, info};

use crate::task::{Task, TaskId};

/// Completion counts for the header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub completed: usize,
    pub total: usize,
}

/// Canonical, order-bearing collection of every task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// New tasks go to the top of the list.
    #[tracing::instrument(skip(self, task), fields(id = %task.id))]
    pub fn insert_front(&mut self, task: Task) -> &Task {
        self.tasks.insert(0, task);
        debug!(count = self.tasks.len(), "task inserted");
        &self.tasks[0]
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    #[tracing::instrument(skip(self))]
    pub fn remove(&mut self, id: TaskId) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        let removed = self.tasks.remove(idx);
        info!(remaining = self.tasks.len(), "task removed");
        Some(removed)
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub(crate) fn tasks_mut(&mut self) -> &mut Vec<Task> {
        &mut self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn stats(&self) -> Stats {
        Stats {
            completed: self.tasks.iter().filter(|t| t.completed).count(),
            total: self.tasks.len(),
        }
    }
}

impl FromIterator<Task> for TaskStore {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Self {
            tasks: iter.into_iter().collect(),
        }
    }
}
