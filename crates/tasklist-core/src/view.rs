//! The projection of the store that is actually shown to the user.

use tracing::debug;

use crate::filter::FilterCriteria;
use crate::sort::{
  SortKey,
  sort_tasks
};
use crate::task::{
  Task,
  TaskId
};

/// Filters `tasks` with `criteria`, then orders the survivors by `sort`.
///
/// With no sort key the canonical store order is kept. Pure: the same
/// inputs always give the same output.
#[tracing::instrument(skip(tasks), fields(total = tasks.len()))]
pub fn project<'a>(
  tasks: &'a [Task],
  criteria: &FilterCriteria,
  sort: Option<SortKey>
) -> Vec<&'a Task> {
  let mut visible: Vec<&Task> = tasks
    .iter()
    .filter(|task| criteria.matches(task))
    .collect();

  if let Some(key) = sort {
    sort_tasks(&mut visible, key);
  }

  debug!(
    visible = visible.len(),
    "projected view"
  );
  visible
}

pub fn projected_ids(
  tasks: &[Task],
  criteria: &FilterCriteria,
  sort: Option<SortKey>
) -> Vec<TaskId> {
  project(tasks, criteria, sort)
    .into_iter()
    .map(|task| task.id)
    .collect()
}
