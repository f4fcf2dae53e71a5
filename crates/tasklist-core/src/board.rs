//! The command surface consumed by the front end.
//!
//! A [`Board`] owns the canonical store together with the active filter and
//! sort selection. Every mutation goes through one of its methods; the view
//! is always recomputed from scratch by [`Board::projected_view`].

use chrono::{
  DateTime,
  Utc
};
use tracing::{
  debug,
  info,
  warn
};

use crate::error::ValidationErrors;
use crate::filter::FilterCriteria;
use crate::reorder::{
  ReorderOutcome,
  reconcile
};
use crate::sort::SortKey;
use crate::store::{
  Stats,
  TaskStore
};
use crate::task::{
  Task,
  TaskId
};
use crate::validate::{
  TaskInput,
  TaskPatch,
  clean_description,
  validate_input,
  validate_patch
};
use crate::view::{
  project,
  projected_ids
};

#[derive(Debug, Clone, Default)]
pub struct Board {
  store:   TaskStore,
  filters: FilterCriteria,
  sort:    Option<SortKey>
}

impl Board {
  pub fn new(
    sort: Option<SortKey>
  ) -> Self {
    Self {
      store: TaskStore::new(),
      filters: FilterCriteria::default(),
      sort
    }
  }

  /// Starts from an existing canonical order.
  pub fn with_store(
    store: TaskStore,
    sort: Option<SortKey>
  ) -> Self {
    Self {
      store,
      filters: FilterCriteria::default(),
      sort
    }
  }

  pub fn store(&self) -> &TaskStore {
    &self.store
  }

  pub fn filters(
    &self
  ) -> &FilterCriteria {
    &self.filters
  }

  pub fn sort_key(
    &self
  ) -> Option<SortKey> {
    self.sort
  }

  pub fn stats(&self) -> Stats {
    self.store.stats()
  }

  #[tracing::instrument(skip(self, input, now))]
  pub fn create_task(
    &mut self,
    input: TaskInput,
    now: DateTime<Utc>
  ) -> Result<&Task, ValidationErrors> {
    let valid = validate_input(&input, now)?;
    let task = Task::new(
      valid.title,
      valid.description,
      valid.category,
      valid.priority,
      valid.due_date,
      now
    );
    info!(
      id = %task.id,
      title = %task.title,
      "task created"
    );
    Ok(self.store.insert_front(task))
  }

  /// Applies `patch` to the task with `id`.
  ///
  /// Returns `Ok(false)` when no such task exists, whatever the patch holds.
  /// A rejected patch leaves the task untouched.
  #[tracing::instrument(skip(self, patch, now))]
  pub fn update_task(
    &mut self,
    id: TaskId,
    patch: TaskPatch,
    now: DateTime<Utc>
  ) -> Result<bool, ValidationErrors> {
    let Some(task) = self.store.get_mut(id)
    else {
      warn!("update for unknown task ignored");
      return Ok(false);
    };

    validate_patch(&patch, now)?;

    if let Some(title) = patch.title {
      task.title = title.trim().to_string();
    }
    if let Some(description) =
      patch.description
    {
      task.description = clean_description(
        description.as_deref()
      );
    }
    if let Some(category) = patch.category
    {
      task.category = category;
    }
    if let Some(priority) = patch.priority
    {
      task.priority = priority;
    }
    if let Some(due) = patch.due_date {
      task.due_date = due;
    }

    info!("task updated");
    Ok(true)
  }

  #[tracing::instrument(skip(self))]
  pub fn delete_task(
    &mut self,
    id: TaskId
  ) -> bool {
    let removed =
      self.store.remove(id).is_some();
    if !removed {
      warn!("delete for unknown task ignored");
    }
    removed
  }

  #[tracing::instrument(skip(self))]
  pub fn toggle_completed(
    &mut self,
    id: TaskId
  ) -> bool {
    let Some(task) = self.store.get_mut(id)
    else {
      warn!("toggle for unknown task ignored");
      return false;
    };
    task.completed = !task.completed;
    debug!(
      completed = task.completed,
      "completion toggled"
    );
    true
  }

  #[tracing::instrument(skip(self))]
  pub fn set_filters(
    &mut self,
    criteria: FilterCriteria
  ) {
    self.filters = criteria;
  }

  #[tracing::instrument(skip(self))]
  pub fn set_sort_key(
    &mut self,
    key: Option<SortKey>
  ) {
    self.sort = key;
  }

  /// Moves the task shown at `source` to `destination`, both positions in
  /// the current projection.
  ///
  /// A successful move switches the board to manual order so the task stays
  /// where it was dropped; choosing a sort key again supersedes it.
  #[tracing::instrument(skip(self))]
  pub fn reorder(
    &mut self,
    source: usize,
    destination: Option<usize>
  ) -> ReorderOutcome {
    let ids = projected_ids(
      self.store.as_slice(),
      &self.filters,
      self.sort
    );
    let outcome = reconcile(
      self.store.tasks_mut(),
      &ids,
      source,
      destination
    );

    if outcome.is_applied() {
      if let Some(previous) = self.sort {
        info!(
          sort = %previous,
          "manual reorder overrides sort key"
        );
      }
      self.sort = None;
    }
    outcome
  }

  pub fn projected_view(
    &self
  ) -> Vec<&Task> {
    project(
      self.store.as_slice(),
      &self.filters,
      self.sort
    )
  }

  /// Resolves a zero-based position in the current view to a task id.
  pub fn task_at(
    &self,
    position: usize
  ) -> Option<TaskId> {
    self
      .projected_view()
      .get(position)
      .map(|task| task.id)
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    DateTime,
    Duration,
    TimeZone,
    Utc
  };

  use super::Board;
  use crate::error::{
    Field,
    ValidationError
  };
  use crate::filter::FilterCriteria;
  use crate::reorder::ReorderOutcome;
  use crate::sort::SortKey;
  use crate::store::TaskStore;
  use crate::task::{
    Category,
    Priority,
    Task,
    TaskId
  };
  use crate::validate::{
    TaskInput,
    TaskPatch
  };

  fn now() -> DateTime<Utc> {
    Utc
      .with_ymd_and_hms(
        2026, 10, 18, 9, 0, 0
      )
      .unwrap()
  }

  fn task(
    title: &str,
    category: Category,
    priority: Priority,
    due_days: i64
  ) -> Task {
    Task::new(
      title.to_string(),
      None,
      category,
      priority,
      now() + Duration::days(due_days),
      now()
    )
  }

  fn scenario_board() -> Board {
    let store: TaskStore = vec![
      task(
        "A",
        Category::Personal,
        Priority::High,
        3
      ),
      task(
        "B",
        Category::Personal,
        Priority::Low,
        1
      ),
      task(
        "C",
        Category::Professional,
        Priority::Medium,
        2
      ),
    ]
    .into_iter()
    .collect();
    Board::with_store(store, None)
  }

  fn view_titles(board: &Board) -> Vec<String> {
    board
      .projected_view()
      .iter()
      .map(|t| t.title.clone())
      .collect()
  }

  fn store_titles(
    board: &Board
  ) -> Vec<String> {
    board
      .store()
      .as_slice()
      .iter()
      .map(|t| t.title.clone())
      .collect()
  }

  #[test]
  fn created_task_is_pending_and_first() {
    let mut board = scenario_board();
    let created = board
      .create_task(
        TaskInput {
          title: "  Buy milk ".to_string(),
          due_date: Some(
            now() + Duration::hours(3)
          ),
          ..TaskInput::default()
        },
        now()
      )
      .unwrap()
      .clone();

    assert_eq!(created.title, "Buy milk");
    assert!(!created.completed);
    assert_eq!(created.created_at, now());
    assert_eq!(created.priority, Priority::Medium);
    assert_eq!(
      board.store().as_slice()[0].id,
      created.id
    );
  }

  #[test]
  fn rejected_input_creates_nothing() {
    let mut board = scenario_board();
    let errors = board
      .create_task(
        TaskInput {
          title: "ab".to_string(),
          due_date: Some(now()),
          ..TaskInput::default()
        },
        now()
      )
      .unwrap_err();

    assert_eq!(errors.len(), 2);
    assert_eq!(board.store().len(), 3);
  }

  #[test]
  fn drag_among_filtered_tasks() {
    let mut board = scenario_board();
    board.set_filters(FilterCriteria::new(
      None,
      Some(Category::Personal),
      None
    ));
    assert_eq!(
      view_titles(&board),
      vec!["A", "B"]
    );

    let outcome = board.reorder(1, Some(0));

    assert!(outcome.is_applied());
    assert_eq!(
      view_titles(&board),
      vec!["B", "A"]
    );
    assert_eq!(
      store_titles(&board),
      vec!["B", "A", "C"]
    );
  }

  #[test]
  fn cancelled_drag_is_a_no_op() {
    let mut board = scenario_board();
    board.set_sort_key(Some(SortKey::DueDate));
    let before = board.store().clone();

    let outcome = board.reorder(0, None);

    assert_eq!(
      outcome,
      ReorderOutcome::Cancelled
    );
    assert_eq!(board.store(), &before);
    assert_eq!(
      board.sort_key(),
      Some(SortKey::DueDate)
    );
  }

  #[test]
  fn drag_under_sort_switches_to_manual() {
    let mut board = scenario_board();
    board
      .set_sort_key(Some(SortKey::Priority));
    assert_eq!(
      view_titles(&board),
      vec!["A", "C", "B"]
    );

    board.reorder(0, Some(2));

    assert_eq!(board.sort_key(), None);
    assert_eq!(
      view_titles(&board),
      vec!["C", "B", "A"]
    );

    board
      .set_sort_key(Some(SortKey::Priority));
    assert_eq!(
      view_titles(&board),
      vec!["A", "C", "B"]
    );
  }

  #[test]
  fn moved_task_lands_at_destination() {
    for source in 0..3 {
      for destination in 0..3 {
        let mut board = scenario_board();
        board.set_filters(
          FilterCriteria::new(
            Some("".to_string()),
            None,
            None
          )
        );
        let moved =
          board.task_at(source).unwrap();

        board
          .reorder(source, Some(destination));

        assert_eq!(
          board.task_at(destination),
          Some(moved)
        );
      }
    }
  }

  #[test]
  fn set_filters_is_idempotent() {
    let mut board = scenario_board();
    let criteria = FilterCriteria::new(
      Some("a".to_string()),
      None,
      None
    );

    board.set_filters(criteria.clone());
    let first: Vec<Task> = board
      .projected_view()
      .into_iter()
      .cloned()
      .collect();
    board.set_filters(criteria);
    let second: Vec<Task> = board
      .projected_view()
      .into_iter()
      .cloned()
      .collect();

    assert_eq!(first, second);
  }

  #[test]
  fn invalid_patch_leaves_task_untouched() {
    let mut board = scenario_board();
    let id = board.task_at(0).unwrap();
    let before =
      board.store().get(id).cloned();

    let errors = board
      .update_task(
        id,
        TaskPatch {
          title: Some("x".to_string()),
          priority: Some(Priority::Low),
          ..TaskPatch::default()
        },
        now()
      )
      .unwrap_err();

    assert_eq!(
      errors.get(Field::Title),
      Some(ValidationError::TitleTooShort)
    );
    assert_eq!(
      board.store().get(id).cloned(),
      before
    );
  }

  #[test]
  fn patch_edits_and_clears_fields() {
    let mut board = scenario_board();
    let id = board.task_at(2).unwrap();

    let updated = board
      .update_task(
        id,
        TaskPatch {
          title: Some(" Call the bank ".to_string()),
          description: Some(None),
          category: Some(Category::Other),
          ..TaskPatch::default()
        },
        now()
      )
      .unwrap();

    assert!(updated);
    let task = board.store().get(id).unwrap();
    assert_eq!(task.title, "Call the bank");
    assert_eq!(task.category, Category::Other);
    assert_eq!(task.description, None);
  }

  #[test]
  fn unknown_id_update_is_a_no_op() {
    let mut board = scenario_board();
    let before = board.store().clone();
    let unknown = TaskId::new();

    let invalid = TaskPatch {
      title: Some("x".to_string()),
      ..TaskPatch::default()
    };
    assert_eq!(
      board.update_task(unknown, invalid, now()),
      Ok(false)
    );

    let valid = TaskPatch {
      priority: Some(Priority::Low),
      ..TaskPatch::default()
    };
    assert_eq!(
      board.update_task(unknown, valid, now()),
      Ok(false)
    );
    assert_eq!(board.store(), &before);
  }

  #[test]
  fn toggle_and_delete() {
    let mut board = scenario_board();
    let id = board.task_at(1).unwrap();

    assert!(board.toggle_completed(id));
    assert_eq!(board.stats().completed, 1);
    assert!(board.toggle_completed(id));
    assert_eq!(board.stats().completed, 0);

    assert!(board.delete_task(id));
    assert!(!board.delete_task(id));
    assert!(!board.toggle_completed(id));
    assert_eq!(board.stats().total, 2);
  }
}
