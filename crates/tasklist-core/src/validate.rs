//! Checks form input before anything reaches the store.

use chrono::{
  DateTime,
  Utc
};
use tracing::debug;

use crate::error::{
  Field,
  ValidationError,
  ValidationErrors
};
use crate::task::{
  Category,
  Priority
};

pub const MIN_TITLE_CHARS: usize = 3;

/// Raw task form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskInput {
  pub title:       String,
  pub description: Option<String>,
  pub category:    Category,
  pub priority:    Priority,
  pub due_date:    Option<DateTime<Utc>>
}

/// Input that passed validation, with text already trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTask {
  pub title:       String,
  pub description: Option<String>,
  pub category:    Category,
  pub priority:    Priority,
  pub due_date:    DateTime<Utc>
}

/// Partial edit of an existing task. `None` leaves a field as it is;
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
  pub title:       Option<String>,
  pub description: Option<Option<String>>,
  pub category:    Option<Category>,
  pub priority:    Option<Priority>,
  pub due_date:    Option<DateTime<Utc>>
}

impl TaskPatch {
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.description.is_none()
      && self.category.is_none()
      && self.priority.is_none()
      && self.due_date.is_none()
  }
}

#[tracing::instrument(skip(input), fields(title = %input.title))]
pub fn validate_input(
  input: &TaskInput,
  now: DateTime<Utc>
) -> Result<ValidTask, ValidationErrors> {
  let mut errors = ValidationErrors::new();

  if let Err(err) = check_title(&input.title)
  {
    errors.insert(Field::Title, err);
  }

  let due_date = match input.due_date {
    | None => {
      errors.insert(
        Field::DueDate,
        ValidationError::DueDateMissing
      );
      None
    }
    | Some(due) => {
      match check_due(due, now) {
        | Ok(()) => Some(due),
        | Err(err) => {
          errors
            .insert(Field::DueDate, err);
          None
        }
      }
    }
  };

  let (Some(due_date), true) =
    (due_date, errors.is_empty())
  else {
    debug!(
      rejected = errors.len(),
      "task input rejected"
    );
    return Err(errors);
  };

  Ok(ValidTask {
    title: input.title.trim().to_string(),
    description: clean_description(
      input.description.as_deref()
    ),
    category: input.category,
    priority: input.priority,
    due_date
  })
}

/// Validates only the fields the patch supplies.
#[tracing::instrument(skip(patch))]
pub fn validate_patch(
  patch: &TaskPatch,
  now: DateTime<Utc>
) -> Result<(), ValidationErrors> {
  let mut errors = ValidationErrors::new();

  if let Some(title) = &patch.title
    && let Err(err) = check_title(title)
  {
    errors.insert(Field::Title, err);
  }

  if let Some(due) = patch.due_date
    && let Err(err) = check_due(due, now)
  {
    errors.insert(Field::DueDate, err);
  }

  errors.into_result()
}

pub fn clean_description(
  raw: Option<&str>
) -> Option<String> {
  raw
    .map(str::trim)
    .filter(|d| !d.is_empty())
    .map(str::to_string)
}

fn check_title(
  title: &str
) -> Result<(), ValidationError> {
  if title.trim().chars().count()
    < MIN_TITLE_CHARS
  {
    Err(ValidationError::TitleTooShort)
  } else {
    Ok(())
  }
}

fn check_due(
  due: DateTime<Utc>,
  now: DateTime<Utc>
) -> Result<(), ValidationError> {
  if due <= now {
    Err(ValidationError::DueDateNotFuture)
  } else {
    Ok(())
  }
}
