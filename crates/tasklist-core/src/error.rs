//! Error types raised at the boundary of the board command API.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Form field a validation message is attached to.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Field {
  Title,
  DueDate
}

impl Field {
  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      | Self::Title => "title",
      | Self::DueDate => "due_date"
    }
  }
}

impl fmt::Display for Field {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A single rejected form field.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Error,
)]
pub enum ValidationError {
  /// Title missing or shorter than three characters after trimming.
  #[error(
    "title must contain at least 3 \
     characters"
  )]
  TitleTooShort,

  #[error("due date is required")]
  DueDateMissing,

  /// Due date is at or before the moment of submission.
  #[error("due date must be in the future")]
  DueDateNotFuture
}

/// Field-keyed set of validation failures for one submission.
///
/// An empty set means the submission may proceed.
#[derive(
  Debug, Clone, Default, PartialEq, Eq, Error,
)]
#[error("invalid task input: {}", describe(.errors))]
pub struct ValidationErrors {
  errors: BTreeMap<Field, ValidationError>
}

impl ValidationErrors {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Records `error` for `field`, replacing an earlier message for it.
  pub fn insert(
    &mut self,
    field: Field,
    error: ValidationError
  ) {
    self.errors.insert(field, error);
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.errors.is_empty()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.errors.len()
  }

  #[must_use]
  pub fn get(
    &self,
    field: Field
  ) -> Option<ValidationError> {
    self.errors.get(&field).copied()
  }

  pub fn iter(
    &self
  ) -> impl Iterator<Item = (Field, ValidationError)> + '_
  {
    self
      .errors
      .iter()
      .map(|(field, err)| (*field, *err))
  }

  /// `Ok(())` when nothing was recorded, otherwise `Err(self)`.
  pub fn into_result(
    self
  ) -> Result<(), Self> {
    if self.is_empty() {
      Ok(())
    } else {
      Err(self)
    }
  }
}

fn describe(
  errors: &BTreeMap<Field, ValidationError>
) -> String {
  errors
    .iter()
    .map(|(field, err)| {
      format!("{field}: {err}")
    })
    .collect::<Vec<_>>()
    .join("; ")
}

/// An unrecognised literal for one of the closed enumerations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} value: '{value}'")]
pub struct InvalidEnumValue {
  pub kind:  &'static str,
  pub value: String
}

impl InvalidEnumValue {
  pub fn new(
    kind: &'static str,
    value: impl Into<String>
  ) -> Self {
    Self {
      kind,
      value: value.into()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::{
    Field,
    InvalidEnumValue,
    ValidationError,
    ValidationErrors
  };

  #[test]
  fn empty_set_converts_to_ok() {
    assert!(
      ValidationErrors::new()
        .into_result()
        .is_ok()
    );
  }

  #[test]
  fn messages_are_keyed_by_field() {
    let mut errors =
      ValidationErrors::new();
    errors.insert(
      Field::DueDate,
      ValidationError::DueDateMissing
    );
    errors.insert(
      Field::Title,
      ValidationError::TitleTooShort
    );

    assert_eq!(errors.len(), 2);
    assert_eq!(
      errors.get(Field::Title),
      Some(ValidationError::TitleTooShort)
    );
    assert_eq!(
      errors.to_string(),
      "invalid task input: title: title \
       must contain at least 3 \
       characters; due_date: due date is \
       required"
    );
  }

  #[test]
  fn enum_error_names_kind_and_value() {
    let err = InvalidEnumValue::new(
      "priority", "urgent"
    );
    assert_eq!(
      err.to_string(),
      "invalid priority value: 'urgent'"
    );
  }
}
