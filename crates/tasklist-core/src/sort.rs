use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::InvalidEnumValue;
use crate::task::Task;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
  /// High before Medium before Low.
  Priority,
  /// Soonest due first.
  DueDate,
  /// Most recently created first.
  CreatedAt
}

impl SortKey {
  pub fn compare(
    self,
    a: &Task,
    b: &Task
  ) -> Ordering {
    match self {
      | Self::Priority => {
        b.priority
          .weight()
          .cmp(&a.priority.weight())
      }
      | Self::DueDate => {
        a.due_date.cmp(&b.due_date)
      }
      | Self::CreatedAt => {
        b.created_at.cmp(&a.created_at)
      }
    }
  }

  pub const fn as_str(
    self
  ) -> &'static str {
    match self {
      | Self::Priority => "priority",
      | Self::DueDate => "due",
      | Self::CreatedAt => "created"
    }
  }

  /// Parses a sort selection where `manual` means canonical order.
  pub fn parse_selection(
    raw: &str
  ) -> Result<Option<Self>, InvalidEnumValue>
  {
    let trimmed = raw.trim();
    if trimmed
      .eq_ignore_ascii_case("manual")
      || trimmed
        .eq_ignore_ascii_case("none")
    {
      return Ok(None);
    }
    trimmed.parse().map(Some)
  }
}

impl fmt::Display for SortKey {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for SortKey {
  type Err = InvalidEnumValue;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "priority" | "pri" => {
        Ok(Self::Priority)
      }
      | "due" | "duedate"
      | "due_date" => Ok(Self::DueDate),
      | "created" | "createdat"
      | "created_at" => {
        Ok(Self::CreatedAt)
      }
      | _ => {
        Err(InvalidEnumValue::new(
          "sort key", s
        ))
      }
    }
  }
}

/// Stable sort: ties keep their incoming order.
pub fn sort_tasks(
  tasks: &mut [&Task],
  key: SortKey
) {
  tasks.sort_by(|a, b| key.compare(a, b));
}
