use serde::Serialize;
use tracing::trace;

use crate::error::InvalidEnumValue;
use crate::task::{
  Category,
  Priority,
  Task
};

/// User-selected constraints on the visible tasks.
///
/// Every field is optional and an absent field places no constraint, so
/// `FilterCriteria::default()` matches every task.
#[derive(
  Debug,
  Clone,
  Default,
  PartialEq,
  Eq,
  Serialize,
)]
pub struct FilterCriteria {
  pub search:   Option<String>,
  pub category: Option<Category>,
  pub priority: Option<Priority>
}

impl FilterCriteria {
  /// Builds criteria, dropping an empty or blank search string.
  pub fn new(
    search: Option<String>,
    category: Option<Category>,
    priority: Option<Priority>
  ) -> Self {
    Self {
      search: normalize_search(search),
      category,
      priority
    }
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.search.is_none()
      && self.category.is_none()
      && self.priority.is_none()
  }

  /// Parses session terms such as `cat:pro`, `priority:high` or
  /// `search:groceries`. Bare words are joined into the search text.
  #[tracing::instrument]
  pub fn parse(
    terms: &[String]
  ) -> Result<Self, InvalidEnumValue> {
    let mut search_words = Vec::new();
    let mut explicit_search = None;
    let mut category = None;
    let mut priority = None;

    for term in terms {
      let Some((key, value)) =
        term.split_once(':')
      else {
        search_words.push(term.clone());
        continue;
      };

      match key
        .trim()
        .to_ascii_lowercase()
        .as_str()
      {
        | "search" | "q" => {
          explicit_search =
            Some(value.to_string());
        }
        | "category" | "cat" => {
          category =
            parse_optional(value)?;
        }
        | "priority" | "pri" => {
          priority =
            parse_optional(value)?;
        }
        | _ => {
          search_words.push(term.clone());
        }
      }
    }

    let search = explicit_search.or_else(
      || {
        if search_words.is_empty() {
          None
        } else {
          Some(search_words.join(" "))
        }
      }
    );

    Ok(Self::new(
      search, category, priority
    ))
  }

  /// True when `task` satisfies every specified constraint.
  pub fn matches(
    &self,
    task: &Task
  ) -> bool {
    let search_ok =
      self.search.as_deref().map_or(
        true,
        |needle| {
          task.text_contains(
            &needle.to_lowercase()
          )
        }
      );
    let category_ok = self
      .category
      .is_none_or(|c| task.category == c);
    let priority_ok = self
      .priority
      .is_none_or(|p| task.priority == p);

    let ok =
      search_ok && category_ok && priority_ok;
    trace!(
      id = %task.id,
      search_ok,
      category_ok,
      priority_ok,
      "filter evaluation"
    );
    ok
  }
}

fn normalize_search(
  search: Option<String>
) -> Option<String> {
  search.filter(|s| !s.trim().is_empty())
}

/// `all` (or an empty value) lifts the constraint.
fn parse_optional<T>(
  value: &str
) -> Result<Option<T>, InvalidEnumValue>
where
  T: std::str::FromStr<
      Err = InvalidEnumValue
    >
{
  let trimmed = value.trim();
  if trimmed.is_empty()
    || trimmed.eq_ignore_ascii_case("all")
  {
    return Ok(None);
  }
  trimmed.parse::<T>().map(Some)
}
