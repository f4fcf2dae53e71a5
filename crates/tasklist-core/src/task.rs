use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::InvalidEnumValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Personal,
    Professional,
    Other,
}

impl Category {
    pub const ALL: [Self; 3] = [Self::Personal, Self::Professional, Self::Other];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Personal => "Personal",
            Self::Professional => "Professional",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "personal" | "perso" => Ok(Self::Personal),
            "professional" | "pro" | "work" => Ok(Self::Professional),
            "other" | "autre" => Ok(Self::Other),
            _ => Err(InvalidEnumValue::new("category", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    /// Larger is more important.
    pub const fn weight(self) -> u8 {
        match self {
            Self::High => 2,
            Self::Medium => 1,
            Self::Low => 0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" | "h" | "haute" => Ok(Self::High),
            "medium" | "m" | "moyenne" => Ok(Self::Medium),
            "low" | "l" | "basse" => Ok(Self::Low),
            _ => Err(InvalidEnumValue::new("priority", s)),
        }
    }
}

/// How close a pending task is to its due date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DueStatus {
    Overdue,
    Urgent,
    Upcoming,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub category: Category,

    pub priority: Priority,

    pub due_date: DateTime<Utc>,

    #[serde(default)]
    pub completed: bool,

    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Builds a fresh, not yet completed task. Callers are expected to have
    /// validated the fields first.
    pub fn new(
        title: String,
        description: Option<String>,
        category: Category,
        priority: Priority,
        due_date: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TaskId::new(),
            title,
            description,
            category,
            priority,
            due_date,
            completed: false,
            created_at: now,
        }
    }

    /// Whole days until the due date, truncated toward zero.
    pub fn days_until_due(&self, now: DateTime<Utc>) -> i64 {
        (self.due_date - now).num_days()
    }

    /// `None` for completed tasks, which are never flagged.
    pub fn due_status(&self, now: DateTime<Utc>, urgent_days: i64) -> Option<DueStatus> {
        if self.completed {
            return None;
        }

        let days = self.days_until_due(now);
        Some(if days < 0 {
            DueStatus::Overdue
        } else if days <= urgent_days {
            DueStatus::Urgent
        } else {
            DueStatus::Upcoming
        })
    }

    pub fn text_contains(&self, needle_lower: &str) -> bool {
        self.title.to_lowercase().contains(needle_lower)
            || self
                .description
                .as_deref()
                .map(|desc| desc.to_lowercase().contains(needle_lower))
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::{Category, DueStatus, Priority, Task, TaskId};

    fn task_due_in(hours: i64) -> Task {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        Task::new(
            "Renew passport".to_string(),
            None,
            Category::Personal,
            Priority::High,
            now + Duration::hours(hours),
            now,
        )
    }

    #[test]
    fn enums_accept_english_and_short_labels() {
        assert_eq!("Pro".parse::<Category>().unwrap(), Category::Professional);
        assert_eq!("autre".parse::<Category>().unwrap(), Category::Other);
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!("basse".parse::<Priority>().unwrap(), Priority::Low);
    }

    #[test]
    fn enums_reject_unknown_values() {
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert_eq!(err.kind, "priority");
        assert_eq!(err.value, "urgent");
        assert!("home".parse::<Category>().is_err());
    }

    #[test]
    fn due_status_follows_day_distance() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();

        assert_eq!(task_due_in(-30).due_status(now, 2), Some(DueStatus::Overdue));
        assert_eq!(task_due_in(-5).due_status(now, 2), Some(DueStatus::Urgent));
        assert_eq!(task_due_in(60).due_status(now, 2), Some(DueStatus::Urgent));
        assert_eq!(task_due_in(72).due_status(now, 2), Some(DueStatus::Upcoming));
    }

    #[test]
    fn completed_tasks_are_not_flagged() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        let mut task = task_due_in(-48);
        task.completed = true;
        assert_eq!(task.due_status(now, 2), None);
    }

    #[test]
    fn text_search_covers_description() {
        let mut task = task_due_in(24);
        task.description = Some("Bring the OLD photos".to_string());
        assert!(task.text_contains("old photo"));
        assert!(task.text_contains("passport"));
        assert!(!task.text_contains("visa"));
    }

    #[test]
    fn task_ids_are_unique_and_serialize_as_plain_uuids() {
        let first = TaskId::new();
        let second = TaskId::default();
        assert_ne!(first, second);

        let json = serde_json::to_string(&first).unwrap();
        assert_eq!(json, format!("\"{first}\""));
        assert_eq!(serde_json::from_str::<TaskId>(&json).unwrap(), first);
    }
}
