use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::error::ServiceError;
use crate::types::{TaskId, UserId};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Parses a `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns [`ServiceError::Validation`] naming `field` if the value does not parse.
pub fn parse_date(field: &str, value: &str) -> Result<Date, ServiceError> {
    Date::parse(value.trim(), &time::macros::format_description!("[year]-[month]-[day]"))
        .map_err(|_| ServiceError::Validation(format!("{field}: must be a date (YYYY-MM-DD)")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub const ALL: [Self; 3] = [Self::Todo, Self::InProgress, Self::Done];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "TODO",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ServiceError::Validation(format!("status: unknown value '{s}'")))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ServiceError::Validation(format!("priority: unknown value '{s}'")))
    }
}

/// A task owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    #[serde(with = "iso_date::option")]
    pub due_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(rename = "userId")]
    pub owner: UserId,
}

/// Task creation request. Status and priority fall back to TODO and MEDIUM.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default, with = "iso_date::option")]
    pub due_date: Option<Date>,
}

impl TaskDraft {
    /// Validates the draft and fills in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] if the title is blank.
    pub fn into_new_task(self) -> Result<NewTask, ServiceError> {
        if self.title.trim().is_empty() {
            return Err(ServiceError::Validation("title: must not be blank".into()));
        }
        Ok(NewTask {
            title: self.title,
            description: self.description,
            status: self.status.unwrap_or_default(),
            priority: self.priority.unwrap_or_default(),
            due_date: self.due_date,
        })
    }
}

/// Validated task data handed to [`TaskStore::create`](crate::middleware::TaskStore::create).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub due_date: Option<Date>,
}

/// Partial update. `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default, with = "iso_date::option")]
    pub due_date: Option<Date>,
}

impl TaskPatch {
    #[must_use]
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Applies every present field to `task`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Validation`] if a title is present but blank; `task` is
    /// left untouched in that case.
    pub fn apply(self, task: &mut Task) -> Result<(), ServiceError> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(ServiceError::Validation("title: must not be blank".into()));
        }
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = Some(description);
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn task() -> Task {
        Task {
            id: TaskId(3),
            title: "Write report".into(),
            description: Some("quarterly".into()),
            status: TaskStatus::Todo,
            priority: Priority::High,
            due_date: Some(date!(2024 - 05 - 01)),
            created_at: datetime!(2024-04-01 09:30 UTC),
            owner: UserId(1),
        }
    }

    #[test]
    fn status_parses_wire_names() {
        assert_eq!("IN_PROGRESS".parse::<TaskStatus>().unwrap(), TaskStatus::InProgress);
        assert_eq!("done".parse::<TaskStatus>().unwrap(), TaskStatus::Done);
        assert!("FINISHED".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn priority_parses_wire_names() {
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert!(matches!(
            "URGENT".parse::<Priority>(),
            Err(ServiceError::Validation(msg)) if msg.starts_with("priority:")
        ));
    }

    #[test]
    fn task_serializes_wire_shape() {
        let json = serde_json::to_value(task()).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["status"], "TODO");
        assert_eq!(json["priority"], "HIGH");
        assert_eq!(json["dueDate"], "2024-05-01");
        assert_eq!(json["createdAt"], "2024-04-01T09:30:00Z");
        assert_eq!(json["userId"], 1);
    }

    #[test]
    fn draft_defaults_status_and_priority() {
        let draft: TaskDraft = serde_json::from_str(r#"{"title":"Plan sprint"}"#).unwrap();
        let new_task = draft.into_new_task().unwrap();
        assert_eq!(new_task.status, TaskStatus::Todo);
        assert_eq!(new_task.priority, Priority::Medium);
        assert_eq!(new_task.due_date, None);
    }

    #[test]
    fn draft_reads_due_date() {
        let draft: TaskDraft =
            serde_json::from_str(r#"{"title":"Ship","dueDate":"2024-06-30","priority":"LOW"}"#)
                .unwrap();
        let new_task = draft.into_new_task().unwrap();
        assert_eq!(new_task.due_date, Some(date!(2024 - 06 - 30)));
        assert_eq!(new_task.priority, Priority::Low);
    }

    #[test]
    fn draft_rejects_blank_title() {
        let draft = TaskDraft {
            title: "   ".into(),
            ..TaskDraft::default()
        };
        assert!(matches!(
            draft.into_new_task(),
            Err(ServiceError::Validation(msg)) if msg == "title: must not be blank"
        ));
    }

    #[test]
    fn patch_leaves_absent_fields_untouched() {
        let mut task = task();
        TaskPatch::status(TaskStatus::Done).apply(&mut task).unwrap();

        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.title, "Write report");
        assert_eq!(task.description.as_deref(), Some("quarterly"));
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.due_date, Some(date!(2024 - 05 - 01)));
    }

    #[test]
    fn patch_from_json_updates_present_fields() {
        let patch: TaskPatch =
            serde_json::from_str(r#"{"title":"Rewrite report","dueDate":"2024-05-10"}"#).unwrap();
        let mut task = task();
        patch.apply(&mut task).unwrap();

        assert_eq!(task.title, "Rewrite report");
        assert_eq!(task.due_date, Some(date!(2024 - 05 - 10)));
        assert_eq!(task.status, TaskStatus::Todo);
    }

    #[test]
    fn patch_with_blank_title_changes_nothing() {
        let mut task = task();
        let patch = TaskPatch {
            title: Some(String::new()),
            status: Some(TaskStatus::Done),
            ..TaskPatch::default()
        };
        assert!(patch.apply(&mut task).is_err());
        assert_eq!(task, self::task());
    }

    #[test]
    fn parse_date_names_field() {
        assert_eq!(parse_date("dueDate", "2024-02-29").unwrap(), date!(2024 - 02 - 29));
        assert!(matches!(
            parse_date("dueDate", "29/02/2024"),
            Err(ServiceError::Validation(msg)) if msg.starts_with("dueDate:")
        ));
    }
}
