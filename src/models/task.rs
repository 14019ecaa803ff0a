use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{default_limit, default_skip, present};

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is yet to be started.
    Todo,
    /// Task is currently being worked on.
    InProgress,
    /// Task is completed and under review.
    Review,
    /// Task is completed.
    Done,
    /// Task cannot progress until something else happens.
    Blocked,
    /// Task was dropped.
    Cancelled,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub project_id: i64,
    /// Always the authenticated user who created the task.
    pub creator_id: i64,
    pub assignee_id: Option<i64>,
    /// Meeting this task was extracted from, if any.
    pub meeting_id: Option<i64>,
    pub estimated_hours: Option<i32>,
    pub actual_hours: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input structure for creating a task. Any `creator_id` in the payload is
/// ignored.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskCreate {
    /// Must be between 1 and 255 characters.
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    pub assignee_id: Option<i64>,
    #[validate(range(min = 0))]
    pub estimated_hours: Option<i32>,
    pub due_date: Option<DateTime<Utc>>,
    /// Project the task belongs to; decides which membership is checked.
    pub project_id: i64,
    pub meeting_id: Option<i64>,
}

impl TaskCreate {
    /// A task created as `done` is complete from the start.
    pub fn completed_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        (self.status == TaskStatus::Done).then_some(now)
    }
}

/// Partial task update. Same absent/null semantics as `ProjectUpdate`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TaskUpdate {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "present")]
    pub assignee_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub estimated_hours: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present")]
    pub actual_hours: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    /// Derived from `status`, never read from the request body.
    #[serde(skip)]
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl TaskUpdate {
    /// Hours are nested options, so the derive cannot range-check them.
    pub fn hours_are_valid(&self) -> bool {
        let non_negative = |hours: &Option<Option<i32>>| (*hours).flatten().map_or(true, |h| h >= 0);
        non_negative(&self.estimated_hours) && non_negative(&self.actual_hours)
    }

    /// Sets `completed_at` from the transition between `current` and the
    /// requested status: entering `done` stamps it, leaving `done` clears it.
    pub fn stamp_completion(&mut self, current: TaskStatus, now: DateTime<Utc>) {
        self.completed_at = match self.status {
            Some(TaskStatus::Done) if current != TaskStatus::Done => Some(Some(now)),
            Some(next) if next != TaskStatus::Done && current == TaskStatus::Done => Some(None),
            _ => None,
        };
    }

    /// Applies the present fields to `task` in place.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(assignee_id) = self.assignee_id {
            task.assignee_id = assignee_id;
        }
        if let Some(estimated) = self.estimated_hours {
            task.estimated_hours = estimated;
        }
        if let Some(actual) = self.actual_hours {
            task.actual_hours = actual;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(completed_at) = self.completed_at {
            task.completed_at = completed_at;
        }
    }
}

/// Query parameters for listing a project's tasks.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TaskQuery {
    pub project_id: i64,
    #[serde(default = "default_skip")]
    #[validate(range(min = 0))]
    pub skip: i64,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
}
