use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{default_limit, default_skip, present, MemberDetail};

/// Lifecycle status of a project.
/// Corresponds to the `project_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    InProgress,
    Review,
    Completed,
    OnHold,
}

impl Default for ProjectStatus {
    fn default() -> Self {
        ProjectStatus::Planning
    }
}

/// A project as stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub creator_id: i64,
    pub google_drive_folder_id: Option<String>,
    pub slack_channel_id: Option<String>,
    pub canvas_course_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Related-row counts, computed at query time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct ProjectCounts {
    pub member_count: i64,
    pub task_count: i64,
    pub meeting_count: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct ProjectWithCounts {
    #[sqlx(flatten)]
    pub project: Project,
    #[sqlx(flatten)]
    pub counts: ProjectCounts,
}

/// Project as returned by the API: the row, its live counts, and, for single
/// project reads, the member roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectResponse {
    #[serde(flatten)]
    pub project: Project,
    #[serde(flatten)]
    pub counts: ProjectCounts,
    #[serde(default)]
    pub members: Vec<MemberDetail>,
}

impl From<ProjectWithCounts> for ProjectResponse {
    fn from(row: ProjectWithCounts) -> Self {
        Self {
            project: row.project,
            counts: row.counts,
            members: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProjectCreate {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProjectStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// Partial update. A missing key leaves the column untouched; an explicit
/// `null` clears a nullable column.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ProjectUpdate {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Option<String>>,
    pub status: Option<ProjectStatus>,
    #[serde(default, deserialize_with = "present")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present")]
    pub google_drive_folder_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub slack_channel_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub canvas_course_id: Option<Option<String>>,
}

impl ProjectUpdate {
    /// Applies the present fields to `project` in place.
    pub fn apply_to(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(start_date) = self.start_date {
            project.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            project.end_date = end_date;
        }
        if let Some(folder) = &self.google_drive_folder_id {
            project.google_drive_folder_id = folder.clone();
        }
        if let Some(channel) = &self.slack_channel_id {
            project.slack_channel_id = channel.clone();
        }
        if let Some(course) = &self.canvas_course_id {
            project.canvas_course_id = course.clone();
        }
    }
}

/// `skip`/`limit` query parameters for list endpoints.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct Pagination {
    #[serde(default = "default_skip")]
    #[validate(range(min = 0))]
    pub skip: i64,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            skip: default_skip(),
            limit: default_limit(),
        }
    }
}
