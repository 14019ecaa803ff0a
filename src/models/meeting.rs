use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{default_limit, default_skip};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Meeting {
    pub id: i64,
    pub title: String,
    pub project_id: i64,
    pub creator_id: i64,
    pub meeting_date: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub location: Option<String>,
    pub raw_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MeetingCreate {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub project_id: i64,
    pub meeting_date: DateTime<Utc>,
    #[validate(range(min = 0))]
    pub duration_minutes: Option<i32>,
    pub location: Option<String>,
    pub raw_notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MeetingQuery {
    pub project_id: i64,
    #[serde(default = "default_skip")]
    #[validate(range(min = 0))]
    pub skip: i64,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100))]
    pub limit: i64,
}
