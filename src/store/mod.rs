//! Persistence seam between the services and the relational store.
//!
//! `PgStore` is the production implementation; `MemoryStore` keeps the same
//! uniqueness, foreign-key and cascade rules in process memory.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Meeting, MeetingCreate, MemberDetail, MemberRole, NewUser, Project, ProjectCounts,
    ProjectCreate, ProjectMember, ProjectUpdate, ProjectWithCounts, Task, TaskCreate, TaskUpdate,
    User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &error {
            match db.code().as_deref() {
                Some("23505") => return StoreError::UniqueViolation(db.message().to_string()),
                Some("23503") => return StoreError::ForeignKeyViolation(db.message().to_string()),
                _ => {}
            }
        }
        StoreError::Database(error)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    // users
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>>;
    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    /// First user whose email or username matches, in one lookup.
    async fn user_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> StoreResult<Option<User>>;

    // projects
    /// Inserts the project and the creator's `owner` membership atomically.
    async fn insert_project_with_owner(
        &self,
        creator_id: i64,
        project: &ProjectCreate,
    ) -> StoreResult<Project>;
    async fn projects_for_member(
        &self,
        user_id: i64,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<ProjectWithCounts>>;
    async fn project_by_id(&self, id: i64) -> StoreResult<Option<Project>>;
    async fn project_counts(&self, id: i64) -> StoreResult<ProjectCounts>;
    async fn update_project(&self, id: i64, patch: &ProjectUpdate) -> StoreResult<Option<Project>>;
    /// Deletes the project with its members, tasks and meetings.
    async fn delete_project(&self, id: i64) -> StoreResult<bool>;

    // memberships
    async fn membership(&self, project_id: i64, user_id: i64)
        -> StoreResult<Option<ProjectMember>>;
    async fn member_in_project(
        &self,
        project_id: i64,
        member_id: i64,
    ) -> StoreResult<Option<ProjectMember>>;
    async fn members_with_users(&self, project_id: i64) -> StoreResult<Vec<MemberDetail>>;
    async fn insert_member(
        &self,
        project_id: i64,
        user_id: i64,
        role: MemberRole,
    ) -> StoreResult<ProjectMember>;
    async fn update_member_role(
        &self,
        member_id: i64,
        role: MemberRole,
    ) -> StoreResult<Option<ProjectMember>>;
    async fn delete_member(&self, member_id: i64) -> StoreResult<bool>;

    // tasks
    async fn tasks_for_project(
        &self,
        project_id: i64,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<Task>>;
    async fn task_by_id(&self, id: i64) -> StoreResult<Option<Task>>;
    async fn insert_task(&self, creator_id: i64, task: &TaskCreate) -> StoreResult<Task>;
    async fn update_task(&self, id: i64, patch: &TaskUpdate) -> StoreResult<Option<Task>>;

    // meetings
    async fn meetings_for_project(
        &self,
        project_id: i64,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<Meeting>>;
    async fn meeting_by_id(&self, id: i64) -> StoreResult<Option<Meeting>>;
    async fn insert_meeting(&self, creator_id: i64, meeting: &MeetingCreate)
        -> StoreResult<Meeting>;
}
