pub mod meeting;
pub mod member;
pub mod project;
pub mod task;
pub mod user;

use serde::{Deserialize, Deserializer};

pub use meeting::{Meeting, MeetingCreate, MeetingQuery};
pub use member::{AddProjectMember, MemberDetail, MemberRole, ProjectMember, UpdateProjectMember};
pub use project::{
    Pagination, Project, ProjectCounts, ProjectCreate, ProjectResponse, ProjectStatus,
    ProjectUpdate, ProjectWithCounts,
};
pub use task::{Task, TaskCreate, TaskPriority, TaskQuery, TaskStatus, TaskUpdate};
pub use user::{NewUser, User, UserResponse};

pub(crate) fn default_skip() -> i64 {
    0
}

pub(crate) fn default_limit() -> i64 {
    100
}

/// Used with `#[serde(default)]` on `Option<Option<T>>` patch fields: a missing
/// key stays `None`, an explicit `null` becomes `Some(None)`.
pub(crate) fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
