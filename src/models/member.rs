use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role of a user within one project.
/// Corresponds to the `member_role` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// The single privileged role; exactly one per project.
    Owner,
    Admin,
    Member,
    Viewer,
}

impl Default for MemberRole {
    fn default() -> Self {
        MemberRole::Member
    }
}

/// A membership row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectMember {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
}

/// A membership joined with the member's identity, as shown in rosters.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct MemberDetail {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
    pub user_email: String,
    pub user_name: String,
}

impl MemberDetail {
    pub fn new(member: ProjectMember, user_email: String, user_name: String) -> Self {
        Self {
            id: member.id,
            project_id: member.project_id,
            user_id: member.user_id,
            role: member.role,
            joined_at: member.joined_at,
            user_email,
            user_name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddProjectMember {
    pub user_id: i64,
    #[serde(default)]
    pub role: MemberRole,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectMember {
    pub role: MemberRole,
}
