use crate::error::AppError;
use crate::models::{MemberRole, ProjectMember};
use crate::store::Store;

const ANY_ROLE: [MemberRole; 4] = [
    MemberRole::Owner,
    MemberRole::Admin,
    MemberRole::Member,
    MemberRole::Viewer,
];
const MANAGERS: [MemberRole; 2] = [MemberRole::Owner, MemberRole::Admin];
const OWNER_ONLY: [MemberRole; 1] = [MemberRole::Owner];

/// Every project-scoped action that is access checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAction {
    View,
    ListTasks,
    CreateTask,
    UpdateTask,
    ListMeetings,
    CreateMeeting,
    UpdateProject,
    AddMember,
    RemoveMember,
    ChangeMemberRole,
    DeleteProject,
}

impl ProjectAction {
    pub fn allowed_roles(self) -> &'static [MemberRole] {
        match self {
            ProjectAction::View
            | ProjectAction::ListTasks
            | ProjectAction::CreateTask
            | ProjectAction::UpdateTask
            | ProjectAction::ListMeetings
            | ProjectAction::CreateMeeting => &ANY_ROLE,
            ProjectAction::UpdateProject
            | ProjectAction::AddMember
            | ProjectAction::RemoveMember
            | ProjectAction::ChangeMemberRole => &MANAGERS,
            ProjectAction::DeleteProject => &OWNER_ONLY,
        }
    }

    fn denied_message(self) -> &'static str {
        match self {
            ProjectAction::UpdateProject => "Only project owners and admins can update projects",
            ProjectAction::AddMember => "Only project owners and admins can add members",
            ProjectAction::RemoveMember => "Only project owners and admins can remove members",
            ProjectAction::ChangeMemberRole => {
                "Only project owners and admins can change member roles"
            }
            ProjectAction::DeleteProject => "Only project owners can delete projects",
            _ => "You don't have access to this project",
        }
    }

    pub fn permits(self, role: MemberRole) -> bool {
        self.allowed_roles().contains(&role)
    }
}

/// Membership of `user_id` in `project_id`, or `Forbidden`.
pub async fn require_membership(
    store: &dyn Store,
    user_id: i64,
    project_id: i64,
) -> Result<ProjectMember, AppError> {
    store
        .membership(project_id, user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("You don't have access to this project".into()))
}

/// Membership whose role is allowed to perform `action`, or `Forbidden`.
pub async fn require_role(
    store: &dyn Store,
    user_id: i64,
    project_id: i64,
    action: ProjectAction,
) -> Result<ProjectMember, AppError> {
    let membership = require_membership(store, user_id, project_id).await?;
    if !action.permits(membership.role) {
        log::info!(
            "user {} ({:?}) denied {:?} on project {}",
            user_id,
            membership.role,
            action,
            project_id
        );
        return Err(AppError::Forbidden(action.denied_message().into()));
    }
    Ok(membership)
}
