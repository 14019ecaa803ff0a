use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{Store, StoreError, StoreResult};
use crate::models::{
    Meeting, MeetingCreate, MemberDetail, MemberRole, NewUser, Project, ProjectCounts,
    ProjectCreate, ProjectMember, ProjectUpdate, ProjectWithCounts, Task, TaskCreate, TaskUpdate,
    User,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    projects: Vec<Project>,
    members: Vec<ProjectMember>,
    tasks: Vec<Task>,
    meetings: Vec<Meeting>,
    last_user_id: i64,
    last_project_id: i64,
    last_member_id: i64,
    last_task_id: i64,
    last_meeting_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

fn page<T: Clone>(rows: impl Iterator<Item = T>, offset: i64, limit: i64) -> Vec<T> {
    rows.skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

impl Tables {
    fn user_exists(&self, id: i64) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    fn project_exists(&self, id: i64) -> bool {
        self.projects.iter().any(|p| p.id == id)
    }

    fn counts(&self, project_id: i64) -> ProjectCounts {
        let count = |n: usize| n as i64;
        ProjectCounts {
            member_count: count(self.members.iter().filter(|m| m.project_id == project_id).count()),
            task_count: count(self.tasks.iter().filter(|t| t.project_id == project_id).count()),
            meeting_count: count(
                self.meetings
                    .iter()
                    .filter(|m| m.project_id == project_id)
                    .count(),
            ),
        }
    }

    /// Mirrors the Postgres constraints on `project_members`.
    fn check_member(&self, project_id: i64, user_id: i64, role: MemberRole) -> StoreResult<()> {
        if !self.project_exists(project_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "project {project_id} does not exist"
            )));
        }
        if !self.user_exists(user_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "user {user_id} does not exist"
            )));
        }
        if self
            .members
            .iter()
            .any(|m| m.project_id == project_id && m.user_id == user_id)
        {
            return Err(StoreError::UniqueViolation(
                "project_members_project_user_key".into(),
            ));
        }
        if role == MemberRole::Owner
            && self
                .members
                .iter()
                .any(|m| m.project_id == project_id && m.role == MemberRole::Owner)
        {
            return Err(StoreError::UniqueViolation(
                "project_members_single_owner".into(),
            ));
        }
        Ok(())
    }

    fn check_task_refs(&self, assignee_id: Option<i64>, meeting_id: Option<i64>) -> StoreResult<()> {
        if let Some(assignee) = assignee_id {
            if !self.user_exists(assignee) {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "user {assignee} does not exist"
                )));
            }
        }
        if let Some(meeting) = meeting_id {
            if !self.meetings.iter().any(|m| m.id == meeting) {
                return Err(StoreError::ForeignKeyViolation(format!(
                    "meeting {meeting} does not exist"
                )));
            }
        }
        Ok(())
    }
}

/// `Store` kept entirely in process memory. Each operation holds one lock for
/// its whole duration, which makes multi-row writes atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores opaque integration tokens on a user; `None` disconnects.
    pub async fn set_integration_tokens(
        &self,
        user_id: i64,
        google: Option<String>,
        slack: Option<String>,
        canvas: Option<String>,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        match tables.users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                user.google_token = google;
                user.slack_token = slack;
                user.canvas_token = canvas;
                user.updated_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn set_active(&self, user_id: i64, active: bool) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        match tables.users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                user.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn owner_count(&self, project_id: i64) -> usize {
        let tables = self.tables.lock().await;
        tables
            .members
            .iter()
            .filter(|m| m.project_id == project_id && m.role == MemberRole::Owner)
            .count()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users_email_key".into()));
        }
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::UniqueViolation("users_username_key".into()));
        }
        let created = User {
            id: next_id(&mut tables.last_user_id),
            email: user.email,
            username: user.username,
            full_name: user.full_name,
            hashed_password: user.hashed_password,
            is_active: true,
            is_superuser: false,
            google_token: None,
            slack_token: None,
            canvas_token: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn user_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().await;
        let by_email = tables.users.iter().find(|u| u.email == email);
        let found = by_email.or_else(|| tables.users.iter().find(|u| u.username == username));
        Ok(found.cloned())
    }

    async fn insert_project_with_owner(
        &self,
        creator_id: i64,
        project: &ProjectCreate,
    ) -> StoreResult<Project> {
        let mut tables = self.tables.lock().await;
        if !tables.user_exists(creator_id) {
            // the owner row could not be written, so neither is the project
            return Err(StoreError::ForeignKeyViolation(format!(
                "user {creator_id} does not exist"
            )));
        }
        let now = Utc::now();
        let created = Project {
            id: next_id(&mut tables.last_project_id),
            name: project.name.clone(),
            description: project.description.clone(),
            status: project.status,
            start_date: project.start_date,
            end_date: project.end_date,
            creator_id,
            google_drive_folder_id: None,
            slack_channel_id: None,
            canvas_course_id: None,
            created_at: now,
            updated_at: None,
        };
        let owner = ProjectMember {
            id: next_id(&mut tables.last_member_id),
            project_id: created.id,
            user_id: creator_id,
            role: MemberRole::Owner,
            joined_at: now,
        };
        tables.projects.push(created.clone());
        tables.members.push(owner);
        Ok(created)
    }

    async fn projects_for_member(
        &self,
        user_id: i64,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<ProjectWithCounts>> {
        let tables = self.tables.lock().await;
        let mut member_of: Vec<i64> = tables
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.project_id)
            .collect();
        member_of.sort_unstable();

        let rows = member_of.into_iter().filter_map(|project_id| {
            tables
                .projects
                .iter()
                .find(|p| p.id == project_id)
                .map(|project| ProjectWithCounts {
                    project: project.clone(),
                    counts: tables.counts(project_id),
                })
        });
        Ok(page(rows, offset, limit))
    }

    async fn project_by_id(&self, id: i64) -> StoreResult<Option<Project>> {
        let tables = self.tables.lock().await;
        Ok(tables.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn project_counts(&self, id: i64) -> StoreResult<ProjectCounts> {
        let tables = self.tables.lock().await;
        Ok(tables.counts(id))
    }

    async fn update_project(&self, id: i64, patch: &ProjectUpdate) -> StoreResult<Option<Project>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.projects.iter_mut().find(|p| p.id == id).map(|project| {
            patch.apply_to(project);
            project.updated_at = Some(Utc::now());
            project.clone()
        }))
    }

    async fn delete_project(&self, id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.projects.len();
        tables.projects.retain(|p| p.id != id);
        if tables.projects.len() == before {
            return Ok(false);
        }
        tables.members.retain(|m| m.project_id != id);
        tables.tasks.retain(|t| t.project_id != id);
        tables.meetings.retain(|m| m.project_id != id);
        Ok(true)
    }

    async fn membership(
        &self,
        project_id: i64,
        user_id: i64,
    ) -> StoreResult<Option<ProjectMember>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .members
            .iter()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
            .cloned())
    }

    async fn member_in_project(
        &self,
        project_id: i64,
        member_id: i64,
    ) -> StoreResult<Option<ProjectMember>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .members
            .iter()
            .find(|m| m.id == member_id && m.project_id == project_id)
            .cloned())
    }

    async fn members_with_users(&self, project_id: i64) -> StoreResult<Vec<MemberDetail>> {
        let tables = self.tables.lock().await;
        let roster = tables
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .filter_map(|m| {
                tables
                    .users
                    .iter()
                    .find(|u| u.id == m.user_id)
                    .map(|u| MemberDetail::new(m.clone(), u.email.clone(), u.username.clone()))
            })
            .collect();
        Ok(roster)
    }

    async fn insert_member(
        &self,
        project_id: i64,
        user_id: i64,
        role: MemberRole,
    ) -> StoreResult<ProjectMember> {
        let mut tables = self.tables.lock().await;
        tables.check_member(project_id, user_id, role)?;
        let member = ProjectMember {
            id: next_id(&mut tables.last_member_id),
            project_id,
            user_id,
            role,
            joined_at: Utc::now(),
        };
        tables.members.push(member.clone());
        Ok(member)
    }

    async fn update_member_role(
        &self,
        member_id: i64,
        role: MemberRole,
    ) -> StoreResult<Option<ProjectMember>> {
        let mut tables = self.tables.lock().await;
        let Some(project_id) = tables
            .members
            .iter()
            .find(|m| m.id == member_id)
            .map(|m| m.project_id)
        else {
            return Ok(None);
        };
        if role == MemberRole::Owner
            && tables.members.iter().any(|m| {
                m.project_id == project_id && m.role == MemberRole::Owner && m.id != member_id
            })
        {
            return Err(StoreError::UniqueViolation(
                "project_members_single_owner".into(),
            ));
        }
        Ok(tables
            .members
            .iter_mut()
            .find(|m| m.id == member_id)
            .map(|member| {
                member.role = role;
                member.clone()
            }))
    }

    async fn delete_member(&self, member_id: i64) -> StoreResult<bool> {
        let mut tables = self.tables.lock().await;
        let before = tables.members.len();
        tables.members.retain(|m| m.id != member_id);
        Ok(tables.members.len() < before)
    }

    async fn tasks_for_project(
        &self,
        project_id: i64,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<Task>> {
        let tables = self.tables.lock().await;
        let rows = tables
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned();
        Ok(page(rows, offset, limit))
    }

    async fn task_by_id(&self, id: i64) -> StoreResult<Option<Task>> {
        let tables = self.tables.lock().await;
        Ok(tables.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn insert_task(&self, creator_id: i64, task: &TaskCreate) -> StoreResult<Task> {
        let mut tables = self.tables.lock().await;
        if !tables.project_exists(task.project_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "project {} does not exist",
                task.project_id
            )));
        }
        if !tables.user_exists(creator_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "user {creator_id} does not exist"
            )));
        }
        tables.check_task_refs(task.assignee_id, task.meeting_id)?;
        let now = Utc::now();
        let created = Task {
            id: next_id(&mut tables.last_task_id),
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            project_id: task.project_id,
            creator_id,
            assignee_id: task.assignee_id,
            meeting_id: task.meeting_id,
            estimated_hours: task.estimated_hours,
            actual_hours: None,
            due_date: task.due_date,
            completed_at: task.completed_at(now),
            created_at: now,
            updated_at: None,
        };
        tables.tasks.push(created.clone());
        Ok(created)
    }

    async fn update_task(&self, id: i64, patch: &TaskUpdate) -> StoreResult<Option<Task>> {
        let mut tables = self.tables.lock().await;
        tables.check_task_refs(patch.assignee_id.flatten(), None)?;
        Ok(tables.tasks.iter_mut().find(|t| t.id == id).map(|task| {
            patch.apply_to(task);
            task.updated_at = Some(Utc::now());
            task.clone()
        }))
    }

    async fn meetings_for_project(
        &self,
        project_id: i64,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<Meeting>> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<Meeting> = tables
            .meetings
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.meeting_date.cmp(&a.meeting_date).then(a.id.cmp(&b.id)));
        Ok(page(rows.into_iter(), offset, limit))
    }

    async fn meeting_by_id(&self, id: i64) -> StoreResult<Option<Meeting>> {
        let tables = self.tables.lock().await;
        Ok(tables.meetings.iter().find(|m| m.id == id).cloned())
    }

    async fn insert_meeting(
        &self,
        creator_id: i64,
        meeting: &MeetingCreate,
    ) -> StoreResult<Meeting> {
        let mut tables = self.tables.lock().await;
        if !tables.project_exists(meeting.project_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "project {} does not exist",
                meeting.project_id
            )));
        }
        let created = Meeting {
            id: next_id(&mut tables.last_meeting_id),
            title: meeting.title.clone(),
            project_id: meeting.project_id,
            creator_id,
            meeting_date: meeting.meeting_date,
            duration_minutes: meeting.duration_minutes,
            location: meeting.location.clone(),
            raw_notes: meeting.raw_notes.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        tables.meetings.push(created.clone());
        Ok(created)
    }
}
