use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder};

use super::{Store, StoreResult};
use crate::models::{
    Meeting, MeetingCreate, MemberDetail, MemberRole, NewUser, Project, ProjectCounts,
    ProjectCreate, ProjectMember, ProjectUpdate, ProjectWithCounts, Task, TaskCreate, TaskUpdate,
    User,
};

const USER_COLUMNS: &str = "id, email, username, full_name, hashed_password, is_active, \
    is_superuser, google_token, slack_token, canvas_token, created_at, updated_at";

const PROJECT_COLUMNS: &str = "id, name, description, status, start_date, end_date, creator_id, \
    google_drive_folder_id, slack_channel_id, canvas_course_id, created_at, updated_at";

const MEMBER_COLUMNS: &str = "id, project_id, user_id, role, joined_at";

const TASK_COLUMNS: &str = "id, title, description, status, priority, project_id, creator_id, \
    assignee_id, meeting_id, estimated_hours, actual_hours, due_date, completed_at, created_at, \
    updated_at";

const MEETING_COLUMNS: &str = "id, title, project_id, creator_id, meeting_date, duration_minutes, \
    location, raw_notes, created_at, updated_at";

/// `Store` backed by a Postgres connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (email, username, full_name, hashed_password) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(user.email)
            .bind(user.username)
            .bind(user.full_name)
            .bind(user.hashed_password)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn user_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> StoreResult<Option<User>> {
        // an email match is reported ahead of a username match
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 OR username = $2 \
             ORDER BY (email = $1) DESC LIMIT 1"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_project_with_owner(
        &self,
        creator_id: i64,
        project: &ProjectCreate,
    ) -> StoreResult<Project> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO projects (name, description, status, start_date, end_date, creator_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {PROJECT_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Project>(&sql)
            .bind(&project.name)
            .bind(&project.description)
            .bind(project.status)
            .bind(project.start_date)
            .bind(project.end_date)
            .bind(creator_id)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO project_members (project_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(created.id)
            .bind(creator_id)
            .bind(MemberRole::Owner)
            .execute(&mut *tx)
            .await?;

        // dropping `tx` on an earlier `?` rolls back the project insert
        tx.commit().await?;
        Ok(created)
    }

    async fn projects_for_member(
        &self,
        user_id: i64,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<ProjectWithCounts>> {
        let rows = sqlx::query_as::<_, ProjectWithCounts>(
            "SELECT p.id, p.name, p.description, p.status, p.start_date, p.end_date, p.creator_id, \
                    p.google_drive_folder_id, p.slack_channel_id, p.canvas_course_id, \
                    p.created_at, p.updated_at, \
                    (SELECT COUNT(*) FROM project_members c WHERE c.project_id = p.id) AS member_count, \
                    (SELECT COUNT(*) FROM tasks t WHERE t.project_id = p.id) AS task_count, \
                    (SELECT COUNT(*) FROM meetings mt WHERE mt.project_id = p.id) AS meeting_count \
             FROM projects p \
             JOIN project_members m ON m.project_id = p.id \
             WHERE m.user_id = $1 \
             ORDER BY p.id \
             OFFSET $2 LIMIT $3",
        )
        .bind(user_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn project_by_id(&self, id: i64) -> StoreResult<Option<Project>> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        let project = sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn project_counts(&self, id: i64) -> StoreResult<ProjectCounts> {
        let counts = sqlx::query_as::<_, ProjectCounts>(
            "SELECT \
                (SELECT COUNT(*) FROM project_members WHERE project_id = $1) AS member_count, \
                (SELECT COUNT(*) FROM tasks WHERE project_id = $1) AS task_count, \
                (SELECT COUNT(*) FROM meetings WHERE project_id = $1) AS meeting_count",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(counts)
    }

    async fn update_project(&self, id: i64, patch: &ProjectUpdate) -> StoreResult<Option<Project>> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE projects SET updated_at = NOW()");
        if let Some(name) = &patch.name {
            qb.push(", name = ").push_bind(name.clone());
        }
        if let Some(description) = &patch.description {
            qb.push(", description = ").push_bind(description.clone());
        }
        if let Some(status) = patch.status {
            qb.push(", status = ").push_bind(status);
        }
        if let Some(start_date) = patch.start_date {
            qb.push(", start_date = ").push_bind(start_date);
        }
        if let Some(end_date) = patch.end_date {
            qb.push(", end_date = ").push_bind(end_date);
        }
        if let Some(folder) = &patch.google_drive_folder_id {
            qb.push(", google_drive_folder_id = ").push_bind(folder.clone());
        }
        if let Some(channel) = &patch.slack_channel_id {
            qb.push(", slack_channel_id = ").push_bind(channel.clone());
        }
        if let Some(course) = &patch.canvas_course_id {
            qb.push(", canvas_course_id = ").push_bind(course.clone());
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING ").push(PROJECT_COLUMNS);

        let project = qb
            .build_query_as::<Project>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(project)
    }

    async fn delete_project(&self, id: i64) -> StoreResult<bool> {
        // members, tasks, meetings and reports go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn membership(
        &self,
        project_id: i64,
        user_id: i64,
    ) -> StoreResult<Option<ProjectMember>> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM project_members WHERE project_id = $1 AND user_id = $2"
        );
        let member = sqlx::query_as::<_, ProjectMember>(&sql)
            .bind(project_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    async fn member_in_project(
        &self,
        project_id: i64,
        member_id: i64,
    ) -> StoreResult<Option<ProjectMember>> {
        let sql = format!(
            "SELECT {MEMBER_COLUMNS} FROM project_members WHERE id = $1 AND project_id = $2"
        );
        let member = sqlx::query_as::<_, ProjectMember>(&sql)
            .bind(member_id)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    async fn members_with_users(&self, project_id: i64) -> StoreResult<Vec<MemberDetail>> {
        let members = sqlx::query_as::<_, MemberDetail>(
            "SELECT m.id, m.project_id, m.user_id, m.role, m.joined_at, \
                    u.email AS user_email, u.username AS user_name \
             FROM project_members m \
             JOIN users u ON u.id = m.user_id \
             WHERE m.project_id = $1 \
             ORDER BY m.id",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    async fn insert_member(
        &self,
        project_id: i64,
        user_id: i64,
        role: MemberRole,
    ) -> StoreResult<ProjectMember> {
        let sql = format!(
            "INSERT INTO project_members (project_id, user_id, role) VALUES ($1, $2, $3) \
             RETURNING {MEMBER_COLUMNS}"
        );
        let member = sqlx::query_as::<_, ProjectMember>(&sql)
            .bind(project_id)
            .bind(user_id)
            .bind(role)
            .fetch_one(&self.pool)
            .await?;
        Ok(member)
    }

    async fn update_member_role(
        &self,
        member_id: i64,
        role: MemberRole,
    ) -> StoreResult<Option<ProjectMember>> {
        let sql = format!(
            "UPDATE project_members SET role = $1 WHERE id = $2 RETURNING {MEMBER_COLUMNS}"
        );
        let member = sqlx::query_as::<_, ProjectMember>(&sql)
            .bind(role)
            .bind(member_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(member)
    }

    async fn delete_member(&self, member_id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM project_members WHERE id = $1")
            .bind(member_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn tasks_for_project(
        &self,
        project_id: i64,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<Task>> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = $1 ORDER BY id OFFSET $2 LIMIT $3"
        );
        let tasks = sqlx::query_as::<_, Task>(&sql)
            .bind(project_id)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(tasks)
    }

    async fn task_by_id(&self, id: i64) -> StoreResult<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn insert_task(&self, creator_id: i64, task: &TaskCreate) -> StoreResult<Task> {
        let sql = format!(
            "INSERT INTO tasks (title, description, status, priority, project_id, creator_id, \
                                assignee_id, meeting_id, estimated_hours, due_date, completed_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {TASK_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Task>(&sql)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.status)
            .bind(task.priority)
            .bind(task.project_id)
            .bind(creator_id)
            .bind(task.assignee_id)
            .bind(task.meeting_id)
            .bind(task.estimated_hours)
            .bind(task.due_date)
            .bind(task.completed_at(Utc::now()))
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn update_task(&self, id: i64, patch: &TaskUpdate) -> StoreResult<Option<Task>> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE tasks SET updated_at = NOW()");
        if let Some(title) = &patch.title {
            qb.push(", title = ").push_bind(title.clone());
        }
        if let Some(description) = &patch.description {
            qb.push(", description = ").push_bind(description.clone());
        }
        if let Some(status) = patch.status {
            qb.push(", status = ").push_bind(status);
        }
        if let Some(priority) = patch.priority {
            qb.push(", priority = ").push_bind(priority);
        }
        if let Some(assignee_id) = patch.assignee_id {
            qb.push(", assignee_id = ").push_bind(assignee_id);
        }
        if let Some(estimated) = patch.estimated_hours {
            qb.push(", estimated_hours = ").push_bind(estimated);
        }
        if let Some(actual) = patch.actual_hours {
            qb.push(", actual_hours = ").push_bind(actual);
        }
        if let Some(due_date) = patch.due_date {
            qb.push(", due_date = ").push_bind(due_date);
        }
        if let Some(completed_at) = patch.completed_at {
            qb.push(", completed_at = ").push_bind(completed_at);
        }
        qb.push(" WHERE id = ").push_bind(id);
        qb.push(" RETURNING ").push(TASK_COLUMNS);

        let task = qb
            .build_query_as::<Task>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(task)
    }

    async fn meetings_for_project(
        &self,
        project_id: i64,
        offset: i64,
        limit: i64,
    ) -> StoreResult<Vec<Meeting>> {
        let sql = format!(
            "SELECT {MEETING_COLUMNS} FROM meetings WHERE project_id = $1 \
             ORDER BY meeting_date DESC, id OFFSET $2 LIMIT $3"
        );
        let meetings = sqlx::query_as::<_, Meeting>(&sql)
            .bind(project_id)
            .bind(offset)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(meetings)
    }

    async fn meeting_by_id(&self, id: i64) -> StoreResult<Option<Meeting>> {
        let sql = format!("SELECT {MEETING_COLUMNS} FROM meetings WHERE id = $1");
        let meeting = sqlx::query_as::<_, Meeting>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(meeting)
    }

    async fn insert_meeting(
        &self,
        creator_id: i64,
        meeting: &MeetingCreate,
    ) -> StoreResult<Meeting> {
        let sql = format!(
            "INSERT INTO meetings (title, project_id, creator_id, meeting_date, duration_minutes, \
                                   location, raw_notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {MEETING_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Meeting>(&sql)
            .bind(&meeting.title)
            .bind(meeting.project_id)
            .bind(creator_id)
            .bind(meeting.meeting_date)
            .bind(meeting.duration_minutes)
            .bind(&meeting.location)
            .bind(&meeting.raw_notes)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }
}
