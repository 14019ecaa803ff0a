use chrono::Utc;
use validator::Validate;

use super::access::{require_role, ProjectAction};
use crate::error::AppError;
use crate::models::{Task, TaskCreate, TaskQuery, TaskUpdate};
use crate::store::Store;

fn task_not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

async fn check_assignee(store: &dyn Store, assignee_id: Option<i64>) -> Result<(), AppError> {
    if let Some(assignee_id) = assignee_id {
        if store.user_by_id(assignee_id).await?.is_none() {
            return Err(AppError::NotFound("Assignee not found".into()));
        }
    }
    Ok(())
}

pub async fn list_tasks(
    store: &dyn Store,
    user_id: i64,
    query: TaskQuery,
) -> Result<Vec<Task>, AppError> {
    query.validate()?;
    require_role(store, user_id, query.project_id, ProjectAction::ListTasks).await?;
    let tasks = store
        .tasks_for_project(query.project_id, query.skip, query.limit)
        .await?;
    Ok(tasks)
}

/// The task's creator is always `user_id`.
pub async fn create_task(
    store: &dyn Store,
    user_id: i64,
    input: TaskCreate,
) -> Result<Task, AppError> {
    input.validate()?;
    require_role(store, user_id, input.project_id, ProjectAction::CreateTask).await?;
    check_assignee(store, input.assignee_id).await?;
    if let Some(meeting_id) = input.meeting_id {
        let in_project = store
            .meeting_by_id(meeting_id)
            .await?
            .is_some_and(|m| m.project_id == input.project_id);
        if !in_project {
            return Err(AppError::NotFound("Meeting not found".into()));
        }
    }

    let task = store.insert_task(user_id, &input).await?;
    log::info!(
        "user {} created task {} in project {}",
        user_id,
        task.id,
        task.project_id
    );
    Ok(task)
}

pub async fn get_task(store: &dyn Store, user_id: i64, task_id: i64) -> Result<Task, AppError> {
    let task = store.task_by_id(task_id).await?.ok_or_else(task_not_found)?;
    require_role(store, user_id, task.project_id, ProjectAction::View).await?;
    Ok(task)
}

/// Any member may update a task; `completed_at` follows status changes.
pub async fn update_task(
    store: &dyn Store,
    user_id: i64,
    task_id: i64,
    mut patch: TaskUpdate,
) -> Result<Task, AppError> {
    patch.validate()?;
    if !patch.hours_are_valid() {
        return Err(AppError::ValidationError(
            "hours must not be negative".into(),
        ));
    }

    let current = store.task_by_id(task_id).await?.ok_or_else(task_not_found)?;
    require_role(store, user_id, current.project_id, ProjectAction::UpdateTask).await?;
    check_assignee(store, patch.assignee_id.flatten()).await?;

    patch.stamp_completion(current.status, Utc::now());
    let task = store
        .update_task(task_id, &patch)
        .await?
        .ok_or_else(task_not_found)?;
    log::debug!("user {} updated task {}", user_id, task_id);
    Ok(task)
}
