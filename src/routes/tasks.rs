use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{TaskCreate, TaskQuery, TaskUpdate},
    services::tasks,
    state::AppState,
};
use actix_web::{get, patch, post, web, HttpResponse, Responder};

/// Retrieves the tasks of one project.
///
/// ## Query Parameters:
/// - `project_id` (required): the project whose tasks are listed.
/// - `skip` / `limit` (optional): pagination, defaults 0 and 100.
///
/// ## Responses:
/// - `200 OK`: a JSON array of `Task` objects, oldest first.
/// - `401 Unauthorized`: missing or invalid bearer token.
/// - `403 Forbidden`: the caller is not a member of the project.
/// - `422 Unprocessable Entity`: `project_id` missing or pagination out of range.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    query_params: web::Query<TaskQuery>,
) -> Result<impl Responder, AppError> {
    let tasks = tasks::list_tasks(state.store.as_ref(), user.id, query_params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tasks))
}

/// Creates a task in `project_id`. Any member may create tasks; the
/// `creator_id` is always the authenticated user.
///
/// ## Responses:
/// - `200 OK`: the created `Task`.
/// - `403 Forbidden`: not a member of the project.
/// - `404 Not Found`: unknown assignee or meeting.
/// - `422 Unprocessable Entity`: invalid title or hours.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    task_data: web::Json<TaskCreate>,
) -> Result<impl Responder, AppError> {
    let task = tasks::create_task(state.store.as_ref(), user.id, task_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

#[get("/{task_id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let task = tasks::get_task(state.store.as_ref(), user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(task))
}

/// Partial update. Setting `status` to `done` stamps `completed_at`.
#[patch("/{task_id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<i64>,
    task_data: web::Json<TaskUpdate>,
) -> Result<impl Responder, AppError> {
    let task = tasks::update_task(
        state.store.as_ref(),
        user.id,
        path.into_inner(),
        task_data.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(task))
}
