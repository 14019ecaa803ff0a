use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{AddProjectMember, Pagination, ProjectCreate, ProjectUpdate, UpdateProjectMember},
    services::projects,
    state::AppState,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;

/// Lists the projects the authenticated user is a member of.
///
/// ## Query Parameters:
/// - `skip` (optional, default 0): rows to skip.
/// - `limit` (optional, default 100, at most 100): rows to return.
///
/// Each project carries `member_count`, `task_count` and `meeting_count`.
#[get("")]
pub async fn list_projects(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    page: web::Query<Pagination>,
) -> Result<impl Responder, AppError> {
    let projects = projects::list_projects(state.store.as_ref(), user.id, page.into_inner()).await?;
    Ok(HttpResponse::Ok().json(projects))
}

/// Creates a project owned by the authenticated user.
///
/// ## Responses:
/// - `200 OK`: the project with its counts and one-member roster.
/// - `422 Unprocessable Entity`: invalid name or status.
#[post("")]
pub async fn create_project(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    input: web::Json<ProjectCreate>,
) -> Result<impl Responder, AppError> {
    let project = projects::create_project(state.store.as_ref(), user.id, input.into_inner()).await?;
    Ok(HttpResponse::Ok().json(project))
}

/// Any member may read a project. Non-members get `403` even when the
/// project does not exist.
#[get("/{project_id}")]
pub async fn get_project(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let project = projects::get_project(state.store.as_ref(), user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(project))
}

/// Partial update, owners and admins only.
#[patch("/{project_id}")]
pub async fn update_project(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<i64>,
    patch: web::Json<ProjectUpdate>,
) -> Result<impl Responder, AppError> {
    let project = projects::update_project(
        state.store.as_ref(),
        user.id,
        path.into_inner(),
        patch.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(project))
}

#[delete("/{project_id}")]
pub async fn delete_project(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    projects::delete_project(state.store.as_ref(), user.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Project deleted successfully" })))
}

#[post("/{project_id}/members")]
pub async fn add_member(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<i64>,
    input: web::Json<AddProjectMember>,
) -> Result<impl Responder, AppError> {
    let member = projects::add_member(
        state.store.as_ref(),
        user.id,
        path.into_inner(),
        input.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(member))
}

#[patch("/{project_id}/members/{member_id}")]
pub async fn update_member(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<(i64, i64)>,
    input: web::Json<UpdateProjectMember>,
) -> Result<impl Responder, AppError> {
    let (project_id, member_id) = path.into_inner();
    let member = projects::update_member_role(
        state.store.as_ref(),
        user.id,
        project_id,
        member_id,
        input.role,
    )
    .await?;
    Ok(HttpResponse::Ok().json(member))
}

/// The owner's membership cannot be removed.
#[delete("/{project_id}/members/{member_id}")]
pub async fn remove_member(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<(i64, i64)>,
) -> Result<impl Responder, AppError> {
    let (project_id, member_id) = path.into_inner();
    projects::remove_member(state.store.as_ref(), user.id, project_id, member_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Member removed successfully" })))
}
