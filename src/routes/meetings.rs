use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{MeetingCreate, MeetingQuery},
    services::meetings,
    state::AppState,
};
use actix_web::{get, post, web, HttpResponse, Responder};

/// Meetings of `project_id`, most recent first.
#[get("")]
pub async fn get_meetings(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    query_params: web::Query<MeetingQuery>,
) -> Result<impl Responder, AppError> {
    let meetings =
        meetings::list_meetings(state.store.as_ref(), user.id, query_params.into_inner()).await?;
    Ok(HttpResponse::Ok().json(meetings))
}

#[post("")]
pub async fn create_meeting(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    meeting_data: web::Json<MeetingCreate>,
) -> Result<impl Responder, AppError> {
    let meeting =
        meetings::create_meeting(state.store.as_ref(), user.id, meeting_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(meeting))
}
