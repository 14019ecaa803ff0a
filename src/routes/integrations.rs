use crate::{auth::CurrentUser, models::UserResponse};
use actix_web::{get, HttpResponse, Responder};
use serde_json::json;

/// Which external services the caller has connected. Token values are never
/// returned.
#[get("")]
pub async fn get_integrations(CurrentUser(user): CurrentUser) -> impl Responder {
    let flags = UserResponse::from(&user);
    HttpResponse::Ok().json(json!({
        "google_drive": flags.has_google,
        "slack": flags.has_slack,
        "canvas": flags.has_canvas,
    }))
}
