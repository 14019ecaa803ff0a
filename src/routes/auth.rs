use crate::{
    auth::{CurrentUser, LoginRequest, RegisterRequest, TokenResponse},
    error::AppError,
    models::UserResponse,
    services::accounts,
    state::AppState,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::json;

/// Register a new user
///
/// Creates an active, regular account and returns it without the password
/// hash. Registration does not log the user in.
///
/// ## Responses:
/// - `200 OK`: the new user, with integration presence flags.
/// - `400 Bad Request`: email or username already taken.
/// - `422 Unprocessable Entity`: the payload failed validation.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    let user = accounts::register(
        state.store.as_ref(),
        state.config.bcrypt_cost,
        register_data.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(&user)))
}

async fn issue_for(state: &AppState, credentials: LoginRequest) -> Result<TokenResponse, AppError> {
    let user = accounts::authenticate(
        state.store.as_ref(),
        state.config.bcrypt_cost,
        &credentials.username,
        &credentials.password,
    )
    .await?
    .ok_or_else(|| AppError::Unauthorized("Incorrect username or password".into()))?;
    if !user.is_active {
        return Err(AppError::InactiveUser);
    }

    let access_token = state.tokens.issue(&user.username, None)?;
    log::info!("issued access token for user {}", user.id);
    Ok(TokenResponse::bearer(access_token))
}

/// OAuth2 password flow: form-encoded `username` and `password`.
#[post("/token")]
pub async fn token(
    state: web::Data<AppState>,
    form: web::Form<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let response = issue_for(&state, form.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// JSON variant of `/token`.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let response = issue_for(&state, login_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[get("/me")]
pub async fn me(CurrentUser(user): CurrentUser) -> impl Responder {
    HttpResponse::Ok().json(UserResponse::from(&user))
}

/// Tokens are stateless, so there is nothing to revoke.
#[post("/logout")]
pub async fn logout() -> impl Responder {
    HttpResponse::Ok().json(json!({ "message": "Successfully logged out" }))
}
