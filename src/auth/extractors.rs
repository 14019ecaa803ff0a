use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use futures::future::LocalBoxFuture;

use super::middleware::TokenSubject;
use crate::error::AppError;
use crate::models::User;
use crate::services::accounts;
use crate::state::AppState;

/// The active user behind the request's bearer token.
///
/// Relies on `AuthMiddleware` having stored a `TokenSubject`; the user row is
/// loaded fresh on every request, so deactivation takes effect immediately.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequest for CurrentUser {
    type Error = ActixError; // AppError will be converted into ActixError via ResponseError
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let subject = req.extensions().get::<TokenSubject>().cloned();
        let state = req.app_data::<web::Data<AppState>>().cloned();

        Box::pin(async move {
            let TokenSubject(username) =
                subject.ok_or_else(|| AppError::Unauthorized("Not authenticated".into()))?;
            let state = state
                .ok_or_else(|| AppError::InternalServerError("application state missing".into()))?;

            let user = accounts::resolve_active_user(state.store.as_ref(), &username).await?;
            Ok::<_, ActixError>(CurrentUser(user))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Store};
    use crate::models::NewUser;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use std::sync::Arc;

    async fn state_with_alice() -> (web::Data<AppState>, Arc<MemoryStore>, i64) {
        let store = Arc::new(MemoryStore::new());
        let alice = store
            .insert_user(NewUser {
                email: "alice@example.com".into(),
                username: "alice".into(),
                full_name: None,
                hashed_password: "hash".into(),
            })
            .await
            .unwrap();
        let state = web::Data::new(AppState::local(store.clone()));
        (state, store, alice.id)
    }

    #[actix_rt::test]
    async fn test_current_user_extractor_success() {
        let (state, _, alice_id) = state_with_alice().await;
        let req = test::TestRequest::default().app_data(state).to_http_request();
        req.extensions_mut().insert(TokenSubject("alice".into()));

        let mut payload = Payload::None;
        let user = CurrentUser::from_request(&req, &mut payload).await.unwrap();
        assert_eq!(user.0.id, alice_id);
    }

    #[actix_rt::test]
    async fn test_missing_subject_is_unauthorized() {
        let (state, _, _) = state_with_alice().await;
        let req = test::TestRequest::default().app_data(state).to_http_request();

        let mut payload = Payload::None;
        let err = CurrentUser::from_request(&req, &mut payload)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_unknown_and_inactive_users() {
        let (state, store, alice_id) = state_with_alice().await;

        let req = test::TestRequest::default()
            .app_data(state.clone())
            .to_http_request();
        req.extensions_mut().insert(TokenSubject("ghost".into()));
        let err = CurrentUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);

        store.set_active(alice_id, false).await.unwrap();
        let req = test::TestRequest::default().app_data(state).to_http_request();
        req.extensions_mut().insert(TokenSubject("alice".into()));
        let err = CurrentUser::from_request(&req, &mut Payload::None)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::BAD_REQUEST);
    }
}
