#![allow(dead_code)]

use std::sync::Arc;

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{middleware::NormalizePath, test, web, App, Error};
use serde_json::{json, Value};

use teamflow::store::MemoryStore;
use teamflow::{routes, AppState};

pub fn memory_state() -> (web::Data<AppState>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = web::Data::new(AppState::local(store.clone()));
    (state, store)
}

pub async fn init_app(
    state: web::Data<AppState>,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
    test::init_service(
        App::new()
            .app_data(state)
            .wrap(NormalizePath::trim())
            .configure(routes::configure),
    )
    .await
}

/// Registers `name` with password `secret1` and returns the new user's id.
pub async fn register<S, B>(app: &S, name: &str) -> i64
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "email": format!("{name}@example.com"),
            "username": name,
            "password": "secret1"
        }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 200, "registering {name}");
    let body: Value = test::read_body_json(resp).await;
    body["id"].as_i64().unwrap()
}

/// Logs `name` in through the JSON endpoint and returns the bearer token.
pub async fn login<S, B>(app: &S, name: &str) -> String
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "username": name, "password": "secret1" }))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 200, "logging in {name}");
    let body: Value = test::read_body_json(resp).await;
    body["access_token"].as_str().unwrap().to_string()
}

pub async fn signed_up<S, B>(app: &S, name: &str) -> (i64, String)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let id = register(app, name).await;
    (id, login(app, name).await)
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

/// Sends `req` and returns the status with the decoded JSON body.
pub async fn json_call<S, B>(app: &S, req: Request) -> (u16, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let resp = test::call_service(app, req).await;
    let status = resp.status().as_u16();
    let body = test::read_body(resp).await;
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}
