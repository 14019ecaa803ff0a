mod common;

use actix_web::{middleware::NormalizePath, App, HttpServer};
use serde_json::{json, Value};

use teamflow::routes;

#[actix_rt::test]
async fn test_real_server_auth_round_trip() {
    let (state, _) = common::memory_state();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(NormalizePath::trim())
            .configure(routes::configure)
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_rt::spawn(server);

    let client = reqwest::Client::new();
    let base = format!("http://{addr}");

    let resp = client
        .get(format!("{base}/api/projects"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert_eq!(resp.headers()["www-authenticate"], "Bearer");

    let resp = client
        .post(format!("{base}/api/auth/register"))
        .json(&json!({ "email": "dana@example.com", "username": "dana", "password": "secret1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(format!("{base}/api/auth/token"))
        .form(&[("username", "dana"), ("password", "secret1")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let token: Value = resp.json().await.unwrap();
    let token = token["access_token"].as_str().unwrap().to_string();

    let resp = client
        .get(format!("{base}/api/projects/"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let projects: Value = resp.json().await.unwrap();
    assert_eq!(projects, json!([]));

    handle.stop(true).await;
}
