//! Shared fixtures for content-service HTTP tests.
//!
//! Apps are wired exactly as `main` wires them, minus CORS and the health routes,
//! on top of a fresh in-memory store per test.
#![allow(dead_code)]

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, Error};
use content_service::config::FeedConfig;
use content_service::handlers::{self, AppState};
use crypto_core::JwtValidator;
use serde_json::{json, Value};
use std::sync::Arc;

pub const SECRET: &[u8] = b"blocktube-integration-secret-0123456789";

pub fn state() -> AppState {
    AppState::in_memory(FeedConfig::default())
}

pub async fn init_app(
    state: AppState,
) -> impl Service<Request, Response = ServiceResponse, Error = Error> {
    let validator = Arc::new(JwtValidator::from_secret(SECRET).expect("validator"));
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(move |cfg| handlers::configure(cfg, Some(validator))),
    )
    .await
}

/// Bearer header value for `user_id`, display name derived from the id
pub fn bearer(user_id: &str) -> (&'static str, String) {
    bearer_named(user_id, &format!("{} name", user_id))
}

/// Bearer header value for `user_id` whose token profile carries `name`
pub fn bearer_named(user_id: &str, name: &str) -> (&'static str, String) {
    let token = crypto_core::jwt::issue_hs256_token(
        SECRET,
        user_id,
        Some(name),
        Some(&format!("{}@example.com", user_id)),
        None,
        chrono::Duration::minutes(10),
    )
    .expect("token");
    ("Authorization", format!("Bearer {}", token))
}

pub fn video_body(title: &str) -> Value {
    json!({
        "title": title,
        "description": "walkthrough",
        "contentType": "video",
        "contentURL": "https://cdn.example.com/video.mp4",
        "creator": { "name": "Alice", "walletId": "0xabc" },
        "categories": ["web3"]
    })
}

pub async fn read_json(resp: ServiceResponse) -> Value {
    test::read_body_json(resp).await
}

/// POST /api/v1/content as `owner` and return the new id
pub async fn create_content<S>(app: &S, owner: &str, body: Value) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/content")
        .insert_header(bearer(owner))
        .set_json(body)
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 201, "create should succeed");
    let body = read_json(resp).await;
    body["data"]["id"]
        .as_str()
        .expect("id in create response")
        .to_string()
}

pub async fn get_content<S>(app: &S, id: &str) -> Value
where
    S: Service<Request, Response = ServiceResponse, Error = Error>,
{
    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/content/{}", id))
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), 200);
    read_json(resp).await["data"].clone()
}
