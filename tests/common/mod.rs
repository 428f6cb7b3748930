#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use uuid::Uuid;

use shopguide_api::auth::{password, Role, TokenCodec};
use shopguide_api::config::{RateLimitConfig, SecurityConfig};
use shopguide_api::middleware::RateLimiter;
use shopguide_api::principal::{MemoryPrincipalStore, Principal};
use shopguide_api::state::AppState;

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const APP_PACKAGE: &str = "com.shopguide.app";

pub fn security(require_app_header: bool, disable_auth: bool) -> SecurityConfig {
    SecurityConfig {
        require_app_header,
        app_package: APP_PACKAGE.to_string(),
        disable_auth,
    }
}

/// Build an app backed by an in-memory principal store. The store handle is
/// returned so tests can seed users and change roles mid-flight.
pub fn build_app(security: SecurityConfig) -> (Router, AppState, Arc<MemoryPrincipalStore>) {
    let store = Arc::new(MemoryPrincipalStore::new());
    let state = AppState {
        codec: Arc::new(TokenCodec::new(SECRET, 60, 7).unwrap()),
        principals: store.clone(),
        limiter: Arc::new(RateLimiter::new(&RateLimitConfig {
            window_secs: 60,
            max_requests: 10,
        })),
        security,
    };
    (shopguide_api::app(state.clone()), state, store)
}

pub fn seed_user(
    store: &MemoryPrincipalStore,
    email: &str,
    pass: &str,
    role: Option<Role>,
) -> Principal {
    let principal = Principal {
        id: Uuid::new_v4(),
        email: email.to_string(),
        display_name: "Test User".to_string(),
        password_hash: password::digest(pass),
        role,
    };
    store.insert(principal.clone());
    principal
}

pub fn get(path: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(path)
}

pub fn post(path: &str) -> axum::http::request::Builder {
    Request::builder().method("POST").uri(path)
}

pub fn json_body(builder: axum::http::request::Builder, body: Value) -> Request<Body> {
    builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_body(builder: axum::http::request::Builder) -> Request<Body> {
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<axum::body::Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<axum::body::Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
