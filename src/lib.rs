pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod principal;
pub mod state;

use axum::routing::{get, post};
use axum::{middleware as axum_middleware, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    admin_guard_middleware, rate_limit_middleware, request_guards_middleware,
};
use crate::state::AppState;

/// Build the full router. Layer order matters: requests pass the rate
/// limiter first, then the guard chain, then the admin gate, then the
/// handler.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_routes())
        .merge(api_routes())
        .merge(dashboard_routes())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            admin_guard_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            request_guards_middleware,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use crate::handlers::auth;

    Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/google", post(auth::google))
        .route("/auth/apple", post(auth::apple))
        .route("/auth/forgot-password", post(auth::forgot_password))
}

fn api_routes() -> Router<AppState> {
    use crate::handlers::profile;

    Router::new().route("/api/me", get(profile::me))
}

fn dashboard_routes() -> Router<AppState> {
    use crate::handlers::dashboard;

    Router::new()
        .route("/dashboard/login", post(dashboard::login))
        .route("/dashboard/users/:id", get(dashboard::user_get))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Shopguide API",
            "version": version,
            "endpoints": {
                "auth": "/auth/* (public - token acquisition)",
                "api": "/api/* (requires app header + bearer token)",
                "dashboard": "/dashboard/* (admin only, except /dashboard/login)",
            }
        }
    }))
}

async fn health() -> axum::response::Json<Value> {
    axum::response::Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}
