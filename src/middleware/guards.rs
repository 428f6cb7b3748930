//! Ordered request-guard chain: app-identity header, then bearer presence.
//!
//! The chain is data, not control flow: each step carries its own enable and
//! bypass predicates so ordering and exemptions are visible in one place.
//! The bearer gate checks header shape only; signature verification is
//! deferred to whichever handler actually needs the principal.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::bearer_token;
use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::state::AppState;

/// Application-identity header the mobile clients send on every call.
pub const APP_HEADER: &str = "X-App-Package";

/// Unauthenticated endpoints that bypass both gates: token acquisition has
/// to work before the caller can possibly hold a token.
const PUBLIC_PATHS: &[&str] = &[
    "/auth/login",
    "/auth/signup",
    "/auth/google",
    "/auth/apple",
    "/auth/refresh",
    "/auth/forgot-password",
    "/dashboard/login",
];

pub fn is_public_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    PUBLIC_PATHS.iter().any(|p| *p == lower)
}

struct GuardStep {
    name: &'static str,
    enabled: fn(&SecurityConfig) -> bool,
    bypass: fn(&str) -> bool,
    check: fn(&SecurityConfig, &HeaderMap) -> Result<(), ApiError>,
}

/// Evaluated in order; the cheap header comparison runs before any token
/// work.
const GUARD_CHAIN: &[GuardStep] = &[
    GuardStep {
        name: "app-identity",
        enabled: |sec| sec.require_app_header,
        bypass: is_public_path,
        check: check_app_header,
    },
    GuardStep {
        name: "bearer-presence",
        enabled: |sec| !sec.disable_auth,
        bypass: is_public_path,
        check: check_bearer_presence,
    },
];

fn check_app_header(security: &SecurityConfig, headers: &HeaderMap) -> Result<(), ApiError> {
    let matches = headers
        .get(APP_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == security.app_package)
        .unwrap_or(false);

    if !matches {
        return Err(ApiError::unauthorized(format!(
            "Missing or invalid {} header",
            APP_HEADER
        )));
    }
    Ok(())
}

fn check_bearer_presence(_security: &SecurityConfig, headers: &HeaderMap) -> Result<(), ApiError> {
    if bearer_token(headers).is_none() {
        return Err(ApiError::unauthorized(
            "Missing or invalid Authorization header",
        ));
    }
    Ok(())
}

/// Gate every inbound request through the guard chain.
pub async fn request_guards_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = request.uri().path().to_string();

    for step in GUARD_CHAIN {
        if !(step.enabled)(&state.security) || (step.bypass)(&path) {
            continue;
        }
        if let Err(err) = (step.check)(&state.security, request.headers()) {
            tracing::debug!(guard = step.name, path = %path, "request rejected by guard");
            return Err(err);
        }
    }

    Ok(next.run(request).await)
}
