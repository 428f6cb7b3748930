// Public auth endpoints: token acquisition and exchange.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::principal_json;
use crate::auth::password;
use crate::error::ApiError;
use crate::principal::Principal;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub(crate) fn token_pair_response(
    state: &AppState,
    principal: &Principal,
) -> Result<Json<Value>, ApiError> {
    let access_token = state.codec.issue_access(principal)?;
    let refresh_token = state.codec.issue_refresh(principal)?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "access_token": access_token,
            "refresh_token": refresh_token,
            "user": principal_json(principal),
        }
    })))
}

/// POST /auth/login - Authenticate with email and password, receive a token
/// pair. The same generic 401 covers an unknown email and a wrong password.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let principal = state
        .principals
        .find_by_email(&body.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !password::verify(&body.password, &principal.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    tracing::debug!(user = %principal.id, "login succeeded");
    token_pair_response(&state, &principal)
}

/// POST /auth/refresh - Exchange a refresh token for a fresh pair. The
/// principal is re-resolved so a deleted account cannot keep refreshing.
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<Value>, ApiError> {
    let payload = state.codec.parse_refresh(&body.refresh_token)?;

    let principal = state
        .principals
        .find_by_id(payload.principal_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    token_pair_response(&state, &principal)
}

/// POST /auth/signup - Account creation lives in the user subsystem; the
/// route exists here so the rate limiter and guard allowlist cover it.
pub async fn signup() -> (StatusCode, Json<Value>) {
    not_implemented("signup")
}

/// POST /auth/google - Google ID-token verification is handled by the
/// identity-provider integration, out of scope for this service core.
pub async fn google() -> (StatusCode, Json<Value>) {
    not_implemented("google login")
}

/// POST /auth/apple - See [`google`].
pub async fn apple() -> (StatusCode, Json<Value>) {
    not_implemented("apple login")
}

/// POST /auth/forgot-password - Reset email dispatch is owned by the mail
/// subsystem.
pub async fn forgot_password() -> (StatusCode, Json<Value>) {
    not_implemented("forgot password")
}

fn not_implemented(what: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_IMPLEMENTED,
        Json(json!({
            "error": true,
            "message": format!("The {} endpoint is not available in this deployment", what),
            "code": "NOT_IMPLEMENTED"
        })),
    )
}
