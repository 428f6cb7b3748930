// Administrative dashboard endpoints. Everything under /dashboard except
// /dashboard/login sits behind the admin guard.

use axum::extract::{Path, State};
use axum::response::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use super::auth::{token_pair_response, LoginRequest};
use super::principal_json;
use crate::auth::{password, Role};
use crate::error::ApiError;
use crate::middleware::AdminPrincipal;
use crate::state::AppState;

/// POST /dashboard/login - Password login restricted to admins. Valid
/// non-admin credentials get a 403, not a 401: the caller authenticated
/// fine, they just cannot use the dashboard.
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

    if principal.effective_role(None) != Role::Admin {
        return Err(ApiError::forbidden("Admin only"));
    }

    token_pair_response(&state, &principal)
}

/// GET /dashboard/users/:id - Look up a user by id. The acting admin comes
/// from the guard's request-scoped cache via the extractor; no second token
/// parse or store query happens for it.
pub async fn user_get(
    State(state): State<AppState>,
    AdminPrincipal(admin): AdminPrincipal,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .principals
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "user": principal_json(&user),
            "requested_by": admin.email,
        }
    })))
}
