// Authenticated (non-admin) endpoints.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use serde_json::{json, Value};

use super::principal_json;
use crate::auth::bearer_token;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/me - Profile of the calling user.
///
/// The guard chain only checked that a bearer header is present; this
/// handler needs the identity, so it verifies the token and resolves the
/// principal itself.
pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    let token =
        bearer_token(&headers).ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;
    let payload = state.codec.parse_access(&token)?;

    let principal = state
        .principals
        .find_by_id(payload.principal_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "user": principal_json(&principal),
            "effective_role": principal.effective_role(payload.role).as_str(),
        }
    })))
}
