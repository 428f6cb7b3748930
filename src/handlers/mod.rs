pub mod auth;
pub mod dashboard;
pub mod profile;

use serde_json::{json, Value};

use crate::auth::Role;
use crate::principal::Principal;

/// Client-facing view of a principal. The password digest never leaves the
/// server.
pub(crate) fn principal_json(principal: &Principal) -> Value {
    json!({
        "id": principal.id,
        "email": principal.email,
        "name": principal.display_name,
        "role": principal.role.unwrap_or(Role::User).as_str(),
    })
}
