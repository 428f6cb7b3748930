use std::sync::Arc;

use crate::auth::TokenCodec;
use crate::config::SecurityConfig;
use crate::middleware::rate_limit::RateLimiter;
use crate::principal::PrincipalStore;

/// Shared context attached to the router. Everything the request pipeline
/// consumes is owned here and injected, not read from globals, so tests can
/// construct a state with whatever toggles they need.
#[derive(Clone)]
pub struct AppState {
    pub codec: Arc<TokenCodec>,
    pub principals: Arc<dyn PrincipalStore>,
    pub limiter: Arc<RateLimiter>,
    pub security: SecurityConfig,
}
