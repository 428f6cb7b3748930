pub mod admin_guard;
pub mod guards;
pub mod rate_limit;

pub use admin_guard::{admin_guard_middleware, AdminPrincipal};
pub use guards::request_guards_middleware;
pub use rate_limit::{rate_limit_middleware, RateLimiter};
