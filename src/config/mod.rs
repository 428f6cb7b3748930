use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub security: SecurityConfig,
    pub jwt: JwtConfig,
    pub rate_limit: RateLimitConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Request-guard toggles. `require_app_header` and `disable_auth` are
/// independent: disabling auth skips only the bearer-presence gate, the
/// app-identity header is still enforced when required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub require_app_header: bool,
    pub app_package: String,
    pub disable_auth: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub window_secs: u64,
    pub max_requests: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Security overrides
        if let Ok(v) = env::var("SECURITY_REQUIRE_APP_HEADER") {
            self.security.require_app_header = v.parse().unwrap_or(self.security.require_app_header);
        }
        if let Ok(v) = env::var("SECURITY_APP_PACKAGE") {
            self.security.app_package = v;
        }
        if let Ok(v) = env::var("SECURITY_DISABLE_AUTH") {
            self.security.disable_auth = v.parse().unwrap_or(self.security.disable_auth);
        }

        // JWT overrides
        if let Ok(v) = env::var("SECURITY_JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_ACCESS_TTL_MINUTES") {
            self.jwt.access_ttl_minutes = v.parse().unwrap_or(self.jwt.access_ttl_minutes);
        }
        if let Ok(v) = env::var("SECURITY_JWT_REFRESH_TTL_DAYS") {
            self.jwt.refresh_ttl_days = v.parse().unwrap_or(self.jwt.refresh_ttl_days);
        }

        // Rate limit overrides
        if let Ok(v) = env::var("RATE_LIMIT_WINDOW_SECS") {
            self.rate_limit.window_secs = v.parse().unwrap_or(self.rate_limit.window_secs);
        }
        if let Ok(v) = env::var("RATE_LIMIT_MAX_REQUESTS") {
            self.rate_limit.max_requests = v.parse().unwrap_or(self.rate_limit.max_requests);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            security: SecurityConfig {
                require_app_header: false,
                app_package: "com.shopguide.app".to_string(),
                disable_auth: false,
            },
            jwt: JwtConfig {
                // Development-only placeholder; real deployments set SECURITY_JWT_SECRET
                secret: "change-me-please-change-me-please-change-me-123456789012".to_string(),
                access_ttl_minutes: 60,
                refresh_ttl_days: 7,
            },
            rate_limit: RateLimitConfig {
                window_secs: 60,
                max_requests: 10,
            },
            database: DatabaseConfig {
                max_connections: 10,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            security: SecurityConfig {
                require_app_header: true,
                app_package: "com.shopguide.app".to_string(),
                disable_auth: false,
            },
            jwt: JwtConfig {
                secret: String::new(),
                access_ttl_minutes: 60,
                refresh_ttl_days: 7,
            },
            rate_limit: RateLimitConfig {
                window_secs: 60,
                max_requests: 10,
            },
            database: DatabaseConfig {
                max_connections: 20,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            security: SecurityConfig {
                require_app_header: true,
                app_package: "com.shopguide.app".to_string(),
                disable_auth: false,
            },
            jwt: JwtConfig {
                // Empty on purpose: TokenCodec::new rejects it at startup unless
                // SECURITY_JWT_SECRET is provided
                secret: String::new(),
                access_ttl_minutes: 60,
                refresh_ttl_days: 7,
            },
            rate_limit: RateLimitConfig {
                window_secs: 60,
                max_requests: 10,
            },
            database: DatabaseConfig {
                max_connections: 50,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(!config.security.require_app_header);
        assert!(!config.security.disable_auth);
        assert_eq!(config.jwt.access_ttl_minutes, 60);
        assert_eq!(config.rate_limit.max_requests, 10);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.require_app_header);
        assert!(config.jwt.secret.is_empty());
        assert_eq!(config.rate_limit.window_secs, 60);
    }
}
