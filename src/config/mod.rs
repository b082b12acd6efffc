use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

/// Port used when neither TENANTFLOW_PORT nor PORT is set
pub const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub invitations: InvitationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
    pub slow_query_threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub default_page_size: i64,
    pub max_page_size: i64,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub cors_origins: Vec<String>,
    pub enable_audit_logging: bool,
    pub min_password_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationConfig {
    pub expiry_days: i64,
    pub app_url: String,
    pub sweep_interval_secs: u64,
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
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }
        if let Ok(v) = env::var("DATABASE_SLOW_QUERY_THRESHOLD_MS") {
            self.database.slow_query_threshold_ms = v.parse().unwrap_or(self.database.slow_query_threshold_ms);
        }

        // API overrides (PORT is honoured for hosted deployments)
        if let Some(v) = env::var("TENANTFLOW_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_DEFAULT_PAGE_SIZE") {
            self.api.default_page_size = v.parse().unwrap_or(self.api.default_page_size);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_AUDIT_LOGGING") {
            self.security.enable_audit_logging = v.parse().unwrap_or(self.security.enable_audit_logging);
        }
        if let Ok(v) = env::var("SECURITY_MIN_PASSWORD_LENGTH") {
            self.security.min_password_length = v.parse().unwrap_or(self.security.min_password_length);
        }

        // Invitation overrides
        if let Ok(v) = env::var("INVITATION_EXPIRY_DAYS") {
            self.invitations.expiry_days = v.parse().unwrap_or(self.invitations.expiry_days);
        }
        if let Ok(v) = env::var("APP_URL") {
            self.invitations.app_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("INVITATION_SWEEP_INTERVAL_SECS") {
            self.invitations.sweep_interval_secs = v.parse().unwrap_or(self.invitations.sweep_interval_secs);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 5,
                run_migrations: true,
                slow_query_threshold_ms: 100,
            },
            api: ApiConfig {
                port: DEFAULT_PORT,
                default_page_size: 50,
                max_page_size: 1000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: "tenantflow-development-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                enable_audit_logging: false,
                min_password_length: 8,
            },
            invitations: InvitationConfig {
                expiry_days: 7,
                app_url: "http://localhost:3000".to_string(),
                sweep_interval_secs: 300,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
                slow_query_threshold_ms: 500,
            },
            api: ApiConfig {
                port: DEFAULT_PORT,
                default_page_size: 25,
                max_page_size: 500,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                cors_origins: vec!["https://staging.tenantflow.app".to_string()],
                enable_audit_logging: true,
                min_password_length: 10,
            },
            invitations: InvitationConfig {
                expiry_days: 7,
                app_url: "https://staging.tenantflow.app".to_string(),
                sweep_interval_secs: 900,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
                slow_query_threshold_ms: 1000,
            },
            api: ApiConfig {
                port: DEFAULT_PORT,
                default_page_size: 25,
                max_page_size: 100,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                cors_origins: vec!["https://tenantflow.app".to_string()],
                enable_audit_logging: true,
                min_password_length: 10,
            },
            invitations: InvitationConfig {
                expiry_days: 7,
                app_url: "https://tenantflow.app".to_string(),
                sweep_interval_secs: 3600,
            },
        }
    }

    /// Clamp a requested page size into `1..=max_page_size`, falling back to the default
    pub fn page_size(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.api.default_page_size)
            .clamp(1, self.api.max_page_size.max(1))
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

/// Emit an audit line when audit logging is enabled for this environment
#[macro_export]
macro_rules! audit {
    ($($arg:tt)+) => {
        if $crate::config::CONFIG.security.enable_audit_logging {
            tracing::info!(target: "tenantflow_api::audit", $($arg)+);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.api.max_page_size, 1000);
        assert!(!config.security.jwt_secret.is_empty());
        assert_eq!(config.invitations.expiry_days, 7);
        assert_eq!(config.api.port, DEFAULT_PORT);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert!(!config.database.run_migrations);
        assert!(config.security.enable_audit_logging);
        assert_eq!(config.api.max_page_size, 100);
    }

    #[test]
    fn page_size_is_clamped() {
        let config = AppConfig::production();
        assert_eq!(config.page_size(None), 25);
        assert_eq!(config.page_size(Some(0)), 1);
        assert_eq!(config.page_size(Some(-5)), 1);
        assert_eq!(config.page_size(Some(40)), 40);
        assert_eq!(config.page_size(Some(10_000)), 100);
    }

    #[test]
    fn jwt_secret_is_not_serialized() {
        let value = serde_json::to_value(AppConfig::development().security).unwrap();
        assert!(value.get("jwt_secret").is_none());
        assert!(value.get("jwt_expiry_hours").is_some());
    }
}
