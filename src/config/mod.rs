use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_slow_query_warning: bool,
    pub slow_query_threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub max_request_size_bytes: usize,
    pub default_page_size: i64,
    pub max_page_size: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_expiry_hours: u64,
    pub cors_origins: Vec<String>,
    pub bcrypt_cost: u32,
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
        let db = &mut self.database;
        if let Ok(v) = env::var("DATABASE_URL") {
            db.url = v;
        }
        env_parsed("DATABASE_MAX_CONNECTIONS", &mut db.max_connections);
        env_parsed("DATABASE_CONNECTION_TIMEOUT", &mut db.connection_timeout);
        env_parsed("DATABASE_ENABLE_SLOW_QUERY_WARNING", &mut db.enable_slow_query_warning);
        env_parsed("DATABASE_SLOW_QUERY_THRESHOLD_MS", &mut db.slow_query_threshold_ms);

        let api = &mut self.api;
        env_parsed("PORT", &mut api.port);
        env_parsed("AGENCY_API_PORT", &mut api.port);
        env_parsed("API_ENABLE_REQUEST_LOGGING", &mut api.enable_request_logging);
        env_parsed("API_MAX_REQUEST_SIZE_BYTES", &mut api.max_request_size_bytes);
        env_parsed("API_DEFAULT_PAGE_SIZE", &mut api.default_page_size);
        env_parsed("API_MAX_PAGE_SIZE", &mut api.max_page_size);

        let security = &mut self.security;
        if let Ok(v) = env::var("JWT_SECRET") {
            security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_ISSUER") {
            security.jwt_issuer = v;
        }
        env_parsed("SECURITY_JWT_EXPIRY_HOURS", &mut security.jwt_expiry_hours);
        env_parsed("SECURITY_BCRYPT_COST", &mut security.bcrypt_cost);
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: "postgres://postgres@localhost:5432/agency".to_string(),
                max_connections: 10,
                connection_timeout: 30,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 100,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                default_page_size: 50,
                max_page_size: 1000,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_issuer: "agency-api".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                bcrypt_cost: 4,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 20,
                connection_timeout: 10,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 500,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
                max_request_size_bytes: 5 * 1024 * 1024, // 5MB
                default_page_size: 50,
                max_page_size: 500,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_issuer: "agency-api".to_string(),
                jwt_expiry_hours: 24,
                cors_origins: vec!["https://staging.example.com".to_string()],
                bcrypt_cost: 10,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 50,
                connection_timeout: 5,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 1000,
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
                max_request_size_bytes: 2 * 1024 * 1024, // 2MB
                default_page_size: 25,
                max_page_size: 200,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_issuer: "agency-api".to_string(),
                jwt_expiry_hours: 12,
                cors_origins: vec!["https://app.example.com".to_string()],
                bcrypt_cost: 12,
            },
        }
    }

    /// Clamp a requested page size into `1..=max_page_size`, falling back to the default.
    pub fn page_size(&self, requested: Option<i64>) -> i64 {
        match requested {
            Some(n) if n > 0 => n.min(self.api.max_page_size),
            _ => self.api.default_page_size,
        }
    }
}

/// Overwrite `slot` when `key` is set and parses; malformed values keep the default
fn env_parsed<T: FromStr>(key: &str, slot: &mut T) {
    if let Some(v) = env::var(key).ok().and_then(|s| s.trim().parse().ok()) {
        *slot = v;
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
