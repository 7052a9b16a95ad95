use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub password_hash_cost: u32,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(v) = env::var("FILTER_DEBUG_LOGGING") {
            self.filter.debug_logging = v.parse().unwrap_or(self.filter.debug_logging);
        }

        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
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
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = v.parse().unwrap_or(self.database.enable_query_logging);
        }

        // JOBLY_API_PORT wins over the generic PORT
        if let Some(port) = env::var("JOBLY_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        if let Ok(v) = env::var("SECRET_KEY") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_PASSWORD_HASH_COST") {
            self.security.password_hash_cost = v.parse().unwrap_or(self.security.password_hash_cost);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            filter: FilterConfig { debug_logging: true },
            database: DatabaseConfig {
                url: "postgres://localhost:5432/jobly".to_string(),
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
                enable_query_logging: true,
            },
            api: ApiConfig {
                port: 3001,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: "secret-dev".to_string(),
                jwt_expiry_hours: 24 * 7,
                // low on purpose, dev machines rebuild users constantly
                password_hash_cost: 4,
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            filter: FilterConfig { debug_logging: false },
            database: DatabaseConfig {
                url: "postgres://localhost:5432/jobly".to_string(),
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
                enable_query_logging: true,
            },
            api: ApiConfig {
                port: 3001,
                enable_request_logging: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                password_hash_cost: 10,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            filter: FilterConfig { debug_logging: false },
            database: DatabaseConfig {
                url: "postgres://localhost:5432/jobly".to_string(),
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
                enable_query_logging: false,
            },
            api: ApiConfig {
                port: 3001,
                enable_request_logging: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                password_hash_cost: 12,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.filter.debug_logging);
        assert!(!config.security.jwt_secret.is_empty());
        assert!(config.database.run_migrations);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.filter.debug_logging);
        // production must bring its own SECRET_KEY
        assert!(config.security.jwt_secret.is_empty());
        assert!(config.security.password_hash_cost > AppConfig::development().security.password_hash_cost);
    }

    #[test]
    fn test_secret_is_not_serialized() {
        let value = serde_json::to_value(AppConfig::development()).unwrap();
        assert!(value["security"].get("jwt_secret").is_none());
    }
}
