//! Application configuration module
//!
//! Handles loading and validating configuration from environment variables.

use serde::Deserialize;
use std::net::Ipv4Addr;
use thiserror::Error;

#[derive(Error, Debug)]
#[allow(dead_code)]
pub enum ConfigError {
    #[error("Failed to load environment variables: {0}")]
    EnvLoad(#[from] dotenvy::Error),

    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: Ipv4Addr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Ipv4Addr::new(0, 0, 0, 0), // Bind to 0.0.0.0 for Docker
            port: 3001,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_pool_size: usize,
    /// Require TLS for the connection (`sslmode=require` in the URL)
    pub require_tls: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "surveygenie".to_string(),
            max_pool_size: 10,
            require_tls: false,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Token signing and password hashing settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub secret_key: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: "secret-dev".to_string(),
            token_ttl_hours: 24,
            bcrypt_cost: 12,
        }
    }
}

impl AuthConfig {
    /// Cheap hashing for test runs; bcrypt rejects costs below 4.
    pub fn for_tests() -> Self {
        Self {
            bcrypt_cost: 4,
            ..Self::default()
        }
    }
}

/// Complete application settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (ignore errors if file not found)
        let _ = dotenvy::dotenv();

        let testing = std::env::var("APP_ENV").map(|v| v == "test").unwrap_or(false);

        let server = ServerConfig {
            host: std::env::var("HOST")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(|| ServerConfig::default().port),
        };

        // Test runs point at their own database
        let url_var = if testing { "TEST_DATABASE_URL" } else { "DATABASE_URL" };
        let database = if let Ok(database_url) = std::env::var(url_var) {
            Self::parse_database_url(&database_url)?
        } else {
            DatabaseConfig {
                host: std::env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: std::env::var("DB_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(5432),
                user: std::env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string()),
                password: std::env::var("DB_PASS").unwrap_or_default(),
                database: std::env::var("DB_NAME")
                    .unwrap_or_else(|_| DatabaseConfig::default().database),
                max_pool_size: max_pool_size_from_env(),
                require_tls: false,
            }
        };

        let cors = CorsConfig {
            allowed_origins: std::env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|| CorsConfig::default().allowed_origins),
        };

        let defaults = if testing { AuthConfig::for_tests() } else { AuthConfig::default() };
        let auth = AuthConfig {
            secret_key: std::env::var("SECRET_KEY").unwrap_or(defaults.secret_key),
            token_ttl_hours: std::env::var("TOKEN_TTL_HOURS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.token_ttl_hours),
            bcrypt_cost: match std::env::var("BCRYPT_COST") {
                Ok(raw) => Self::parse_bcrypt_cost(&raw)?,
                Err(_) => defaults.bcrypt_cost,
            },
        };

        Ok(Self {
            server,
            database,
            cors,
            auth,
        })
    }

    fn parse_bcrypt_cost(raw: &str) -> Result<u32, ConfigError> {
        let cost: u32 = raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(format!("BCRYPT_COST is not a number: {}", raw)))?;
        if !(4..=31).contains(&cost) {
            return Err(ConfigError::InvalidValue(format!(
                "BCRYPT_COST must be between 4 and 31, got {}",
                cost
            )));
        }
        Ok(cost)
    }

    /// Parse a DATABASE_URL connection string (postgresql://...)
    fn parse_database_url(url: &str) -> Result<DatabaseConfig, ConfigError> {
        match url::Url::parse(url) {
            Ok(parsed) => {
                let host = parsed.host_str()
                    .ok_or_else(|| ConfigError::InvalidValue("Missing host in DATABASE_URL".to_string()))?
                    .to_string();

                let port = parsed.port().unwrap_or(5432);

                let user = parsed.username().to_string();
                let password = parsed.password()
                    .map(|p| p.to_string())
                    .unwrap_or_default();

                let database = parsed.path()
                    .trim_start_matches('/')
                    .to_string();
                if database.is_empty() {
                    return Err(ConfigError::MissingVar("database name in DATABASE_URL".to_string()));
                }

                let require_tls = parsed
                    .query_pairs()
                    .any(|(k, v)| k == "sslmode" && v == "require");

                Ok(DatabaseConfig {
                    host,
                    port,
                    user,
                    password,
                    database,
                    max_pool_size: max_pool_size_from_env(),
                    require_tls,
                })
            }
            Err(_) => Err(ConfigError::InvalidValue(
                "Invalid DATABASE_URL format (expected postgresql://...)".to_string()
            ))
        }
    }
}

fn max_pool_size_from_env() -> usize {
    std::env::var("DB_MAX_CONNECTIONS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.host, Ipv4Addr::new(0, 0, 0, 0));
        assert_eq!(config.port, 3001);
    }

    #[test]
    fn test_default_database_config() {
        let config = DatabaseConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert!(!config.require_tls);
    }

    #[test]
    fn test_parse_database_url() {
        let config =
            Settings::parse_database_url("postgresql://survey:pw@db.internal:5433/surveys").unwrap();
        assert_eq!(config.host, "db.internal");
        assert_eq!(config.port, 5433);
        assert_eq!(config.user, "survey");
        assert_eq!(config.password, "pw");
        assert_eq!(config.database, "surveys");
        assert!(!config.require_tls);
    }

    #[test]
    fn test_parse_database_url_sslmode() {
        let config =
            Settings::parse_database_url("postgres://u:p@host/db?sslmode=require").unwrap();
        assert_eq!(config.port, 5432);
        assert!(config.require_tls);
    }

    #[test]
    fn test_parse_database_url_rejects_garbage() {
        assert!(Settings::parse_database_url("not a url").is_err());
        assert!(Settings::parse_database_url("postgres://u:p@host").is_err());
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        assert_eq!(Settings::parse_bcrypt_cost("10").unwrap(), 10);
        assert!(Settings::parse_bcrypt_cost("1").is_err());
        assert!(Settings::parse_bcrypt_cost("abc").is_err());
        assert_eq!(AuthConfig::for_tests().bcrypt_cost, 4);
    }
}
