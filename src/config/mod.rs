use crate::core::{AppError, Result};
use std::env;
use std::str::FromStr;

pub mod database;
pub mod server;

pub use database::{run_migrations, DatabaseConfig};
pub use server::ServerConfig;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    /// Run the overdue sweep before serving a schedule
    pub overdue_sweep_on_read: bool,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Argon2 PHC string of the administrator API key
    pub admin_api_key_hash: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            app: AppConfig {
                env: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
                log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                overdue_sweep_on_read: parse_or(&lookup, "OVERDUE_SWEEP_ON_READ", false)?,
            },
            database: DatabaseConfig {
                url: required(&lookup, "DATABASE_URL")?,
                pool_size: parse_or(&lookup, "DATABASE_POOL_SIZE", 10)?,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 20)?,
            },
            server: ServerConfig::new(
                lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                parse_or(&lookup, "SERVER_PORT", 8080)?,
                lookup("SERVER_WORKERS")
                    .map(|raw| raw.trim().parse::<usize>())
                    .transpose()
                    .map_err(|_| AppError::Configuration("Invalid SERVER_WORKERS".to_string()))?,
            ),
            security: SecurityConfig {
                admin_api_key_hash: required(&lookup, "ADMIN_API_KEY_HASH")?,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.database.max_connections == 0 {
            return Err(AppError::Configuration(
                "DATABASE_MAX_CONNECTIONS must be greater than 0".to_string(),
            ));
        }

        if self.database.pool_size > self.database.max_connections {
            return Err(AppError::Configuration(
                "DATABASE_POOL_SIZE cannot exceed DATABASE_MAX_CONNECTIONS".to_string(),
            ));
        }

        if self.server.port == 0 {
            return Err(AppError::Configuration(
                "SERVER_PORT must be greater than 0".to_string(),
            ));
        }

        if argon2::PasswordHash::new(&self.security.admin_api_key_hash).is_err() {
            return Err(AppError::Configuration(
                "ADMIN_API_KEY_HASH is not a valid argon2 hash".to_string(),
            ));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app.env == "production"
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).ok_or_else(|| AppError::Configuration(format!("{} not set", key)))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", key))),
        None => Ok(default),
    }
}
