use anyhow::Context;
use std::env;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,
    pub app_env: String,

    // PostgreSQL
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_connect_timeout_secs: u64,

    // Store operations
    pub store_timeout_ms: u64,
    pub fetch_limit: i64,
}

impl Config {
    /// Load configuration from environment variables with defaults.
    ///
    /// `DATABASE_URL` has no default: the service cannot run without a store.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .context("DATABASE_URL environment variable is not set")?;

        Ok(Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),

            // PostgreSQL
            database_url,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .unwrap_or(100),
            db_connect_timeout_secs: env::var("DB_CONNECT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),

            // Store operations
            store_timeout_ms: env::var("STORE_TIMEOUT_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5_000), // 5 seconds

            fetch_limit: env::var("FETCH_LIMIT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
        })
    }

    /// Upper bound for a single store round trip
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

#[cfg(test)]
impl Config {
    /// Config for tests that never touch the environment
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            app_env: "test".to_string(),
            database_url: "postgres://localhost/ocular_test".to_string(),
            db_max_connections: 1,
            db_connect_timeout_secs: 1,
            store_timeout_ms: 5_000,
            fetch_limit: 10,
        }
    }
}
