use std::{str::FromStr, time::Duration};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Settings {
    pub http_address: String,
    pub auth_address: String,
    pub database_url: String,
    pub database_max_connections: u32,
    pub auth_timeout: Duration,
    pub rust_log: String,
}

fn var_or(key: &str, default: &str) -> String {
    dotenv::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parsed_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match dotenv::var(key) {
        Ok(raw) => raw.trim().parse().with_context(|| format!("{key}={raw:?} is not valid")),
        Err(_) => Ok(default),
    }
}

impl Settings {
    /// Reads the environment, including a `.env` file when present.
    pub fn from_env() -> anyhow::Result<Settings> {
        Ok(Settings {
            http_address: var_or("HTTP_ADDRESS", "localhost:8080"),
            auth_address: var_or("AUTH_ADDRESS", "http://localhost:5000"),
            database_url: var_or("DATABASE_URL", "sqlite://chat.db?mode=rwc"),
            database_max_connections: parsed_or("DATABASE_MAX_CONNECTIONS", 16)?,
            auth_timeout: Duration::from_millis(parsed_or("AUTH_TIMEOUT_MS", 1000)?),
            rust_log: var_or("RUST_LOG", "hushline=info,tower_http=info"),
        })
    }
}
