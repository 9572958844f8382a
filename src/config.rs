use std::net::IpAddr;
use std::time::Duration;

use crate::store::postgres::PoolSettings;

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreBackend,
    pub host: IpAddr,
    pub port: u16,
    pub frontend_url: String,
    pub pool: PoolSettings,
    pub expose_reset_link: bool,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    Memory,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let store = match env_or("ZENI_STORE", "postgres").as_str() {
            "postgres" => StoreBackend::Postgres {
                database_url: env_required("DATABASE_URL")?,
            },
            "memory" => StoreBackend::Memory,
            other => return Err(format!("Invalid ZENI_STORE: {other}")),
        };

        let host: IpAddr = env_or("ZENI_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid ZENI_HOST: {e}"))?;

        let port: u16 = env_or("ZENI_PORT", "8001")
            .parse()
            .map_err(|e| format!("Invalid ZENI_PORT: {e}"))?;

        let frontend_url = env_or("ZENI_FRONTEND_URL", "http://localhost:3000")
            .trim_end_matches('/')
            .to_string();

        let max_connections: u32 = env_or("ZENI_DB_MAX_CONNECTIONS", "5")
            .parse()
            .map_err(|e| format!("Invalid ZENI_DB_MAX_CONNECTIONS: {e}"))?;
        if max_connections == 0 {
            return Err("ZENI_DB_MAX_CONNECTIONS must be at least 1".to_string());
        }

        let acquire_timeout_secs: u64 = env_or("ZENI_DB_ACQUIRE_TIMEOUT_SECS", "5")
            .parse()
            .map_err(|e| format!("Invalid ZENI_DB_ACQUIRE_TIMEOUT_SECS: {e}"))?;

        let expose_reset_link = match env_or("ZENI_EXPOSE_RESET_LINK", "false").as_str() {
            "true" | "1" => true,
            "false" | "0" => false,
            other => return Err(format!("Invalid ZENI_EXPOSE_RESET_LINK: {other}")),
        };

        let log_level = env_or("ZENI_LOG_LEVEL", "info");

        Ok(Config {
            store,
            host,
            port,
            frontend_url,
            pool: PoolSettings {
                max_connections,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
            },
            expose_reset_link,
            log_level,
        })
    }

    pub fn reset_link(&self, token: &str) -> String {
        format!("{}/reset-password?token={token}", self.frontend_url)
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
