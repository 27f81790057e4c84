// config.rs
use std::env;

use crate::errors::{AppError, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_name: String,
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
    pub host: String,
    pub port: u16,
    /// Upper bound on referral id draws before signup gives up.
    pub referral_max_attempts: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(AppConfig {
            database_url: required("DATABASE_URL")?,
            database_name: env::var("DATABASE_NAME").unwrap_or_else(|_| "cricketdb".to_string()),
            jwt_secret: required("JWT_SECRET")?,
            token_ttl_secs: parsed("TOKEN_TTL_SECS", 86_400)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parsed("PORT", 8000)?,
            referral_max_attempts: parsed("REFERRAL_MAX_ATTEMPTS", 10)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| AppError::configuration(format!("{} must be set", key)))
}

fn parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::configuration(format!("{} must be a number, got {:?}", key, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests() -> Self {
        AppConfig {
            database_url: "mongodb://localhost:27017".to_string(),
            database_name: "cricketdb_test".to_string(),
            jwt_secret: "test-secret".to_string(),
            token_ttl_secs: 3600,
            host: "127.0.0.1".to_string(),
            port: 0,
            referral_max_attempts: 10,
        }
    }
}
