use chrono::Duration;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::services::registry::{DEFAULT_LOCK_TIMEOUT_MS, DEFAULT_TOTAL_SEATS};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("{0}")]
    OutOfRange(String),
}

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub registry: RegistryConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

// Настройки реестра мест. Фиксируются при старте и не меняются.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    pub total_seats: u32,
    pub lock_timeout_ms: u64,
}

impl RegistryConfig {
    pub fn lock_duration(&self) -> Duration {
        i64::try_from(self.lock_timeout_ms)
            .ok()
            .and_then(Duration::try_milliseconds)
            .unwrap_or(Duration::MAX)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            total_seats: DEFAULT_TOTAL_SEATS,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Собирает конфигурацию из произвольного источника переменных.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Config {
            app: AppConfig {
                host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "PORT", 3000, "port number")?,
                environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
                rust_log: lookup("RUST_LOG")
                    .unwrap_or_else(|| "seat_lock=debug,tower_http=debug".to_string()),
            },
            registry: RegistryConfig {
                total_seats: parse_or(&lookup, "SEAT_COUNT", DEFAULT_TOTAL_SEATS, "number")?,
                lock_timeout_ms: parse_or(
                    &lookup,
                    "LOCK_TIMEOUT_MS",
                    DEFAULT_LOCK_TIMEOUT_MS,
                    "number of milliseconds",
                )?,
            },
        };

        if config.registry.total_seats == 0 {
            return Err(ConfigError::OutOfRange(
                "SEAT_COUNT must be at least 1".to_string(),
            ));
        }
        if i64::try_from(config.registry.lock_timeout_ms).is_err() {
            return Err(ConfigError::OutOfRange(
                "LOCK_TIMEOUT_MS is too large".to_string(),
            ));
        }

        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T, expected: &'static str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value: raw,
        }),
    }
}
