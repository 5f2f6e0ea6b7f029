use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub generator: GeneratorConfig,
    pub cdn_uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Base URI of the identifier generator service.
    pub uri: String,
    pub timeout_ms: u64,
    /// Port for the local `id_generator` binary.
    pub listen_port: u16,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed_var_or<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| {
            AppError::ConfigurationError(format!("{} has an invalid value '{}'", key, raw))
        }),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            database: DatabaseConfig {
                url: var_or("DATABASE_URL", "sqlite:event_directory.db?mode=rwc"),
                max_connections: parsed_var_or("DATABASE_MAX_CONNECTIONS", 5)?,
            },
            server: ServerConfig {
                host: var_or("SERVER_HOST", "0.0.0.0"),
                port: parsed_var_or("SERVER_PORT", 3000)?,
            },
            generator: GeneratorConfig {
                uri: var_or("ID_GENERATOR_URI", "http://127.0.0.1:4000"),
                timeout_ms: parsed_var_or("ID_GENERATOR_TIMEOUT_MS", 5000)?,
                listen_port: parsed_var_or("GENERATOR_PORT", 4000)?,
            },
            cdn_uri: var_or("CDN_URI", "https://cdn.localhost/"),
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn generator_timeout(&self) -> Duration {
        Duration::from_millis(self.generator.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_var_falls_back_and_rejects_garbage() {
        env::remove_var("EVENT_DIRECTORY_TEST_UNSET");
        assert_eq!(parsed_var_or("EVENT_DIRECTORY_TEST_UNSET", 7u32).unwrap(), 7);

        env::set_var("EVENT_DIRECTORY_TEST_BAD_PORT", "eighty");
        assert!(matches!(
            parsed_var_or::<u16>("EVENT_DIRECTORY_TEST_BAD_PORT", 80),
            Err(AppError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_server_address() {
        let config = Config {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
                max_connections: 1,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            generator: GeneratorConfig {
                uri: "http://127.0.0.1:4000".to_string(),
                timeout_ms: 250,
                listen_port: 4000,
            },
            cdn_uri: "https://cdn.localhost/".to_string(),
        };
        assert_eq!(config.server_address(), "127.0.0.1:8080");
        assert_eq!(config.generator_timeout(), Duration::from_millis(250));
    }
}
