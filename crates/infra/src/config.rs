//! Configuration loading and representation.
//!
//! Values come from the process environment (after loading an optional `.env`
//! file). Every value is validated up front so a bad deployment fails at startup
//! instead of on the first request.

use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable '{0}'")]
    Missing(String),

    #[error("invalid value for '{var}': {reason}")]
    Invalid { var: String, reason: String },
}

/// Deployment environment. Destructive maintenance operations are refused in `Production`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl core::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Development),
            "test" => Ok(Environment::Test),
            "prod" | "production" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{other}' (expected dev, test or prod)")),
        }
    }
}

/// Postgres connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub name: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .database(&self.name)
    }
}

// Manual impl: the password must never reach the logs.
impl core::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Which product store the application runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres(DatabaseConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub environment: Environment,
    pub store: StoreBackend,
    pub server_host: String,
    pub server_port: u16,
}

impl AppConfig {
    /// Load configuration from the process environment (and `.env`, if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |var: &str| get(var).ok_or_else(|| ConfigError::Missing(var.to_string()));
        let parse = |var: &str, raw: String| {
            raw.parse::<u32>().map_err(|e| ConfigError::Invalid {
                var: var.to_string(),
                reason: e.to_string(),
            })
        };
        let port = |var: &str, raw: String| {
            raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                var: var.to_string(),
                reason: e.to_string(),
            })
        };

        let environment = match get("APP_ENV") {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                var: "APP_ENV".to_string(),
                reason,
            })?,
            None => Environment::Development,
        };

        let store = match get("STORE_BACKEND").as_deref().unwrap_or("postgres") {
            "memory" => StoreBackend::Memory,
            "postgres" => StoreBackend::Postgres(DatabaseConfig {
                host: require("DB_HOST")?,
                port: port("DB_PORT", require("DB_PORT")?)?,
                username: require("DB_USERNAME")?,
                password: require("DB_PASSWORD")?,
                name: require("DB_NAME")?,
                max_connections: match get("DB_MAX_CONNECTIONS") {
                    Some(raw) => parse("DB_MAX_CONNECTIONS", raw)?,
                    None => 5,
                },
            }),
            other => {
                return Err(ConfigError::Invalid {
                    var: "STORE_BACKEND".to_string(),
                    reason: format!("unknown backend '{other}' (expected postgres or memory)"),
                });
            }
        };

        let server_host = get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let server_port = match get("SERVER_PORT") {
            Some(raw) => port("SERVER_PORT", raw)?,
            None => 8080,
        };

        Ok(Self {
            environment,
            store,
            server_host,
            server_port,
        })
    }

    /// In-memory configuration for tests and local experiments.
    pub fn in_memory(environment: Environment) -> Self {
        Self {
            environment,
            store: StoreBackend::Memory,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| vars.get(var).cloned()
    }

    const DB_VARS: &[(&str, &str)] = &[
        ("DB_HOST", " localhost "),
        ("DB_PORT", "5432"),
        ("DB_USERNAME", "postgres"),
        ("DB_PASSWORD", "secret"),
        ("DB_NAME", "catalog"),
    ];

    #[test]
    fn postgres_config_is_trimmed_and_parsed() {
        let cfg = AppConfig::from_lookup(lookup(DB_VARS)).unwrap();
        assert_eq!(cfg.environment, Environment::Development);
        assert_eq!(cfg.bind_address(), "0.0.0.0:8080");
        match cfg.store {
            StoreBackend::Postgres(db) => {
                assert_eq!(db.host, "localhost");
                assert_eq!(db.port, 5432);
                assert_eq!(db.max_connections, 5);
            }
            other => panic!("expected postgres backend, got {other:?}"),
        }
    }

    #[test]
    fn missing_database_variable_fails() {
        let vars: Vec<_> = DB_VARS.iter().copied().filter(|(k, _)| *k != "DB_NAME").collect();
        let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DB_NAME".to_string()));
    }

    #[test]
    fn non_numeric_port_fails() {
        let mut vars = DB_VARS.to_vec();
        vars.retain(|(k, _)| *k != "DB_PORT");
        vars.push(("DB_PORT", "five"));
        let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "DB_PORT"));
    }

    #[test]
    fn memory_backend_needs_no_database() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("STORE_BACKEND", "memory"),
            ("APP_ENV", "prod"),
            ("SERVER_PORT", "3000"),
        ]))
        .unwrap();
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert!(cfg.environment.is_production());
        assert_eq!(cfg.server_port, 3000);
    }

    #[test]
    fn unknown_environment_fails() {
        let err = AppConfig::from_lookup(lookup(&[("STORE_BACKEND", "memory"), ("APP_ENV", "staging")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "APP_ENV"));
    }

    #[test]
    fn debug_output_redacts_password() {
        let cfg = AppConfig::from_lookup(lookup(DB_VARS)).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
