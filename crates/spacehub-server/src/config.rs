//! Server configuration.
//!
//! Built once at startup from defaults, an optional TOML file and
//! `SPACEHUB_*` environment variables (in that order of precedence),
//! then passed into constructors.

use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use spacehub_auth::AuthConfig;
use spacehub_db::DbConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// SurrealDB section of the configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub identity_database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub pool_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let db = DbConfig::default();
        Self {
            url: db.url,
            namespace: db.namespace,
            identity_database: db.identity_database,
            username: db.username,
            password: db.password,
            pool_size: db.pool_size,
        }
    }
}

impl DatabaseConfig {
    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            url: self.url.clone(),
            namespace: self.namespace.clone(),
            identity_database: self.identity_database.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            pool_size: self.pool_size,
        }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    /// Re-provision every organization's namespace at startup.
    pub repair_namespaces_on_startup: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            repair_namespaces_on_startup: true,
        }
    }
}

fn parsed<T: FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnv {
            key: key.into(),
            value,
        })
}

impl ServerConfig {
    /// Load defaults, then `path` if given, then the process environment,
    /// and validate the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `SPACEHUB_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SPACEHUB_HOST") {
            self.host = v;
        }
        if let Some(v) = lookup("SPACEHUB_PORT") {
            self.port = parsed("SPACEHUB_PORT", v)?;
        }
        if let Some(v) = lookup("SPACEHUB_DB_URL") {
            self.database.url = v;
        }
        if let Some(v) = lookup("SPACEHUB_DB_NAMESPACE") {
            self.database.namespace = v;
        }
        if let Some(v) = lookup("SPACEHUB_DB_DATABASE") {
            self.database.identity_database = v;
        }
        if let Some(v) = lookup("SPACEHUB_DB_USER") {
            self.database.username = Some(v);
        }
        if let Some(v) = lookup("SPACEHUB_DB_PASSWORD") {
            self.database.password = Some(v);
        }
        if let Some(v) = lookup("SPACEHUB_DB_POOL_SIZE") {
            self.database.pool_size = parsed("SPACEHUB_DB_POOL_SIZE", v)?;
        }
        if let Some(v) = lookup("SPACEHUB_JWT_SECRET") {
            self.auth.jwt_secret = v;
        }
        if let Some(v) = lookup("SPACEHUB_ACCESS_TOKEN_TTL_SECS") {
            self.auth.access_token_lifetime_secs = parsed("SPACEHUB_ACCESS_TOKEN_TTL_SECS", v)?;
        }
        if let Some(v) = lookup("SPACEHUB_REFRESH_TOKEN_TTL_SECS") {
            self.auth.refresh_token_lifetime_secs = parsed("SPACEHUB_REFRESH_TOKEN_TTL_SECS", v)?;
        }
        if let Some(v) = lookup("SPACEHUB_PASSWORD_PEPPER") {
            self.auth.pepper = Some(v);
        }
        if let Some(v) = lookup("SPACEHUB_REPAIR_NAMESPACES") {
            self.repair_namespaces_on_startup = parsed("SPACEHUB_REPAIR_NAMESPACES", v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.database.pool_size == 0 {
            return Err(ConfigError::Invalid("database.pool_size must be > 0".into()));
        }
        Ok(())
    }

    /// Returns the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.database.url, "mem://");
        assert!(config.repair_namespaces_on_startup);
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = ServerConfig::from_toml(
            r#"
            port = 9000

            [database]
            url = "ws://db:8000"
            pool_size = 4

            [auth]
            jwt_secret = "0123456789abcdef0123456789abcdef"
            access_token_lifetime_secs = 600
            "#,
        )
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.database.url, "ws://db:8000");
        assert_eq!(config.database.namespace, "spacehub");
        assert_eq!(config.auth.access_token_lifetime_secs, 600);
        assert_eq!(config.auth.refresh_token_lifetime_secs, 604_800);
        config.validate().unwrap();
    }

    #[test]
    fn env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("SPACEHUB_PORT", "8080"),
            ("SPACEHUB_JWT_SECRET", SECRET),
            ("SPACEHUB_REPAIR_NAMESPACES", "false"),
        ]
        .into_iter()
        .collect();

        let mut config = ServerConfig::from_toml("port = 9000").unwrap();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.auth.jwt_secret, SECRET);
        assert!(!config.repair_namespaces_on_startup);
    }

    #[test]
    fn malformed_env_value_is_reported() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_env(|key| (key == "SPACEHUB_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn missing_secret_fails_validation() {
        assert!(ServerConfig::default().validate().is_err());
    }
}
