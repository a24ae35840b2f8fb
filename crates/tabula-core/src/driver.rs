//! Driver trait and connection configuration

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::{Connection, Result, TabulaError};

/// Connection configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Driver ID (e.g., "mysql", "sqlite")
    pub driver: String,
    /// Host address (empty for file-based databases)
    pub host: String,
    /// Port number (0 for the driver default)
    pub port: u16,
    /// Database name or file path
    pub database: Option<String>,
    #[serde(alias = "user")]
    pub username: Option<String>,
    pub password: Option<String>,
    /// Additional connection parameters
    pub params: HashMap<String, String>,
}

impl ConnectionConfig {
    /// Create a new configuration with default values
    pub fn new(driver: &str) -> Self {
        Self {
            driver: driver.to_string(),
            ..Default::default()
        }
    }

    /// Create a SQLite configuration
    pub fn new_sqlite(database_path: &str) -> Self {
        let mut config = Self::new("sqlite");
        config.database = Some(database_path.to_string());
        config
    }

    /// Create a MySQL configuration
    pub fn new_mysql(host: &str, port: u16, database: &str, username: &str) -> Self {
        let mut config = Self::new("mysql");
        config.host = host.to_string();
        config.port = port;
        config.database = Some(database.to_string());
        config.username = Some(username.to_string());
        config
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set a connection parameter
    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Get a string parameter
    pub fn get_string(&self, key: &str) -> Option<String> {
        if let Some(val) = self.params.get(key) {
            return Some(val.clone());
        }
        match key {
            "host" if !self.host.is_empty() => Some(self.host.clone()),
            "database" | "path" => self.database.clone(),
            "username" | "user" => self.username.clone(),
            "password" => self.password.clone(),
            _ => None,
        }
    }

    /// Load a configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            TabulaError::Configuration(msg) => {
                TabulaError::Configuration(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| TabulaError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read `TABULA_DB_*` variables from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from any `TABULA_DB_*` lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let driver = lookup("TABULA_DB_DRIVER").ok_or_else(|| {
            TabulaError::Configuration("TABULA_DB_DRIVER is not set".into())
        })?;
        let port = match lookup("TABULA_DB_PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| {
                TabulaError::Configuration(format!("invalid TABULA_DB_PORT '{}': {}", raw, e))
            })?,
            None => 0,
        };

        let config = Self {
            driver,
            host: lookup("TABULA_DB_HOST").unwrap_or_default(),
            port,
            database: lookup("TABULA_DB_NAME"),
            username: lookup("TABULA_DB_USER"),
            password: lookup("TABULA_DB_PASSWORD"),
            params: HashMap::new(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.driver.trim().is_empty() {
            return Err(TabulaError::Configuration("driver must not be empty".into()));
        }
        Ok(())
    }
}

/// A driver that can open connections for one platform
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Driver identifier matched against [`ConnectionConfig::driver`]
    fn name(&self) -> &'static str;

    /// Human-readable name (e.g., "MySQL", "SQLite")
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Default connection port (None for file-based databases like SQLite)
    fn default_port(&self) -> Option<u16> {
        None
    }

    /// Open a connection
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;
}
