//! Driver registry for managing available database drivers

use std::collections::HashMap;
use std::sync::Arc;
use tabula_core::{Connection, ConnectionConfig, DatabaseDriver, Result, TabulaError};

use crate::DatabasePlatform;

/// Registry of available database drivers
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn DatabaseDriver>>,
}

impl DriverRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Create a registry with all built-in drivers registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(crate::sqlite::SqliteDriver::new()));
        registry.register(Arc::new(crate::mysql::MySqlDriver::new()));
        registry
    }

    /// Register a new driver
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>) {
        let name = driver.name().to_string();
        tracing::info!(driver = %name, "registering database driver");
        self.drivers.insert(name, driver);
    }

    /// Get a driver by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let driver = self.drivers.get(name).cloned();
        if driver.is_none() {
            tracing::warn!(driver = %name, "driver not found in registry");
        }
        driver
    }

    /// List all registered driver names, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drivers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Check if a driver is registered
    pub fn has(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }

    /// Open a connection and resolve its platform from `config.driver`
    #[tracing::instrument(skip(self, config), fields(driver = %config.driver))]
    pub async fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> Result<(DatabasePlatform, Arc<dyn Connection>)> {
        config.validate()?;
        let platform = DatabasePlatform::for_driver(&config.driver)?;
        let driver = self.get(platform_driver_name(&platform)).ok_or_else(|| {
            TabulaError::Configuration(format!("driver '{}' is not registered", config.driver))
        })?;

        let connection = driver.connect(config).await?;
        tracing::debug!(driver = %driver.display_name(), "connection ready");
        Ok((platform, connection))
    }
}

fn platform_driver_name(platform: &DatabasePlatform) -> &'static str {
    match platform {
        DatabasePlatform::MySql(_) => "mysql",
        DatabasePlatform::Sqlite(_) => "sqlite",
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Connect through the built-in drivers
pub async fn connect(config: &ConnectionConfig) -> Result<(DatabasePlatform, Arc<dyn Connection>)> {
    DriverRegistry::with_defaults().connect(config).await
}
