//! SQLite driver implementation

use async_trait::async_trait;
use std::sync::Arc;
use tabula_core::{Connection, ConnectionConfig, DatabaseDriver, Result, TabulaError};

use crate::SqliteConnection;

/// SQLite database driver
pub struct SqliteDriver;

impl SqliteDriver {
    /// Create a new SQLite driver instance
    pub fn new() -> Self {
        tracing::debug!("SQLite driver initialized");
        Self
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn display_name(&self) -> &'static str {
        "SQLite"
    }

    #[tracing::instrument(skip(self, config), fields(path = config.get_string("path").as_deref()))]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let path = config.get_string("path").ok_or_else(|| {
            TabulaError::Configuration(
                "SQLite requires a 'path' or 'database' setting, e.g. /path/to/database.db or :memory:"
                    .into(),
            )
        })?;

        let conn = SqliteConnection::open(&path)
            .inspect_err(|e| tracing::error!(error = %e, "failed to connect to SQLite database"))?;

        tracing::info!(path = %path, "SQLite connection created");
        Ok(Arc::new(conn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connects_to_an_in_memory_database() {
        let conn = SqliteDriver::new()
            .connect(&ConnectionConfig::new_sqlite(":memory:"))
            .await
            .unwrap();
        assert_eq!(conn.driver_name(), "sqlite");
        let result = conn.query("SELECT 1 AS one", &[]).await.unwrap();
        assert_eq!(result.rows[0].i64_by_name("one"), Some(1));
    }

    #[tokio::test]
    async fn missing_path_is_a_configuration_error() {
        let err = match SqliteDriver::new().connect(&ConnectionConfig::new("sqlite")).await {
            Ok(_) => panic!("connected without a path"),
            Err(err) => err,
        };
        assert!(matches!(err, TabulaError::Configuration(_)));
    }
}
