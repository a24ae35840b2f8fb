//! MySQL driver implementation

use async_trait::async_trait;
use std::sync::Arc;
use tabula_core::{Connection, ConnectionConfig, DatabaseDriver, Result};

use crate::MySqlConnection;

const DEFAULT_PORT: u16 = 3306;

/// MySQL database driver
pub struct MySqlDriver;

impl MySqlDriver {
    /// Create a new MySQL driver instance
    pub fn new() -> Self {
        tracing::debug!("MySQL driver initialized");
        Self
    }
}

impl Default for MySqlDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for MySqlDriver {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn display_name(&self) -> &'static str {
        "MySQL"
    }

    fn default_port(&self) -> Option<u16> {
        Some(DEFAULT_PORT)
    }

    #[tracing::instrument(skip(self, config), fields(host = config.get_string("host").as_deref(), database = config.get_string("database").as_deref()))]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let host = config
            .get_string("host")
            .unwrap_or_else(|| "localhost".to_string());
        let port = if config.port > 0 { config.port } else { DEFAULT_PORT };
        let database = config.get_string("database");
        let user = config.get_string("username");
        let password = config.get_string("password");

        let conn = MySqlConnection::connect(
            &host,
            port,
            database.as_deref(),
            user.as_deref(),
            password.as_deref(),
        )
        .await
        .inspect_err(|e| tracing::error!(error = %e, "failed to connect to MySQL database"))?;

        Ok(Arc::new(conn))
    }
}
