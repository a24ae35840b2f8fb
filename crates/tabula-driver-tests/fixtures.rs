//! Core test fixtures for parameterized schema manager testing.
//!
//! Tests use the [`TestDriver`] enum to pick a database and receive a
//! [`TestConnection`] bundling the platform, the live connection and the
//! user the connection authenticated as.
//!
//! SQLite always runs against a fresh temporary file. MySQL is opt-in:
//!
//! - `TABULA_TEST_MANUAL_CONTAINERS=1` connects to a server on 127.0.0.1:3307
//!   (database `tabula`, user `test_user`, password `test_password`)
//! - `TABULA_TEST_DOCKER=1` starts a container with testcontainers-rs
//!
//! With neither set, MySQL cases log a skip and pass.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tabula_driver_tests::fixtures::{TestDriver, test_connection};
//! use rstest::rstest;
//!
//! #[rstest]
//! #[case::mysql(TestDriver::Mysql)]
//! #[case::sqlite(TestDriver::Sqlite)]
//! #[tokio::test]
//! async fn lists_tables(#[case] driver: TestDriver) -> anyhow::Result<()> {
//!     let Some(tc) = test_connection(driver).await? else { return Ok(()) };
//!     let tables = tc.manager().list_tables(tc.conn()).await?;
//!     Ok(())
//! }
//! ```

use anyhow::{Context, Result};
use std::env;
use std::sync::{Arc, Once};
use tabula_core::{Connection, ConnectionConfig};
use tabula_drivers::{DatabasePlatform, DriverRegistry};
use tabula_schema::SchemaManager;
use tempfile::TempDir;

use crate::test_containers::mysql_container;

/// Test driver identifier for parameterized testing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestDriver {
    /// MySQL, manual or containerized
    Mysql,
    /// SQLite on a temporary file
    Sqlite,
}

impl TestDriver {
    /// Get the driver name as a string
    pub fn name(&self) -> &'static str {
        match self {
            TestDriver::Mysql => "mysql",
            TestDriver::Sqlite => "sqlite",
        }
    }

    /// Get the display name
    pub fn display_name(&self) -> &'static str {
        match self {
            TestDriver::Mysql => "MySQL",
            TestDriver::Sqlite => "SQLite",
        }
    }
}

/// A live connection plus everything a schema test needs around it
pub struct TestConnection {
    platform: DatabasePlatform,
    conn: Arc<dyn Connection>,
    username: Option<String>,
    // Keeps the SQLite file alive for the duration of the test
    _dir: Option<TempDir>,
}

impl TestConnection {
    /// Schema manager bound to this connection's platform
    pub fn manager(&self) -> SchemaManager<DatabasePlatform> {
        SchemaManager::new(self.platform)
    }

    /// The underlying connection
    pub fn conn(&self) -> &dyn Connection {
        self.conn.as_ref()
    }

    /// User the connection authenticated as, for platforms with users
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u8>().ok())
        .map(|v| v != 0)
        .unwrap_or(false)
}

/// Check if tests should use a manually managed MySQL server
fn use_manual_containers() -> bool {
    env_flag("TABULA_TEST_MANUAL_CONTAINERS")
}

/// Check if tests may start Docker containers
fn use_docker() -> bool {
    env_flag("TABULA_TEST_DOCKER")
}

async fn mysql_config() -> Result<Option<ConnectionConfig>> {
    if use_manual_containers() {
        let config = ConnectionConfig::new_mysql("127.0.0.1", 3307, "tabula", "test_user")
            .with_password("test_password");
        return Ok(Some(config));
    }
    if use_docker() {
        let info = mysql_container()
            .await
            .context("failed to start MySQL container - is Docker running?")?;
        return Ok(Some(info.config()));
    }
    Ok(None)
}

/// Create a test connection for the specified driver
///
/// Returns `Ok(None)` when the driver is not enabled in this environment;
/// callers return early so the case passes as a skip.
///
/// # Errors
///
/// Returns an error if the container fails to start, the connection fails
/// or the temporary SQLite directory cannot be created.
pub async fn test_connection(driver: TestDriver) -> Result<Option<TestConnection>> {
    initialize_logging();
    let registry = DriverRegistry::with_defaults();

    match driver {
        TestDriver::Mysql => {
            let Some(config) = mysql_config().await? else {
                tracing::info!(
                    driver = %driver.display_name(),
                    "skipping: set TABULA_TEST_DOCKER=1 or TABULA_TEST_MANUAL_CONTAINERS=1"
                );
                return Ok(None);
            };
            let username = config.username.clone();
            let (platform, conn) = registry
                .connect(&config)
                .await
                .context("failed to connect to MySQL")?;
            Ok(Some(TestConnection {
                platform,
                conn,
                username,
                _dir: None,
            }))
        }
        TestDriver::Sqlite => {
            let dir = tempfile::tempdir().context("failed to create temp directory")?;
            let path = dir.path().join("tabula.db");
            let path = path.to_str().context("invalid SQLite path")?;
            let (platform, conn) = registry
                .connect(&ConnectionConfig::new_sqlite(path))
                .await
                .context("failed to connect to SQLite")?;
            Ok(Some(TestConnection {
                platform,
                conn,
                username: None,
                _dir: Some(dir),
            }))
        }
    }
}

/// Name unique to one test run, so reruns against a manual server never collide
pub fn unique_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &id[..8])
}

fn initialize_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(
                "tabula_schema=debug,tabula_driver_mysql=debug,tabula_driver_sqlite=debug",
            )
        });
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .finish();

        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
