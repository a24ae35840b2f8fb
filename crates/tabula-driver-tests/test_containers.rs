//! Docker container management for integration tests.
//!
//! The MySQL container is started lazily by the first test that asks for it
//! and cached for the rest of the test process. Schema tests create and drop
//! their own tables, so the container needs no sample data.
//!
//! # Usage
//!
//! Tests should go through `fixtures::test_connection()`, which only reaches
//! this module when `TABULA_TEST_DOCKER=1` is set.

use anyhow::Context;
use once_cell::sync::Lazy;
use std::time::Duration;
use tabula_core::{ConnectionConfig, DatabaseDriver};
use tabula_drivers::mysql::MySqlDriver;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::mysql::Mysql;
use tokio::sync::Mutex;

/// Information about a running test container
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    /// Host address (typically 127.0.0.1)
    pub host: String,
    /// Port number (randomly assigned by testcontainers)
    pub port: u16,
    /// Database name
    pub database: String,
    /// Username for authentication
    pub username: String,
    /// Password for authentication
    pub password: Option<String>,
}

impl ContainerInfo {
    /// Connection settings for the running server
    pub fn config(&self) -> ConnectionConfig {
        let config =
            ConnectionConfig::new_mysql(&self.host, self.port, &self.database, &self.username);
        match &self.password {
            Some(password) => config.with_password(password.clone()),
            None => config,
        }
    }
}

struct MysqlContainer {
    #[allow(dead_code)]
    inner: ContainerAsync<Mysql>,
    info: ContainerInfo,
}

/// Held across startup so concurrent tests share a single container
static MYSQL_CONTAINER: Lazy<Mutex<Option<MysqlContainer>>> = Lazy::new(|| Mutex::new(None));

/// Wait until the server accepts connections
///
/// The module's readiness check fires on the first "ready for connections"
/// log line, which MySQL prints once for its temporary init server too.
async fn wait_until_accepting(info: &ContainerInfo) -> anyhow::Result<()> {
    let driver = MySqlDriver::new();
    let config = info.config();
    let max_retries = 10;

    for attempt in 1..=max_retries {
        match driver.connect(&config).await {
            Ok(conn) => {
                conn.query("SELECT 1", &[])
                    .await
                    .context("MySQL accepted the connection but failed a ping")?;
                conn.close().await.ok();
                return Ok(());
            }
            Err(e) if attempt < max_retries => {
                let delay = Duration::from_secs(2u64.pow(attempt.min(4)));
                tracing::warn!(
                    attempt = attempt,
                    delay_secs = delay.as_secs(),
                    "MySQL connection failed, retrying: {}",
                    e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "failed to connect to MySQL after {} attempts: {}",
                    max_retries,
                    e
                ));
            }
        }
    }

    Ok(())
}

/// Get or create the MySQL test container
///
/// testcontainers-modules MySQL defaults to user root with an empty password
/// and a database named `test`.
pub async fn mysql_container() -> anyhow::Result<ContainerInfo> {
    let mut guard = MYSQL_CONTAINER.lock().await;
    if let Some(container) = guard.as_ref() {
        return Ok(container.info.clone());
    }

    tracing::info!("starting MySQL test container");

    let container = Mysql::default()
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("failed to start mysql container: {}", e))?;

    let host_port = container
        .get_host_port_ipv4(3306)
        .await
        .map_err(|e| anyhow::anyhow!("failed to get mysql port: {}", e))?;

    let info = ContainerInfo {
        host: "127.0.0.1".to_string(),
        port: host_port,
        database: "test".to_string(),
        username: "root".to_string(),
        password: None,
    };

    wait_until_accepting(&info).await?;
    tracing::info!(port = host_port, "MySQL test container ready");

    *guard = Some(MysqlContainer {
        inner: container,
        info: info.clone(),
    });

    Ok(info)
}
