//! Connection trait consumed by the schema manager

use crate::{QueryResult, Result, StatementResult, Value};
use async_trait::async_trait;

/// A live database connection
///
/// Implementations run one statement at a time and map native driver
/// failures onto [`crate::TabulaError`] kinds (`AlreadyExists`, `NotFound`,
/// `Referential`, falling back to `Transport`).
#[async_trait]
pub trait Connection: Send + Sync {
    /// Get the driver name (e.g., "sqlite", "mysql")
    fn driver_name(&self) -> &str;

    /// Execute a statement that does not return rows (DDL, INSERT/UPDATE/DELETE)
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult>;

    /// Execute a query that returns rows
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Close the connection
    async fn close(&self) -> Result<()>;
}
