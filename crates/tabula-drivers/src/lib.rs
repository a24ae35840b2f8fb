//! Tabula Drivers - the supported platforms behind one entry point
//!
//! `connect` opens a connection with the driver named in the configuration
//! and returns it together with the matching [`DatabasePlatform`].

pub use tabula_driver_mysql as mysql;
pub use tabula_driver_sqlite as sqlite;

mod platform;
mod registry;

pub use platform::DatabasePlatform;
pub use registry::{DriverRegistry, connect};

/// Re-export commonly used types from tabula-core
pub use tabula_core::{
    Connection, ConnectionConfig, DatabaseDriver, Platform, QueryResult, Result, Row,
    StatementResult, TabulaError, Value,
};
