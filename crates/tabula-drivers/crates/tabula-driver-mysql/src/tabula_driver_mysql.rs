//! MySQL platform for Tabula
//!
//! Catalog access goes through `information_schema` scoped to `DATABASE()`,
//! DDL is generated in MySQL's dialect, and server errors are classified by
//! their numeric code.

mod catalog;
mod connection;
mod driver;
mod errors;
mod normalize;
mod platform;

pub use connection::MySqlConnection;
pub use driver::MySqlDriver;
pub use errors::classify_server_error;
pub use platform::MySqlPlatform;
