//! Tabula Core - shared abstractions for schema introspection
//!
//! This crate defines the pieces every platform and the schema manager agree on:
//!
//! - `Connection` - the transport contract a platform driver implements
//! - `Platform` - DDL generation, catalog queries and row normalization per dialect
//! - The portable metadata model (`Column`, `Index`, `ForeignKey`, `View`, ...)
//! - `TabulaError`, the error taxonomy shared by all crates
//! - `ConnectionConfig`, loaded from code, TOML or the environment

mod connection;
mod driver;
mod error;
mod platform;
mod schema;
mod types;

pub use connection::*;
pub use driver::*;
pub use error::*;
pub use platform::*;
pub use schema::*;
pub use types::*;
