//! SQLite platform for Tabula
//!
//! Catalog access goes through `sqlite_master` and the `pragma_*` table-valued
//! functions. SQLite has no databases to create, no users, no routines and no
//! `ALTER TABLE ... ADD CONSTRAINT`; those requests fail with
//! `UnsupportedOperation`.

mod catalog;
mod connection;
mod driver;
mod errors;
mod normalize;
mod platform;

pub use connection::SqliteConnection;
pub use driver::SqliteDriver;
pub use errors::classify_message;
pub use platform::SqlitePlatform;
