//! Tabula Schema - dialect-agnostic schema management
//!
//! [`SchemaManager`] issues creation and drop DDL through a platform and
//! projects catalog rows into the portable metadata model. The connection is
//! passed to every call; the manager itself holds only the platform.

mod manager;

pub use manager::SchemaManager;

// Re-export the model types callers work with
pub use tabula_core::{
    Column, ColumnDefault, ColumnDefinition, ColumnType, Database, ForeignKey,
    ForeignKeyDefinition, Index, IndexDefinition, PRIMARY_KEY_INDEX, Platform, ResultExt, Table,
    TableDefinition, TableOptions, Trigger, User, View,
};
