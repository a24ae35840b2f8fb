//! Platform contract: DDL generation, catalog queries and row normalization
//!
//! A platform owns everything dialect-specific. The schema manager asks it for
//! DDL strings and catalog statements, runs them through a [`Connection`], and
//! hands the raw rows back to the platform's `*_from_rows` projections.
//!
//! [`Connection`]: crate::Connection

use crate::{
    Column, ColumnType, Database, ForeignKey, ForeignKeyDefinition, Index, Result, Row,
    TableDefinition, Trigger, User, Value, View,
};

/// Optional platform features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Databases as creatable/droppable objects
    Databases,
    /// A routine catalog exposing stored functions
    Functions,
    Triggers,
    Sequences,
    /// An access-control catalog listing users
    Users,
    /// Per-table storage engine selection
    StorageEngines,
    /// Adding foreign keys to an existing table
    AlterForeignKeys,
    /// DDL statements that take part in a transaction and roll back with it
    TransactionalDdl,
}

impl Feature {
    pub fn name(self) -> &'static str {
        match self {
            Feature::Databases => "databases",
            Feature::Functions => "functions",
            Feature::Triggers => "triggers",
            Feature::Sequences => "sequences",
            Feature::Users => "users",
            Feature::StorageEngines => "storage engines",
            Feature::AlterForeignKeys => "alter foreign keys",
            Feature::TransactionalDdl => "transactional ddl",
        }
    }
}

/// Capabilities that a platform may support
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlatformCapabilities {
    pub databases: bool,
    pub functions: bool,
    pub triggers: bool,
    pub sequences: bool,
    pub users: bool,
    pub storage_engines: bool,
    pub alter_foreign_keys: bool,
    pub transactional_ddl: bool,
}

impl PlatformCapabilities {
    pub fn supports(&self, feature: Feature) -> bool {
        match feature {
            Feature::Databases => self.databases,
            Feature::Functions => self.functions,
            Feature::Triggers => self.triggers,
            Feature::Sequences => self.sequences,
            Feature::Users => self.users,
            Feature::StorageEngines => self.storage_engines,
            Feature::AlterForeignKeys => self.alter_foreign_keys,
            Feature::TransactionalDdl => self.transactional_ddl,
        }
    }
}

/// Catalog request, one per object kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogQuery<'a> {
    Databases,
    Tables,
    Views,
    Users,
    Functions,
    Triggers,
    Sequences,
    Columns { table: &'a str },
    Indexes { table: &'a str },
    Constraints { table: &'a str },
    ForeignKeys { table: &'a str },
}

impl CatalogQuery<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogQuery::Databases => "databases",
            CatalogQuery::Tables => "tables",
            CatalogQuery::Views => "views",
            CatalogQuery::Users => "users",
            CatalogQuery::Functions => "functions",
            CatalogQuery::Triggers => "triggers",
            CatalogQuery::Sequences => "sequences",
            CatalogQuery::Columns { .. } => "columns",
            CatalogQuery::Indexes { .. } => "indexes",
            CatalogQuery::Constraints { .. } => "constraints",
            CatalogQuery::ForeignKeys { .. } => "foreign keys",
        }
    }
}

/// A catalog query ready to run: SQL text plus bound parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl CatalogStatement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }
}

/// Dialect-specific behaviour behind the schema manager
///
/// Catalog queries alias their result columns in lowercase so the default
/// projections below can read rows by name on every platform: `name` for
/// object names, `definition` for view and trigger bodies, `host` for users
/// and `table_name` for the table a trigger belongs to.
pub trait Platform: Send + Sync {
    /// Platform identifier (e.g. "mysql", "sqlite")
    fn name(&self) -> &'static str;

    fn capabilities(&self) -> PlatformCapabilities;

    fn supports(&self, feature: Feature) -> bool {
        self.capabilities().supports(feature)
    }

    fn quote_identifier(&self, identifier: &str) -> String;

    fn create_database_sql(&self, name: &str) -> Result<String>;

    fn drop_database_sql(&self, name: &str) -> Result<String>;

    /// DDL for a table, in execution order
    fn create_table_sql(&self, table: &TableDefinition) -> Result<Vec<String>>;

    fn drop_table_sql(&self, name: &str) -> String {
        format!("DROP TABLE {}", self.quote_identifier(name))
    }

    fn create_foreign_key_sql(
        &self,
        table: &str,
        foreign_key: &ForeignKeyDefinition,
    ) -> Result<String>;

    fn create_view_sql(&self, name: &str, select_sql: &str) -> String {
        format!("CREATE VIEW {} AS {}", self.quote_identifier(name), select_sql)
    }

    fn drop_view_sql(&self, name: &str) -> String {
        format!("DROP VIEW {}", self.quote_identifier(name))
    }

    fn catalog_query(&self, query: CatalogQuery<'_>) -> Result<CatalogStatement>;

    /// Resolve a raw catalog type name through the platform's static type table
    fn map_raw_type(&self, raw_type: &str) -> ColumnType;

    fn columns_from_rows(&self, rows: &[Row]) -> Result<Vec<Column>>;

    fn indexes_from_rows(&self, rows: &[Row]) -> Result<Vec<Index>>;

    fn foreign_keys_from_rows(&self, rows: &[Row]) -> Result<Vec<ForeignKey>>;

    fn databases_from_rows(&self, rows: &[Row]) -> Result<Vec<Database>> {
        names_from_rows(rows, "name").map(|names| {
            names
                .into_iter()
                .map(|name| Database { name })
                .collect()
        })
    }

    fn table_names_from_rows(&self, rows: &[Row]) -> Result<Vec<String>> {
        names_from_rows(rows, "name")
    }

    fn constraints_from_rows(&self, rows: &[Row]) -> Result<Vec<String>> {
        names_from_rows(rows, "name")
    }

    fn views_from_rows(&self, rows: &[Row]) -> Result<Vec<View>> {
        rows.iter()
            .map(|row| {
                Ok(View {
                    name: row.require_str("name")?.to_string(),
                    sql: row.str_by_name("definition").unwrap_or_default().to_string(),
                })
            })
            .collect()
    }

    fn users_from_rows(&self, rows: &[Row]) -> Result<Vec<User>> {
        rows.iter()
            .map(|row| {
                Ok(User {
                    name: row.require_str("name")?.to_string(),
                    host: row.str_by_name("host").map(str::to_string),
                })
            })
            .collect()
    }

    fn triggers_from_rows(&self, rows: &[Row]) -> Result<Vec<Trigger>> {
        rows.iter()
            .map(|row| {
                Ok(Trigger {
                    name: row.require_str("name")?.to_string(),
                    table: row.require_str("table_name")?.to_string(),
                    sql: row.str_by_name("definition").map(str::to_string),
                })
            })
            .collect()
    }

    fn function_names_from_rows(&self, rows: &[Row]) -> Result<Vec<String>> {
        names_from_rows(rows, "name")
    }

    fn sequence_names_from_rows(&self, rows: &[Row]) -> Result<Vec<String>> {
        names_from_rows(rows, "name")
    }
}

/// Read one required text column from every row, dropping duplicates
pub fn names_from_rows(rows: &[Row], column: &str) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::with_capacity(rows.len());
    for row in rows {
        let name = row.require_str(column)?;
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    Ok(names)
}
