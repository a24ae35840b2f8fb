//! Portable schema metadata model
//!
//! Introspected objects (`Column`, `Index`, `ForeignKey`, ...) are read-only
//! projections of catalog rows and are rebuilt on every call. Creation intents
//! (`TableDefinition`, `ColumnDefinition`, `ForeignKeyDefinition`) describe
//! what a caller wants the platform to create.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Result, TabulaError};

/// Name under which every platform reports the primary key index
pub const PRIMARY_KEY_INDEX: &str = "PRIMARY";

/// Dialect-independent column type kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    TinyInt,
    SmallInt,
    MediumInt,
    Integer,
    BigInt,
    Boolean,
    Decimal,
    Float,
    String,
    Text,
    Binary,
    Blob,
    Date,
    DateTime,
    Time,
    Json,
    /// A raw type the platform's type table does not know
    Unknown,
}

impl ColumnType {
    /// Storage length reported for this kind regardless of display width
    pub fn canonical_length(self) -> Option<u32> {
        match self {
            ColumnType::TinyInt => Some(1),
            ColumnType::SmallInt => Some(2),
            ColumnType::MediumInt => Some(3),
            ColumnType::Integer => Some(4),
            ColumnType::BigInt => Some(8),
            ColumnType::Boolean => Some(1),
            _ => None,
        }
    }

    /// Whether the kind carries the declared length from the catalog
    pub fn has_declared_length(self) -> bool {
        matches!(self, ColumnType::String | ColumnType::Binary)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ColumnType::TinyInt
                | ColumnType::SmallInt
                | ColumnType::MediumInt
                | ColumnType::Integer
                | ColumnType::BigInt
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ColumnType::TinyInt => "tinyint",
            ColumnType::SmallInt => "smallint",
            ColumnType::MediumInt => "mediumint",
            ColumnType::Integer => "integer",
            ColumnType::BigInt => "bigint",
            ColumnType::Boolean => "boolean",
            ColumnType::Decimal => "decimal",
            ColumnType::Float => "float",
            ColumnType::String => "string",
            ColumnType::Text => "text",
            ColumnType::Binary => "binary",
            ColumnType::Blob => "blob",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
            ColumnType::Time => "time",
            ColumnType::Json => "json",
            ColumnType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Column default value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnDefault {
    /// A literal value, stored without quoting
    Literal(String),
    /// A server-evaluated expression such as `CURRENT_TIMESTAMP`
    Expression(String),
}

impl ColumnDefault {
    pub fn as_str(&self) -> &str {
        match self {
            ColumnDefault::Literal(s) | ColumnDefault::Expression(s) => s,
        }
    }

    pub fn is_expression(&self) -> bool {
        matches!(self, ColumnDefault::Expression(_))
    }
}

/// Introspected column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    /// Raw type as declared in the catalog (e.g. `int unsigned`, `varchar(255)`)
    pub platform_type: String,
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub unsigned: bool,
    pub fixed: bool,
    pub notnull: bool,
    pub autoincrement: bool,
    pub default: Option<ColumnDefault>,
    pub primary: bool,
    pub comment: Option<String>,
}

/// Introspected index; the primary key is the index named [`PRIMARY_KEY_INDEX`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
    pub primary: bool,
}

impl Index {
    pub fn spans(&self, columns: &[&str]) -> bool {
        self.columns.len() == columns.len()
            && self
                .columns
                .iter()
                .zip(columns)
                .all(|(a, b)| a.eq_ignore_ascii_case(b))
    }
}

/// Referential action on update/delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

impl ForeignKeyAction {
    /// Parse a catalog rule such as `SET NULL`; unknown rules read as `NO ACTION`
    pub fn parse(action: &str) -> Self {
        match action.trim().to_uppercase().as_str() {
            "CASCADE" => ForeignKeyAction::Cascade,
            "SET NULL" => ForeignKeyAction::SetNull,
            "SET DEFAULT" => ForeignKeyAction::SetDefault,
            "RESTRICT" => ForeignKeyAction::Restrict,
            _ => ForeignKeyAction::NoAction,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            ForeignKeyAction::NoAction => "NO ACTION",
            ForeignKeyAction::Restrict => "RESTRICT",
            ForeignKeyAction::Cascade => "CASCADE",
            ForeignKeyAction::SetNull => "SET NULL",
            ForeignKeyAction::SetDefault => "SET DEFAULT",
        }
    }
}

/// Introspected foreign key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKey {
    pub name: String,
    pub local_columns: Vec<String>,
    pub foreign_table: String,
    pub foreign_columns: Vec<String>,
    pub on_update: ForeignKeyAction,
    pub on_delete: ForeignKeyAction,
}

impl ForeignKey {
    /// Check that local and referenced column lists line up
    pub fn validate(&self) -> Result<()> {
        if self.local_columns.is_empty() || self.local_columns.len() != self.foreign_columns.len()
        {
            return Err(TabulaError::Catalog(format!(
                "foreign key '{}' has {} local and {} referenced columns",
                self.name,
                self.local_columns.len(),
                self.foreign_columns.len()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct View {
    pub name: String,
    /// Definition as the catalog returns it, never reformatted
    pub sql: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Database {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub name: String,
    pub host: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trigger {
    pub name: String,
    pub table: String,
    pub sql: Option<String>,
}

/// Introspected table with its columns, indexes and foreign keys
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    pub foreign_keys: Vec<ForeignKey>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn primary_key(&self) -> Option<&Index> {
        self.indexes.iter().find(|i| i.primary)
    }
}

/// Column creation intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub precision: Option<u32>,
    #[serde(default)]
    pub scale: Option<u32>,
    #[serde(default)]
    pub unsigned: bool,
    #[serde(default)]
    pub fixed: bool,
    #[serde(default)]
    pub notnull: bool,
    #[serde(default)]
    pub autoincrement: bool,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub default: Option<ColumnDefault>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ColumnDefinition {
    /// A nullable column of the given kind
    pub fn new(column_type: ColumnType) -> Self {
        Self {
            column_type,
            length: None,
            precision: None,
            scale: None,
            unsigned: false,
            fixed: false,
            notnull: false,
            autoincrement: false,
            primary: false,
            default: None,
            comment: None,
        }
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }

    pub fn notnull(mut self) -> Self {
        self.notnull = true;
        self
    }

    /// Auto-increment columns are always NOT NULL
    pub fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self.notnull = true;
        self
    }

    /// Primary key columns are always NOT NULL
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self.notnull = true;
        self
    }

    pub fn default_value(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    Unique,
    #[default]
    Simple,
}

/// Index creation intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub fields: Vec<String>,
    #[serde(rename = "type", default)]
    pub kind: IndexKind,
}

impl IndexDefinition {
    pub fn unique<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            kind: IndexKind::Unique,
        }
    }

    pub fn simple<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            kind: IndexKind::Simple,
        }
    }

    pub fn is_unique(&self) -> bool {
        self.kind == IndexKind::Unique
    }
}

/// Foreign key creation intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDefinition {
    pub name: String,
    pub local: Vec<String>,
    pub foreign: Vec<String>,
    #[serde(alias = "foreignTable")]
    pub foreign_table: String,
    #[serde(default)]
    pub on_update: Option<ForeignKeyAction>,
    #[serde(default)]
    pub on_delete: Option<ForeignKeyAction>,
}

impl ForeignKeyDefinition {
    /// Single-column foreign key `local -> foreign_table(foreign)`
    pub fn new(
        name: impl Into<String>,
        local: impl Into<String>,
        foreign_table: impl Into<String>,
        foreign: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            local: vec![local.into()],
            foreign: vec![foreign.into()],
            foreign_table: foreign_table.into(),
            on_update: None,
            on_delete: None,
        }
    }

    pub fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }

    pub fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(TabulaError::Configuration(
                "foreign key definition needs a name".into(),
            ));
        }
        if self.local.is_empty() || self.local.len() != self.foreign.len() {
            return Err(TabulaError::Configuration(format!(
                "foreign key '{}' maps {} local columns onto {} foreign columns",
                self.name,
                self.local.len(),
                self.foreign.len()
            )));
        }
        Ok(())
    }
}

/// Table-level options recognized by `create_table`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableOptions {
    pub indexes: IndexMap<String, IndexDefinition>,
    /// Storage engine hint; platforms without engines ignore it
    #[serde(alias = "type")]
    pub engine: Option<String>,
    pub charset: Option<String>,
    pub collate: Option<String>,
    pub comment: Option<String>,
    pub foreign_keys: Vec<ForeignKeyDefinition>,
}

/// Table creation intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub columns: IndexMap<String, ColumnDefinition>,
    #[serde(default)]
    pub options: TableOptions,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: IndexMap::new(),
            options: TableOptions::default(),
        }
    }

    pub fn column(mut self, name: impl Into<String>, column: ColumnDefinition) -> Self {
        self.columns.insert(name.into(), column);
        self
    }

    pub fn index(mut self, name: impl Into<String>, index: IndexDefinition) -> Self {
        self.options.indexes.insert(name.into(), index);
        self
    }

    pub fn foreign_key(mut self, foreign_key: ForeignKeyDefinition) -> Self {
        self.options.foreign_keys.push(foreign_key);
        self
    }

    pub fn engine(mut self, engine: impl Into<String>) -> Self {
        self.options.engine = Some(engine.into());
        self
    }

    pub fn options(mut self, options: TableOptions) -> Self {
        self.options = options;
        self
    }

    /// Names of the columns flagged `primary`, in declaration order
    pub fn primary_key_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|(_, c)| c.primary)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Reject definitions no platform could turn into valid DDL
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(TabulaError::Configuration("table definition needs a name".into()));
        }
        if self.columns.is_empty() {
            return Err(TabulaError::Configuration(format!(
                "table '{}' has no columns",
                self.name
            )));
        }
        for (index_name, index) in &self.options.indexes {
            if index.fields.is_empty() {
                return Err(TabulaError::Configuration(format!(
                    "index '{}' on '{}' has no fields",
                    index_name, self.name
                )));
            }
            if let Some(missing) = index
                .fields
                .iter()
                .find(|f| !self.columns.contains_key(f.as_str()))
            {
                return Err(TabulaError::Configuration(format!(
                    "index '{}' references unknown column '{}'",
                    index_name, missing
                )));
            }
        }
        for fk in &self.options.foreign_keys {
            fk.validate()?;
        }
        Ok(())
    }
}
