//! SQLite DDL generation and the `Platform` implementation

use tabula_core::{
    CatalogQuery, CatalogStatement, Column, ColumnDefault, ColumnDefinition, ColumnType,
    ForeignKey, ForeignKeyDefinition, Index, Platform, PlatformCapabilities, Result, Row,
    TableDefinition, TabulaError,
};

use crate::{catalog, normalize};

const PLATFORM: &str = "sqlite";

/// SQLite platform
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlitePlatform;

impl SqlitePlatform {
    pub fn new() -> Self {
        Self
    }

    fn type_declaration(&self, column: &ColumnDefinition) -> Result<String> {
        let sql = match column.column_type {
            ColumnType::TinyInt => "TINYINT".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::MediumInt => "MEDIUMINT".to_string(),
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
            ColumnType::Decimal => format!(
                "NUMERIC({}, {})",
                column.precision.unwrap_or(10),
                column.scale.unwrap_or(0)
            ),
            ColumnType::Float => "DOUBLE PRECISION".to_string(),
            ColumnType::String => {
                let length = column.length.unwrap_or(255);
                if column.fixed {
                    format!("CHAR({})", length)
                } else {
                    format!("VARCHAR({})", length)
                }
            }
            ColumnType::Text => "CLOB".to_string(),
            ColumnType::Binary => {
                let length = column.length.unwrap_or(255);
                if column.fixed {
                    format!("BINARY({})", length)
                } else {
                    format!("VARBINARY({})", length)
                }
            }
            ColumnType::Blob => "BLOB".to_string(),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::DateTime => "DATETIME".to_string(),
            ColumnType::Time => "TIME".to_string(),
            ColumnType::Json => "JSON".to_string(),
            ColumnType::Unknown => {
                return Err(TabulaError::Configuration(
                    "cannot declare a column of unknown type".into(),
                ));
            }
        };
        Ok(sql)
    }

    /// `rowid_key` marks the single auto-increment primary key column, which
    /// SQLite only accepts as `INTEGER PRIMARY KEY AUTOINCREMENT`
    fn column_declaration(
        &self,
        name: &str,
        column: &ColumnDefinition,
        rowid_key: bool,
    ) -> Result<String> {
        let mut sql = self.quote_identifier(name);
        if rowid_key {
            sql.push_str(" INTEGER PRIMARY KEY AUTOINCREMENT");
        } else {
            sql.push(' ');
            sql.push_str(&self.type_declaration(column)?);
        }

        match &column.default {
            Some(ColumnDefault::Literal(value)) => {
                sql.push_str(" DEFAULT ");
                sql.push_str(&quote_literal(value));
            }
            Some(ColumnDefault::Expression(expr)) => {
                sql.push_str(" DEFAULT ");
                sql.push_str(expr);
            }
            None if !column.notnull => sql.push_str(" DEFAULT NULL"),
            None => {}
        }
        if column.notnull {
            sql.push_str(" NOT NULL");
        }
        Ok(sql)
    }

    fn column_list(&self, columns: &[String]) -> String {
        columns
            .iter()
            .map(|c| self.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn foreign_key_clause(&self, foreign_key: &ForeignKeyDefinition) -> Result<String> {
        foreign_key.validate()?;

        let mut sql = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quote_identifier(&foreign_key.name),
            self.column_list(&foreign_key.local),
            self.quote_identifier(&foreign_key.foreign_table),
            self.column_list(&foreign_key.foreign)
        );
        if let Some(action) = foreign_key.on_update {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.as_sql());
        }
        if let Some(action) = foreign_key.on_delete {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_sql());
        }
        Ok(sql)
    }
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

impl Platform for SqlitePlatform {
    fn name(&self) -> &'static str {
        PLATFORM
    }

    fn capabilities(&self) -> PlatformCapabilities {
        PlatformCapabilities {
            triggers: true,
            transactional_ddl: true,
            ..PlatformCapabilities::default()
        }
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    fn create_database_sql(&self, _name: &str) -> Result<String> {
        Err(TabulaError::unsupported(PLATFORM, "create database"))
    }

    fn drop_database_sql(&self, _name: &str) -> Result<String> {
        Err(TabulaError::unsupported(PLATFORM, "drop database"))
    }

    fn create_table_sql(&self, table: &TableDefinition) -> Result<Vec<String>> {
        table.validate()?;

        let primary = table.primary_key_columns();
        let autoincrement: Vec<&str> = table
            .columns
            .iter()
            .filter(|(_, c)| c.autoincrement)
            .map(|(name, _)| name.as_str())
            .collect();
        let rowid_key = match autoincrement.as_slice() {
            [] => None,
            [name]
                if primary.len() == 1
                    && primary[0] == *name
                    && table
                        .columns
                        .get(*name)
                        .is_some_and(|c| c.column_type.is_integer()) =>
            {
                Some(*name)
            }
            _ => {
                return Err(TabulaError::Configuration(format!(
                    "table '{}': SQLite only auto-increments a single integer primary key column",
                    table.name
                )));
            }
        };

        let mut parts = Vec::with_capacity(table.columns.len() + 1);
        for (name, column) in &table.columns {
            let is_rowid_key = rowid_key == Some(name.as_str());
            parts.push(self.column_declaration(name, column, is_rowid_key)?);
        }
        if rowid_key.is_none() && !primary.is_empty() {
            let primary: Vec<String> = primary.iter().map(|c| c.to_string()).collect();
            parts.push(format!("PRIMARY KEY ({})", self.column_list(&primary)));
        }
        for fk in &table.options.foreign_keys {
            parts.push(self.foreign_key_clause(fk)?);
        }

        let options = &table.options;
        if options.engine.is_some() || options.charset.is_some() || options.collate.is_some() {
            tracing::debug!(table = %table.name, "ignoring storage options unsupported by SQLite");
        }

        let mut statements = vec![format!(
            "CREATE TABLE {} ({})",
            self.quote_identifier(&table.name),
            parts.join(", ")
        )];
        // Inline UNIQUE constraints would lose their names, so indexes are separate
        for (name, index) in &options.indexes {
            let keyword = if index.is_unique() { "CREATE UNIQUE INDEX" } else { "CREATE INDEX" };
            statements.push(format!(
                "{} {} ON {} ({})",
                keyword,
                self.quote_identifier(name),
                self.quote_identifier(&table.name),
                self.column_list(&index.fields)
            ));
        }
        Ok(statements)
    }

    fn create_foreign_key_sql(
        &self,
        _table: &str,
        _foreign_key: &ForeignKeyDefinition,
    ) -> Result<String> {
        Err(TabulaError::unsupported(PLATFORM, "create foreign key"))
    }

    fn catalog_query(&self, query: CatalogQuery<'_>) -> Result<CatalogStatement> {
        catalog::statement(query)
    }

    fn map_raw_type(&self, raw_type: &str) -> ColumnType {
        normalize::map_raw_type(raw_type)
    }

    fn columns_from_rows(&self, rows: &[Row]) -> Result<Vec<Column>> {
        normalize::columns_from_rows(rows)
    }

    fn indexes_from_rows(&self, rows: &[Row]) -> Result<Vec<Index>> {
        normalize::indexes_from_rows(rows)
    }

    fn foreign_keys_from_rows(&self, rows: &[Row]) -> Result<Vec<ForeignKey>> {
        normalize::foreign_keys_from_rows(rows)
    }
}
