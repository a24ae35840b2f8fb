//! The closed set of supported platforms

use tabula_core::{
    CatalogQuery, CatalogStatement, Column, ColumnType, Database, ForeignKey,
    ForeignKeyDefinition, Index, Platform, PlatformCapabilities, Result, Row, TableDefinition,
    TabulaError, Trigger, User, View,
};

use crate::{mysql::MySqlPlatform, sqlite::SqlitePlatform};

/// A platform resolved once from the configured driver name
#[derive(Debug, Clone, Copy)]
pub enum DatabasePlatform {
    MySql(MySqlPlatform),
    Sqlite(SqlitePlatform),
}

impl DatabasePlatform {
    /// Resolve a driver name; `mariadb` shares the MySQL dialect
    pub fn for_driver(driver: &str) -> Result<Self> {
        match driver.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Self::MySql(MySqlPlatform::new())),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite(SqlitePlatform::new())),
            other => Err(TabulaError::Configuration(format!(
                "no platform for driver '{}'",
                other
            ))),
        }
    }

    fn inner(&self) -> &dyn Platform {
        match self {
            Self::MySql(platform) => platform,
            Self::Sqlite(platform) => platform,
        }
    }
}

impl Platform for DatabasePlatform {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn capabilities(&self) -> PlatformCapabilities {
        self.inner().capabilities()
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        self.inner().quote_identifier(identifier)
    }

    fn create_database_sql(&self, name: &str) -> Result<String> {
        self.inner().create_database_sql(name)
    }

    fn drop_database_sql(&self, name: &str) -> Result<String> {
        self.inner().drop_database_sql(name)
    }

    fn create_table_sql(&self, table: &TableDefinition) -> Result<Vec<String>> {
        self.inner().create_table_sql(table)
    }

    fn drop_table_sql(&self, name: &str) -> String {
        self.inner().drop_table_sql(name)
    }

    fn create_foreign_key_sql(
        &self,
        table: &str,
        foreign_key: &ForeignKeyDefinition,
    ) -> Result<String> {
        self.inner().create_foreign_key_sql(table, foreign_key)
    }

    fn create_view_sql(&self, name: &str, select_sql: &str) -> String {
        self.inner().create_view_sql(name, select_sql)
    }

    fn drop_view_sql(&self, name: &str) -> String {
        self.inner().drop_view_sql(name)
    }

    fn catalog_query(&self, query: CatalogQuery<'_>) -> Result<CatalogStatement> {
        self.inner().catalog_query(query)
    }

    fn map_raw_type(&self, raw_type: &str) -> ColumnType {
        self.inner().map_raw_type(raw_type)
    }

    fn columns_from_rows(&self, rows: &[Row]) -> Result<Vec<Column>> {
        self.inner().columns_from_rows(rows)
    }

    fn indexes_from_rows(&self, rows: &[Row]) -> Result<Vec<Index>> {
        self.inner().indexes_from_rows(rows)
    }

    fn foreign_keys_from_rows(&self, rows: &[Row]) -> Result<Vec<ForeignKey>> {
        self.inner().foreign_keys_from_rows(rows)
    }

    fn databases_from_rows(&self, rows: &[Row]) -> Result<Vec<Database>> {
        self.inner().databases_from_rows(rows)
    }

    fn table_names_from_rows(&self, rows: &[Row]) -> Result<Vec<String>> {
        self.inner().table_names_from_rows(rows)
    }

    fn constraints_from_rows(&self, rows: &[Row]) -> Result<Vec<String>> {
        self.inner().constraints_from_rows(rows)
    }

    fn views_from_rows(&self, rows: &[Row]) -> Result<Vec<View>> {
        self.inner().views_from_rows(rows)
    }

    fn users_from_rows(&self, rows: &[Row]) -> Result<Vec<User>> {
        self.inner().users_from_rows(rows)
    }

    fn triggers_from_rows(&self, rows: &[Row]) -> Result<Vec<Trigger>> {
        self.inner().triggers_from_rows(rows)
    }

    fn function_names_from_rows(&self, rows: &[Row]) -> Result<Vec<String>> {
        self.inner().function_names_from_rows(rows)
    }

    fn sequence_names_from_rows(&self, rows: &[Row]) -> Result<Vec<String>> {
        self.inner().sequence_names_from_rows(rows)
    }
}
