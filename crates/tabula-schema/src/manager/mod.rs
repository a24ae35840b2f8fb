//! Schema manager orchestrating DDL and catalog reads over a platform.

#[cfg(test)]
mod tests;

use tabula_core::{
    CatalogQuery, Column, Connection, Database, Feature, ForeignKey, ForeignKeyDefinition, Index,
    Platform, Result, Row, Table, TableDefinition, TabulaError, Trigger, User, View,
};

/// Dialect-agnostic schema operations
///
/// Every read issues a fresh catalog query; nothing is cached between calls.
/// Operations the platform lacks fail with `UnsupportedOperation` before any
/// statement reaches the server.
#[derive(Debug, Clone)]
pub struct SchemaManager<P: Platform> {
    platform: P,
}

impl<P: Platform> SchemaManager<P> {
    pub fn new(platform: P) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    fn ensure(&self, feature: Feature, operation: &str) -> Result<()> {
        if self.platform.supports(feature) {
            Ok(())
        } else {
            tracing::debug!(
                platform = self.platform.name(),
                feature = feature.name(),
                "operation not supported"
            );
            Err(TabulaError::unsupported(self.platform.name(), operation))
        }
    }

    async fn fetch(&self, conn: &dyn Connection, query: CatalogQuery<'_>) -> Result<Vec<Row>> {
        let stmt = self.platform.catalog_query(query)?;
        let result = conn.query(&stmt.sql, &stmt.params).await?;
        tracing::debug!(
            kind = query.kind(),
            row_count = result.rows.len(),
            "catalog rows fetched"
        );
        Ok(result.rows)
    }

    async fn run_ddl(&self, conn: &dyn Connection, statements: &[String]) -> Result<()> {
        for sql in statements {
            conn.execute(sql, &[]).await?;
        }
        Ok(())
    }

    /// Runs the statements of one `CREATE TABLE` so that a failure leaves no table behind
    ///
    /// Transactional platforms wrap the batch in `BEGIN`/`COMMIT`. Elsewhere the
    /// table created by the first statement is dropped when a later one fails.
    async fn run_create_table(
        &self,
        conn: &dyn Connection,
        table: &str,
        statements: &[String],
    ) -> Result<()> {
        let Some((create, rest)) = statements.split_first() else {
            return Ok(());
        };
        if rest.is_empty() {
            conn.execute(create, &[]).await?;
            return Ok(());
        }

        if self.platform.supports(Feature::TransactionalDdl) {
            conn.execute("BEGIN", &[]).await?;
            if let Err(err) = self.run_ddl(conn, statements).await {
                if let Err(rollback_err) = conn.execute("ROLLBACK", &[]).await {
                    tracing::warn!(error = %rollback_err, "rollback after failed create table failed");
                }
                return Err(err);
            }
            conn.execute("COMMIT", &[]).await?;
            return Ok(());
        }

        conn.execute(create, &[]).await?;
        if let Err(err) = self.run_ddl(conn, rest).await {
            tracing::debug!(error = %err, "dropping partially created table");
            if let Err(drop_err) = conn.execute(&self.platform.drop_table_sql(table), &[]).await {
                tracing::warn!(error = %drop_err, "could not drop partially created table");
            }
            return Err(err);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, conn), fields(platform = self.platform.name()))]
    pub async fn list_databases(&self, conn: &dyn Connection) -> Result<Vec<Database>> {
        let rows = self.fetch(conn, CatalogQuery::Databases).await?;
        self.platform.databases_from_rows(&rows)
    }

    #[tracing::instrument(skip(self, conn), fields(platform = self.platform.name()))]
    pub async fn create_database(&self, conn: &dyn Connection, name: &str) -> Result<()> {
        self.ensure(Feature::Databases, "create_database")?;
        let sql = self.platform.create_database_sql(name)?;
        conn.execute(&sql, &[]).await?;
        tracing::info!(database = %name, "database created");
        Ok(())
    }

    #[tracing::instrument(skip(self, conn), fields(platform = self.platform.name()))]
    pub async fn drop_database(&self, conn: &dyn Connection, name: &str) -> Result<()> {
        self.ensure(Feature::Databases, "drop_database")?;
        let sql = self.platform.drop_database_sql(name)?;
        conn.execute(&sql, &[]).await?;
        tracing::info!(database = %name, "database dropped");
        Ok(())
    }

    #[tracing::instrument(skip(self, conn), fields(platform = self.platform.name()))]
    pub async fn list_functions(&self, conn: &dyn Connection) -> Result<Vec<String>> {
        self.ensure(Feature::Functions, "list_functions")?;
        let rows = self.fetch(conn, CatalogQuery::Functions).await?;
        self.platform.function_names_from_rows(&rows)
    }

    #[tracing::instrument(skip(self, conn), fields(platform = self.platform.name()))]
    pub async fn list_triggers(&self, conn: &dyn Connection) -> Result<Vec<Trigger>> {
        self.ensure(Feature::Triggers, "list_triggers")?;
        let rows = self.fetch(conn, CatalogQuery::Triggers).await?;
        self.platform.triggers_from_rows(&rows)
    }

    /// Sequence names; MySQL reports the tables owning an auto-increment column
    #[tracing::instrument(skip(self, conn), fields(platform = self.platform.name()))]
    pub async fn list_sequences(&self, conn: &dyn Connection) -> Result<Vec<String>> {
        self.ensure(Feature::Sequences, "list_sequences")?;
        let rows = self.fetch(conn, CatalogQuery::Sequences).await?;
        self.platform.sequence_names_from_rows(&rows)
    }

    #[tracing::instrument(skip(self, conn, table), fields(platform = self.platform.name(), table = %table.name))]
    pub async fn create_table(
        &self,
        conn: &dyn Connection,
        table: &TableDefinition,
    ) -> Result<()> {
        table.validate()?;
        if table.options.engine.is_some() && !self.platform.supports(Feature::StorageEngines) {
            tracing::debug!(engine = ?table.options.engine, "storage engine ignored by platform");
        }

        let statements = self.platform.create_table_sql(table)?;
        self.run_create_table(conn, &table.name, &statements).await?;
        tracing::info!(
            columns = table.columns.len(),
            indexes = table.options.indexes.len(),
            foreign_keys = table.options.foreign_keys.len(),
            "table created"
        );
        Ok(())
    }

    #[tracing::instrument(skip(self, conn), fields(platform = self.platform.name()))]
    pub async fn drop_table(&self, conn: &dyn Connection, name: &str) -> Result<()> {
        conn.execute(&self.platform.drop_table_sql(name), &[]).await?;
        tracing::info!(table = %name, "table dropped");
        Ok(())
    }

    /// Base table names, sorted
    #[tracing::instrument(skip(self, conn), fields(platform = self.platform.name()))]
    pub async fn list_tables(&self, conn: &dyn Connection) -> Result<Vec<String>> {
        let rows = self.fetch(conn, CatalogQuery::Tables).await?;
        let mut names = self.platform.table_names_from_rows(&rows)?;
        names.sort();
        Ok(names)
    }

    /// Columns in declaration order; `NotFound` when the table has none
    #[tracing::instrument(skip(self, conn), fields(platform = self.platform.name()))]
    pub async fn list_table_columns(
        &self,
        conn: &dyn Connection,
        table: &str,
    ) -> Result<Vec<Column>> {
        let rows = self.fetch(conn, CatalogQuery::Columns { table }).await?;
        if rows.is_empty() {
            return Err(TabulaError::NotFound(format!("table '{}'", table)));
        }
        self.platform.columns_from_rows(&rows)
    }

    #[tracing::instrument(skip(self, conn), fields(platform = self.platform.name()))]
    pub async fn list_table_indexes(
        &self,
        conn: &dyn Connection,
        table: &str,
    ) -> Result<Vec<Index>> {
        let rows = self.fetch(conn, CatalogQuery::Indexes { table }).await?;
        self.platform.indexes_from_rows(&rows)
    }

    /// Constraint names, primary key first as `PRIMARY`
    #[tracing::instrument(skip(self, conn), fields(platform = self.platform.name()))]
    pub async fn list_table_constraints(
        &self,
        conn: &dyn Connection,
        table: &str,
    ) -> Result<Vec<String>> {
        let rows = self.fetch(conn, CatalogQuery::Constraints { table }).await?;
        self.platform.constraints_from_rows(&rows)
    }

    #[tracing::instrument(skip(self, conn), fields(platform = self.platform.name()))]
    pub async fn list_table_foreign_keys(
        &self,
        conn: &dyn Connection,
        table: &str,
    ) -> Result<Vec<ForeignKey>> {
        let rows = self.fetch(conn, CatalogQuery::ForeignKeys { table }).await?;
        self.platform.foreign_keys_from_rows(&rows)
    }

    /// Columns, indexes and foreign keys of one table
    #[tracing::instrument(skip(self, conn), fields(platform = self.platform.name()))]
    pub async fn list_table_details(&self, conn: &dyn Connection, table: &str) -> Result<Table> {
        let columns = self.list_table_columns(conn, table).await?;
        let indexes = self.list_table_indexes(conn, table).await?;
        let foreign_keys = self.list_table_foreign_keys(conn, table).await?;
        Ok(Table {
            name: table.to_string(),
            columns,
            indexes,
            foreign_keys,
        })
    }

    #[tracing::instrument(skip(self, conn, foreign_key), fields(platform = self.platform.name(), name = %foreign_key.name))]
    pub async fn create_foreign_key(
        &self,
        conn: &dyn Connection,
        table: &str,
        foreign_key: &ForeignKeyDefinition,
    ) -> Result<()> {
        self.ensure(Feature::AlterForeignKeys, "create_foreign_key")?;
        let sql = self.platform.create_foreign_key_sql(table, foreign_key)?;
        conn.execute(&sql, &[]).await?;
        tracing::info!(foreign_table = %foreign_key.foreign_table, "foreign key created");
        Ok(())
    }

    #[tracing::instrument(skip(self, conn, select_sql), fields(platform = self.platform.name()))]
    pub async fn create_view(
        &self,
        conn: &dyn Connection,
        name: &str,
        select_sql: &str,
    ) -> Result<()> {
        let sql = self.platform.create_view_sql(name, select_sql);
        conn.execute(&sql, &[]).await?;
        tracing::info!(view = %name, "view created");
        Ok(())
    }

    #[tracing::instrument(skip(self, conn), fields(platform = self.platform.name()))]
    pub async fn drop_view(&self, conn: &dyn Connection, name: &str) -> Result<()> {
        conn.execute(&self.platform.drop_view_sql(name), &[]).await?;
        tracing::info!(view = %name, "view dropped");
        Ok(())
    }

    #[tracing::instrument(skip(self, conn), fields(platform = self.platform.name()))]
    pub async fn list_views(&self, conn: &dyn Connection) -> Result<Vec<View>> {
        let rows = self.fetch(conn, CatalogQuery::Views).await?;
        self.platform.views_from_rows(&rows)
    }

    #[tracing::instrument(skip(self, conn), fields(platform = self.platform.name()))]
    pub async fn list_users(&self, conn: &dyn Connection) -> Result<Vec<User>> {
        self.ensure(Feature::Users, "list_users")?;
        let rows = self.fetch(conn, CatalogQuery::Users).await?;
        self.platform.users_from_rows(&rows)
    }
}
