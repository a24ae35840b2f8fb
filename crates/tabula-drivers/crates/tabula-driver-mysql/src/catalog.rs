//! information_schema queries, one per catalog request
//!
//! All queries are scoped to `DATABASE()` and take the table name as a bound
//! parameter. Result columns are aliased in lowercase for the normalizer.

use tabula_core::{CatalogQuery, CatalogStatement, Result, TabulaError};

const DATABASES: &str = "SELECT SCHEMA_NAME AS name
     FROM information_schema.SCHEMATA
     ORDER BY SCHEMA_NAME";

const TABLES: &str = "SELECT TABLE_NAME AS name
     FROM information_schema.TABLES
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_TYPE = 'BASE TABLE'
     ORDER BY TABLE_NAME";

const VIEWS: &str = "SELECT TABLE_NAME AS name, VIEW_DEFINITION AS definition
     FROM information_schema.VIEWS
     WHERE TABLE_SCHEMA = DATABASE()
     ORDER BY TABLE_NAME";

const USERS: &str = "SELECT User AS name, Host AS host
     FROM mysql.user
     ORDER BY User, Host";

// Sequences are emulated by AUTO_INCREMENT columns; the owning table names them
const SEQUENCES: &str = "SELECT DISTINCT TABLE_NAME AS name
     FROM information_schema.COLUMNS
     WHERE TABLE_SCHEMA = DATABASE() AND EXTRA LIKE '%auto_increment%'
     ORDER BY TABLE_NAME";

const COLUMNS: &str = "SELECT
        COLUMN_NAME AS name,
        DATA_TYPE AS data_type,
        COLUMN_TYPE AS column_type,
        IS_NULLABLE AS nullable,
        COLUMN_DEFAULT AS column_default,
        CHARACTER_MAXIMUM_LENGTH AS char_length,
        NUMERIC_PRECISION AS numeric_precision,
        NUMERIC_SCALE AS numeric_scale,
        COLUMN_KEY AS column_key,
        EXTRA AS extra,
        COLUMN_COMMENT AS column_comment
     FROM information_schema.COLUMNS
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
     ORDER BY ORDINAL_POSITION";

const INDEXES: &str = "SELECT
        INDEX_NAME AS name,
        COLUMN_NAME AS column_name,
        NON_UNIQUE AS non_unique,
        SEQ_IN_INDEX AS seq
     FROM information_schema.STATISTICS
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
     ORDER BY INDEX_NAME = 'PRIMARY' DESC, INDEX_NAME, SEQ_IN_INDEX";

const CONSTRAINTS: &str = "SELECT CONSTRAINT_NAME AS name
     FROM information_schema.TABLE_CONSTRAINTS
     WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?
     ORDER BY CONSTRAINT_TYPE = 'PRIMARY KEY' DESC, CONSTRAINT_NAME";

const FOREIGN_KEYS: &str = "SELECT
        k.CONSTRAINT_NAME AS name,
        k.COLUMN_NAME AS column_name,
        k.REFERENCED_TABLE_NAME AS referenced_table,
        k.REFERENCED_COLUMN_NAME AS referenced_column,
        r.UPDATE_RULE AS update_rule,
        r.DELETE_RULE AS delete_rule
     FROM information_schema.KEY_COLUMN_USAGE k
     JOIN information_schema.REFERENTIAL_CONSTRAINTS r
       ON r.CONSTRAINT_SCHEMA = k.CONSTRAINT_SCHEMA
      AND r.CONSTRAINT_NAME = k.CONSTRAINT_NAME
      AND r.TABLE_NAME = k.TABLE_NAME
     WHERE k.TABLE_SCHEMA = DATABASE()
       AND k.TABLE_NAME = ?
       AND k.REFERENCED_TABLE_NAME IS NOT NULL
     ORDER BY k.CONSTRAINT_NAME, k.ORDINAL_POSITION";

pub(crate) fn statement(query: CatalogQuery<'_>) -> Result<CatalogStatement> {
    let stmt = match query {
        CatalogQuery::Databases => CatalogStatement::new(DATABASES),
        CatalogQuery::Tables => CatalogStatement::new(TABLES),
        CatalogQuery::Views => CatalogStatement::new(VIEWS),
        CatalogQuery::Users => CatalogStatement::new(USERS),
        CatalogQuery::Sequences => CatalogStatement::new(SEQUENCES),
        CatalogQuery::Columns { table } => CatalogStatement::new(COLUMNS).bind(table),
        CatalogQuery::Indexes { table } => CatalogStatement::new(INDEXES).bind(table),
        CatalogQuery::Constraints { table } => CatalogStatement::new(CONSTRAINTS).bind(table),
        CatalogQuery::ForeignKeys { table } => CatalogStatement::new(FOREIGN_KEYS).bind(table),
        CatalogQuery::Functions | CatalogQuery::Triggers => {
            return Err(TabulaError::unsupported("mysql", query.kind()));
        }
    };
    Ok(stmt)
}
