//! `sqlite_master` and pragma queries, one per catalog request
//!
//! Table-scoped queries reference the table as `?1`, possibly more than once,
//! and bind it a single time.

use tabula_core::{CatalogQuery, CatalogStatement, Result, TabulaError};

const DATABASES: &str = "SELECT name FROM pragma_database_list ORDER BY seq";

// `_` is a LIKE wildcard; only the reserved `sqlite_` prefix is skipped.
const TABLES: &str = "SELECT name FROM sqlite_master
     WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'
     ORDER BY name";

const VIEWS: &str = "SELECT name, sql AS definition FROM sqlite_master
     WHERE type = 'view'
     ORDER BY name";

const TRIGGERS: &str = "SELECT name, tbl_name AS table_name, sql AS definition FROM sqlite_master
     WHERE type = 'trigger'
     ORDER BY name";

const COLUMNS: &str = "SELECT
        name,
        type AS column_type,
        \"notnull\" AS notnull,
        dflt_value AS column_default,
        pk
     FROM pragma_table_info(?1)
     ORDER BY cid";

// Rowid-alias keys have no backing index, so the primary key is rebuilt from
// table_info and the automatic pk index is left out.
const INDEXES: &str = "SELECT name, column_name, non_unique, seq FROM (
        SELECT 'PRIMARY' AS name, ti.name AS column_name, 0 AS non_unique, ti.pk AS seq
        FROM pragma_table_info(?1) AS ti
        WHERE ti.pk > 0
        UNION ALL
        SELECT il.name, ii.name, il.\"unique\" = 0, ii.seqno + 1
        FROM pragma_index_list(?1) AS il
        JOIN pragma_index_info(il.name) AS ii
        WHERE il.origin <> 'pk'
     )
     ORDER BY name <> 'PRIMARY', name, seq";

const CONSTRAINTS: &str = "SELECT name FROM (
        SELECT DISTINCT 'PRIMARY' AS name FROM pragma_table_info(?1) WHERE pk > 0
        UNION ALL
        SELECT name FROM pragma_index_list(?1) WHERE \"unique\" = 1 AND origin <> 'pk'
        UNION ALL
        SELECT DISTINCT 'fk_' || ?1 || '_' || id FROM pragma_foreign_key_list(?1)
     )
     ORDER BY name <> 'PRIMARY', name";

// SQLite keeps no foreign key names; they are derived from the table and the
// constraint id. A missing "to" column means the parent's primary key.
const FOREIGN_KEYS: &str = "SELECT
        'fk_' || ?1 || '_' || fk.id AS name,
        fk.\"from\" AS column_name,
        fk.\"table\" AS referenced_table,
        COALESCE(
            fk.\"to\",
            (SELECT p.name FROM pragma_table_info(fk.\"table\") AS p WHERE p.pk = fk.seq + 1)
        ) AS referenced_column,
        fk.on_update AS update_rule,
        fk.on_delete AS delete_rule
     FROM pragma_foreign_key_list(?1) AS fk
     ORDER BY fk.id, fk.seq";

pub(crate) fn statement(query: CatalogQuery<'_>) -> Result<CatalogStatement> {
    let stmt = match query {
        CatalogQuery::Databases => CatalogStatement::new(DATABASES),
        CatalogQuery::Tables => CatalogStatement::new(TABLES),
        CatalogQuery::Views => CatalogStatement::new(VIEWS),
        CatalogQuery::Triggers => CatalogStatement::new(TRIGGERS),
        CatalogQuery::Columns { table } => CatalogStatement::new(COLUMNS).bind(table),
        CatalogQuery::Indexes { table } => CatalogStatement::new(INDEXES).bind(table),
        CatalogQuery::Constraints { table } => CatalogStatement::new(CONSTRAINTS).bind(table),
        CatalogQuery::ForeignKeys { table } => CatalogStatement::new(FOREIGN_KEYS).bind(table),
        CatalogQuery::Users | CatalogQuery::Functions | CatalogQuery::Sequences => {
            return Err(TabulaError::unsupported("sqlite", query.kind()));
        }
    };
    Ok(stmt)
}
