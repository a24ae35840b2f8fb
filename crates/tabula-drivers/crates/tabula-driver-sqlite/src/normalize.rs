//! Projection of SQLite pragma rows onto the portable model

use indexmap::IndexMap;
use tabula_core::{
    Column, ColumnDefault, ColumnType, ForeignKey, ForeignKeyAction, Index, PRIMARY_KEY_INDEX,
    Result, Row,
};

/// Declared type name to abstract kind
static TYPE_TABLE: &[(&str, ColumnType)] = &[
    ("tinyint", ColumnType::TinyInt),
    ("smallint", ColumnType::SmallInt),
    ("int", ColumnType::Integer),
    ("integer", ColumnType::Integer),
    ("mediumint", ColumnType::MediumInt),
    ("bigint", ColumnType::BigInt),
    ("boolean", ColumnType::Boolean),
    ("bool", ColumnType::Boolean),
    ("numeric", ColumnType::Decimal),
    ("decimal", ColumnType::Decimal),
    ("real", ColumnType::Float),
    ("float", ColumnType::Float),
    ("double", ColumnType::Float),
    ("char", ColumnType::String),
    ("character", ColumnType::String),
    ("nchar", ColumnType::String),
    ("varchar", ColumnType::String),
    ("nvarchar", ColumnType::String),
    ("text", ColumnType::Text),
    ("clob", ColumnType::Text),
    ("binary", ColumnType::Binary),
    ("varbinary", ColumnType::Binary),
    ("blob", ColumnType::Blob),
    ("date", ColumnType::Date),
    ("datetime", ColumnType::DateTime),
    ("timestamp", ColumnType::DateTime),
    ("time", ColumnType::Time),
    ("json", ColumnType::Json),
];

pub(crate) fn map_raw_type(raw_type: &str) -> ColumnType {
    let raw = raw_type.trim().to_ascii_lowercase();
    // A column declared without a type has BLOB affinity
    if raw.is_empty() {
        return ColumnType::Blob;
    }
    let base = raw
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default();

    match TYPE_TABLE.iter().find(|(name, _)| *name == base) {
        Some((_, kind)) => *kind,
        None => {
            tracing::warn!(raw_type = %raw_type, "unknown SQLite column type");
            ColumnType::Unknown
        }
    }
}

/// Numbers inside the parentheses of a declared type, e.g. `NUMERIC(10, 2)`
fn type_arguments(raw_type: &str) -> Vec<u32> {
    raw_type
        .split_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(args, _)| {
            args.split(',')
                .filter_map(|a| a.trim().parse::<u32>().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// `dflt_value` holds the default as SQL text
pub(crate) fn normalize_default(raw: Option<&str>) -> Option<ColumnDefault> {
    let raw = raw?.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("NULL") {
        return None;
    }
    if let Some(inner) = raw.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        return Some(ColumnDefault::Literal(inner.replace("''", "'")));
    }
    let upper = raw.to_ascii_uppercase();
    if raw.starts_with('(') || upper.starts_with("CURRENT_") {
        return Some(ColumnDefault::Expression(raw.to_string()));
    }
    Some(ColumnDefault::Literal(raw.to_string()))
}

pub(crate) fn columns_from_rows(rows: &[Row]) -> Result<Vec<Column>> {
    let pk_columns = rows
        .iter()
        .filter(|row| row.i64_by_name("pk").unwrap_or(0) > 0)
        .count();
    rows.iter()
        .map(|row| column_from_row(row, pk_columns))
        .collect()
}

fn column_from_row(row: &Row, pk_columns: usize) -> Result<Column> {
    let name = row.require_str("name")?.to_string();
    let platform_type = row.str_by_name("column_type").unwrap_or_default().to_string();
    let column_type = map_raw_type(&platform_type);
    let args = type_arguments(&platform_type);
    let primary = row.i64_by_name("pk").unwrap_or(0) > 0;

    let length = match column_type.canonical_length() {
        Some(len) => Some(len),
        None if column_type.has_declared_length() => args.first().copied(),
        None => None,
    };
    let (precision, scale) = if column_type == ColumnType::Decimal {
        (args.first().copied(), args.get(1).copied())
    } else {
        (None, None)
    };

    // A lone INTEGER primary key aliases the rowid and is assigned automatically
    let rowid_alias = primary && pk_columns == 1 && platform_type.eq_ignore_ascii_case("integer");

    Ok(Column {
        column_type,
        length,
        precision,
        scale,
        unsigned: platform_type.to_ascii_lowercase().contains("unsigned"),
        fixed: matches!(
            platform_type.to_ascii_lowercase().split('(').next(),
            Some("char" | "character" | "nchar" | "binary")
        ),
        notnull: row.bool_by_name("notnull").unwrap_or(false) || rowid_alias,
        autoincrement: rowid_alias,
        default: normalize_default(row.str_by_name("column_default")),
        primary,
        comment: None,
        name,
        platform_type,
    })
}

pub(crate) fn indexes_from_rows(rows: &[Row]) -> Result<Vec<Index>> {
    let mut grouped: IndexMap<String, Index> = IndexMap::new();

    for row in rows {
        let name = row.require_str("name")?;
        let index = grouped.entry(name.to_string()).or_insert_with(|| Index {
            name: name.to_string(),
            columns: Vec::new(),
            unique: !row.bool_by_name("non_unique").unwrap_or(true),
            primary: name == PRIMARY_KEY_INDEX,
        });
        // Expression index parts report no column name
        if let Some(column) = row.str_by_name("column_name") {
            index.columns.push(column.to_string());
        }
    }

    grouped.retain(|_, index| !index.columns.is_empty());
    Ok(grouped.into_values().collect())
}

pub(crate) fn foreign_keys_from_rows(rows: &[Row]) -> Result<Vec<ForeignKey>> {
    let mut grouped: IndexMap<String, ForeignKey> = IndexMap::new();

    for row in rows {
        let name = row.require_str("name")?;
        let local = row.require_str("column_name")?.to_string();
        let foreign = row.require_str("referenced_column")?.to_string();

        match grouped.get_mut(name) {
            Some(fk) => {
                fk.local_columns.push(local);
                fk.foreign_columns.push(foreign);
            }
            None => {
                let fk = ForeignKey {
                    name: name.to_string(),
                    local_columns: vec![local],
                    foreign_table: row.require_str("referenced_table")?.to_string(),
                    foreign_columns: vec![foreign],
                    on_update: ForeignKeyAction::parse(
                        row.str_by_name("update_rule").unwrap_or_default(),
                    ),
                    on_delete: ForeignKeyAction::parse(
                        row.str_by_name("delete_rule").unwrap_or_default(),
                    ),
                };
                grouped.insert(name.to_string(), fk);
            }
        }
    }

    grouped
        .into_values()
        .map(|fk| fk.validate().map(|_| fk))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabula_core::Value;

    fn table_info(name: &str, ty: &str, notnull: i64, default: Value, pk: i64) -> Row {
        Row::new(
            ["name", "column_type", "notnull", "column_default", "pk"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            vec![
                Value::from(name),
                Value::from(ty),
                Value::Int64(notnull),
                default,
                Value::Int64(pk),
            ],
        )
    }

    #[test]
    fn declared_types_resolve_through_the_table() {
        assert_eq!(map_raw_type("INTEGER"), ColumnType::Integer);
        assert_eq!(map_raw_type("TINYINT"), ColumnType::TinyInt);
        assert_eq!(map_raw_type("MEDIUMINT"), ColumnType::MediumInt);
        assert_eq!(map_raw_type("VARCHAR(255)"), ColumnType::String);
        assert_eq!(map_raw_type("DOUBLE PRECISION"), ColumnType::Float);
        assert_eq!(map_raw_type("NUMERIC(10, 2)"), ColumnType::Decimal);
        assert_eq!(map_raw_type(""), ColumnType::Blob);
        assert_eq!(map_raw_type("GEOMETRY"), ColumnType::Unknown);
    }

    #[test]
    fn rowid_alias_is_autoincrement() {
        let rows = vec![
            table_info("id", "INTEGER", 0, Value::Null, 1),
            table_info("test", "VARCHAR(255)", 0, Value::Null, 0),
        ];
        let columns = columns_from_rows(&rows).unwrap();

        assert_eq!(columns[0].column_type, ColumnType::Integer);
        assert_eq!(columns[0].length, Some(4));
        assert!(columns[0].primary);
        assert!(columns[0].notnull);
        assert!(columns[0].autoincrement);
        assert_eq!(columns[0].default, None);

        assert_eq!(columns[1].column_type, ColumnType::String);
        assert_eq!(columns[1].length, Some(255));
        assert!(!columns[1].notnull);
        assert!(!columns[1].autoincrement);
        assert_eq!(columns[1].default, None);
    }

    #[test]
    fn composite_integer_keys_are_not_rowid_aliases() {
        let rows = vec![
            table_info("a", "INTEGER", 1, Value::Null, 1),
            table_info("b", "INTEGER", 1, Value::Null, 2),
        ];
        let columns = columns_from_rows(&rows).unwrap();
        assert!(columns.iter().all(|c| c.primary && !c.autoincrement));
    }

    #[test]
    fn decimal_and_fixed_types_carry_their_arguments() {
        let rows = vec![
            table_info("price", "NUMERIC(10, 2)", 1, Value::from("0"), 0),
            table_info("code", "CHAR(2)", 1, Value::from("'US'"), 0),
        ];
        let columns = columns_from_rows(&rows).unwrap();
        assert_eq!((columns[0].precision, columns[0].scale), (Some(10), Some(2)));
        assert_eq!(columns[0].default, Some(ColumnDefault::Literal("0".into())));
        assert!(columns[1].fixed);
        assert_eq!(columns[1].length, Some(2));
        assert_eq!(columns[1].default, Some(ColumnDefault::Literal("US".into())));
    }

    #[test]
    fn defaults_are_unquoted_or_flagged() {
        assert_eq!(normalize_default(None), None);
        assert_eq!(normalize_default(Some("NULL")), None);
        assert_eq!(
            normalize_default(Some("'it''s'")),
            Some(ColumnDefault::Literal("it's".into()))
        );
        assert_eq!(
            normalize_default(Some("CURRENT_TIMESTAMP")),
            Some(ColumnDefault::Expression("CURRENT_TIMESTAMP".into()))
        );
        assert_eq!(
            normalize_default(Some("(datetime('now'))")),
            Some(ColumnDefault::Expression("(datetime('now'))".into()))
        );
    }

    #[test]
    fn foreign_keys_group_by_derived_name() {
        let columns: Vec<String> = [
            "name",
            "column_name",
            "referenced_table",
            "referenced_column",
            "update_rule",
            "delete_rule",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        let rows = vec![
            Row::new(
                columns.clone(),
                ["fk_child_0", "a", "parent", "x", "NO ACTION", "CASCADE"]
                    .iter()
                    .map(|v| Value::from(*v))
                    .collect(),
            ),
            Row::new(
                columns,
                ["fk_child_0", "b", "parent", "y", "NO ACTION", "CASCADE"]
                    .iter()
                    .map(|v| Value::from(*v))
                    .collect(),
            ),
        ];

        let fks = foreign_keys_from_rows(&rows).unwrap();
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].local_columns, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(fks[0].foreign_columns, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(fks[0].on_delete, ForeignKeyAction::Cascade);
    }
}
