//! Projection of MySQL catalog rows onto the portable model

use indexmap::IndexMap;
use tabula_core::{
    Column, ColumnDefault, ColumnType, ForeignKey, ForeignKeyAction, Index, PRIMARY_KEY_INDEX,
    Result, Row,
};

/// `DATA_TYPE` name to abstract kind
static TYPE_TABLE: &[(&str, ColumnType)] = &[
    ("tinyint", ColumnType::TinyInt),
    ("smallint", ColumnType::SmallInt),
    ("mediumint", ColumnType::MediumInt),
    ("int", ColumnType::Integer),
    ("integer", ColumnType::Integer),
    ("bigint", ColumnType::BigInt),
    ("bit", ColumnType::Boolean),
    ("bool", ColumnType::Boolean),
    ("boolean", ColumnType::Boolean),
    ("decimal", ColumnType::Decimal),
    ("numeric", ColumnType::Decimal),
    ("float", ColumnType::Float),
    ("double", ColumnType::Float),
    ("real", ColumnType::Float),
    ("char", ColumnType::String),
    ("varchar", ColumnType::String),
    ("enum", ColumnType::String),
    ("set", ColumnType::String),
    ("tinytext", ColumnType::Text),
    ("text", ColumnType::Text),
    ("mediumtext", ColumnType::Text),
    ("longtext", ColumnType::Text),
    ("binary", ColumnType::Binary),
    ("varbinary", ColumnType::Binary),
    ("tinyblob", ColumnType::Blob),
    ("blob", ColumnType::Blob),
    ("mediumblob", ColumnType::Blob),
    ("longblob", ColumnType::Blob),
    ("date", ColumnType::Date),
    ("year", ColumnType::Date),
    ("datetime", ColumnType::DateTime),
    ("timestamp", ColumnType::DateTime),
    ("time", ColumnType::Time),
    ("json", ColumnType::Json),
];

/// Resolve a raw MySQL type (`DATA_TYPE` or full `COLUMN_TYPE`)
pub(crate) fn map_raw_type(raw_type: &str) -> ColumnType {
    let raw = raw_type.trim().to_ascii_lowercase();
    if raw.starts_with("tinyint(1)") {
        return ColumnType::Boolean;
    }
    let base = raw
        .split(|c: char| c == '(' || c.is_whitespace())
        .next()
        .unwrap_or_default();

    match TYPE_TABLE.iter().find(|(name, _)| *name == base) {
        Some((_, kind)) => *kind,
        None => {
            tracing::warn!(raw_type = %raw_type, "unknown MySQL column type");
            ColumnType::Unknown
        }
    }
}

const EXPRESSION_DEFAULTS: &[&str] = &[
    "CURRENT_TIMESTAMP",
    "CURRENT_DATE",
    "CURRENT_TIME",
    "LOCALTIME",
    "LOCALTIMESTAMP",
    "NOW(",
];

/// Normalize `COLUMN_DEFAULT`; an empty or absent default becomes `None`
pub(crate) fn normalize_default(raw: Option<&str>, extra: &str) -> Option<ColumnDefault> {
    let raw = raw?.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("NULL") {
        return None;
    }

    let upper = raw.to_ascii_uppercase();
    if extra.to_ascii_uppercase().contains("DEFAULT_GENERATED")
        || EXPRESSION_DEFAULTS.iter().any(|e| upper.starts_with(e))
    {
        return Some(ColumnDefault::Expression(raw.to_string()));
    }

    // MariaDB quotes literal defaults in the catalog
    let literal = raw
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .map(|s| s.replace("''", "'"))
        .unwrap_or_else(|| raw.to_string());
    if literal.is_empty() {
        None
    } else {
        Some(ColumnDefault::Literal(literal))
    }
}

fn to_u32(value: Option<i64>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}

pub(crate) fn columns_from_rows(rows: &[Row]) -> Result<Vec<Column>> {
    rows.iter().map(column_from_row).collect()
}

fn column_from_row(row: &Row) -> Result<Column> {
    let name = row.require_str("name")?.to_string();
    let data_type = row.require_str("data_type")?.to_ascii_lowercase();
    let platform_type = row
        .str_by_name("column_type")
        .unwrap_or(&data_type)
        .to_string();
    let extra = row.str_by_name("extra").unwrap_or_default();
    let column_type = map_raw_type(&platform_type);

    let length = match column_type.canonical_length() {
        Some(len) => Some(len),
        None if column_type.has_declared_length() => to_u32(row.i64_by_name("char_length")),
        None => None,
    };
    let (precision, scale) = if matches!(column_type, ColumnType::Decimal | ColumnType::Float) {
        (
            to_u32(row.i64_by_name("numeric_precision")),
            to_u32(row.i64_by_name("numeric_scale")),
        )
    } else {
        (None, None)
    };

    Ok(Column {
        column_type,
        length,
        precision,
        scale,
        unsigned: platform_type.to_ascii_lowercase().contains("unsigned"),
        fixed: matches!(data_type.as_str(), "char" | "binary"),
        notnull: !row.bool_by_name("nullable").unwrap_or(true),
        autoincrement: extra.to_ascii_lowercase().contains("auto_increment"),
        default: normalize_default(row.str_by_name("column_default"), extra),
        primary: row.str_by_name("column_key") == Some("PRI"),
        comment: row
            .str_by_name("column_comment")
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        name,
        platform_type,
    })
}

/// Group per-column STATISTICS rows into indexes, in catalog order
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
        // Functional index parts have no column
        if let Some(column) = row.str_by_name("column_name") {
            index.columns.push(column.to_string());
        }
    }

    Ok(grouped
        .into_values()
        .filter(|index| {
            if index.columns.is_empty() {
                tracing::debug!(index = %index.name, "skipping index without column references");
            }
            !index.columns.is_empty()
        })
        .collect())
}

pub(crate) fn foreign_keys_from_rows(rows: &[Row]) -> Result<Vec<ForeignKey>> {
    let mut grouped: IndexMap<String, ForeignKey> = IndexMap::new();

    for row in rows {
        let name = row.require_str("name")?;
        let local = row.require_str("column_name")?;
        let foreign = row.require_str("referenced_column")?;

        if let Some(fk) = grouped.get_mut(name) {
            fk.local_columns.push(local.to_string());
            fk.foreign_columns.push(foreign.to_string());
        } else {
            grouped.insert(
                name.to_string(),
                ForeignKey {
                    name: name.to_string(),
                    local_columns: vec![local.to_string()],
                    foreign_table: row.require_str("referenced_table")?.to_string(),
                    foreign_columns: vec![foreign.to_string()],
                    on_update: ForeignKeyAction::parse(
                        row.str_by_name("update_rule").unwrap_or("NO ACTION"),
                    ),
                    on_delete: ForeignKeyAction::parse(
                        row.str_by_name("delete_rule").unwrap_or("NO ACTION"),
                    ),
                },
            );
        }
    }

    let foreign_keys: Vec<ForeignKey> = grouped.into_values().collect();
    for fk in &foreign_keys {
        fk.validate()?;
    }
    Ok(foreign_keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabula_core::Value;

    fn row(pairs: &[(&str, Value)]) -> Row {
        Row::new(
            pairs.iter().map(|(k, _)| k.to_string()).collect(),
            pairs.iter().map(|(_, v)| v.clone()).collect(),
        )
    }

    fn s(v: &str) -> Value {
        Value::from(v)
    }

    #[test]
    fn raw_types_resolve_through_the_table() {
        assert_eq!(map_raw_type("int(11)"), ColumnType::Integer);
        assert_eq!(map_raw_type("INT UNSIGNED"), ColumnType::Integer);
        assert_eq!(map_raw_type("tinyint(1)"), ColumnType::Boolean);
        assert_eq!(map_raw_type("tinyint(4)"), ColumnType::TinyInt);
        assert_eq!(map_raw_type("mediumint(9)"), ColumnType::MediumInt);
        assert_eq!(map_raw_type("varchar(255)"), ColumnType::String);
        assert_eq!(map_raw_type("longtext"), ColumnType::Text);
        assert_eq!(map_raw_type("geometry"), ColumnType::Unknown);
    }

    #[test]
    fn defaults_distinguish_literals_expressions_and_absence() {
        assert_eq!(normalize_default(None, ""), None);
        assert_eq!(normalize_default(Some(""), ""), None);
        assert_eq!(normalize_default(Some("NULL"), ""), None);
        assert_eq!(
            normalize_default(Some("abc"), ""),
            Some(ColumnDefault::Literal("abc".into()))
        );
        assert_eq!(
            normalize_default(Some("'it''s'"), ""),
            Some(ColumnDefault::Literal("it's".into()))
        );
        assert_eq!(
            normalize_default(Some("CURRENT_TIMESTAMP"), "DEFAULT_GENERATED"),
            Some(ColumnDefault::Expression("CURRENT_TIMESTAMP".into()))
        );
        assert_eq!(
            normalize_default(Some("current_timestamp()"), ""),
            Some(ColumnDefault::Expression("current_timestamp()".into()))
        );
    }

    #[test]
    fn integer_and_string_columns_normalize() {
        let rows = vec![
            row(&[
                ("name", s("id")),
                ("data_type", s("int")),
                ("column_type", s("int")),
                ("nullable", s("NO")),
                ("column_default", Value::Null),
                ("char_length", Value::Null),
                ("numeric_precision", Value::Int64(10)),
                ("numeric_scale", Value::Int64(0)),
                ("column_key", s("PRI")),
                ("extra", s("auto_increment")),
                ("column_comment", s("")),
            ]),
            row(&[
                ("name", s("test")),
                ("data_type", s("varchar")),
                ("column_type", s("varchar(255)")),
                ("nullable", s("YES")),
                ("column_default", Value::Null),
                ("char_length", Value::Int64(255)),
                ("numeric_precision", Value::Null),
                ("numeric_scale", Value::Null),
                ("column_key", s("")),
                ("extra", s("")),
                ("column_comment", s("")),
            ]),
        ];

        let columns = columns_from_rows(&rows).unwrap();
        assert_eq!(columns.len(), 2);

        let id = &columns[0];
        assert_eq!(id.name, "id");
        assert_eq!(id.column_type, ColumnType::Integer);
        assert_eq!(id.length, Some(4));
        assert!(!id.unsigned);
        assert!(!id.fixed);
        assert!(id.notnull);
        assert!(id.autoincrement);
        assert!(id.primary);
        assert_eq!(id.default, None);
        assert_eq!(id.precision, None);

        let test = &columns[1];
        assert_eq!(test.column_type, ColumnType::String);
        assert_eq!(test.length, Some(255));
        assert!(!test.notnull);
        assert!(!test.fixed);
        assert_eq!(test.default, None);
        assert_eq!(test.comment, None);
    }

    #[test]
    fn unsigned_and_fixed_flags_come_from_raw_type() {
        let rows = vec![
            row(&[
                ("name", s("n")),
                ("data_type", s("bigint")),
                ("column_type", s("bigint(20) unsigned")),
                ("nullable", s("YES")),
            ]),
            row(&[
                ("name", s("code")),
                ("data_type", s("char")),
                ("column_type", s("char(2)")),
                ("nullable", s("NO")),
                ("char_length", Value::Int64(2)),
                ("column_default", s("US")),
            ]),
        ];

        let columns = columns_from_rows(&rows).unwrap();
        assert!(columns[0].unsigned);
        assert_eq!(columns[0].length, Some(8));
        assert!(columns[1].fixed);
        assert_eq!(columns[1].length, Some(2));
        assert_eq!(columns[1].default, Some(ColumnDefault::Literal("US".into())));
    }

    #[test]
    fn index_rows_group_by_name_and_skip_missing_columns() {
        let rows = vec![
            row(&[("name", s("PRIMARY")), ("column_name", s("id")), ("non_unique", Value::Int64(0))]),
            row(&[("name", s("ab_idx")), ("column_name", s("a")), ("non_unique", Value::Int64(1))]),
            row(&[("name", s("ab_idx")), ("column_name", s("b")), ("non_unique", Value::Int64(1))]),
            row(&[("name", s("expr_idx")), ("column_name", Value::Null), ("non_unique", Value::Int64(1))]),
        ];

        let indexes = indexes_from_rows(&rows).unwrap();
        assert_eq!(
            indexes,
            vec![
                Index {
                    name: "PRIMARY".into(),
                    columns: vec!["id".into()],
                    unique: true,
                    primary: true,
                },
                Index {
                    name: "ab_idx".into(),
                    columns: vec!["a".into(), "b".into()],
                    unique: false,
                    primary: false,
                },
            ]
        );
    }

    #[test]
    fn foreign_key_rows_group_with_rules() {
        let rows = vec![row(&[
            ("name", s("testing")),
            ("column_name", s("test")),
            ("referenced_table", s("list_table_foreign_keys_test")),
            ("referenced_column", s("id")),
            ("update_rule", s("RESTRICT")),
            ("delete_rule", s("CASCADE")),
        ])];

        let fks = foreign_keys_from_rows(&rows).unwrap();
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].foreign_table, "list_table_foreign_keys_test");
        assert_eq!(fks[0].local_columns, vec!["test".to_string()]);
        assert_eq!(fks[0].foreign_columns, vec!["id".to_string()]);
        assert_eq!(fks[0].on_update, ForeignKeyAction::Restrict);
        assert_eq!(fks[0].on_delete, ForeignKeyAction::Cascade);
    }
}
