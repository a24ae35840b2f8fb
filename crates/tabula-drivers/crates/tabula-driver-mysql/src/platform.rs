//! MySQL DDL generation and the `Platform` implementation

use tabula_core::{
    CatalogQuery, CatalogStatement, Column, ColumnDefault, ColumnDefinition, ColumnType,
    ForeignKey, ForeignKeyDefinition, Index, Platform, PlatformCapabilities, Result, Row,
    TableDefinition, TabulaError,
};

use crate::{catalog, normalize};

const DEFAULT_VARCHAR_LENGTH: u32 = 255;

/// MySQL platform
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlPlatform;

impl MySqlPlatform {
    pub fn new() -> Self {
        Self
    }

    fn type_declaration(&self, column: &ColumnDefinition) -> Result<String> {
        let sql = match column.column_type {
            ColumnType::TinyInt => "TINYINT".to_string(),
            ColumnType::SmallInt => "SMALLINT".to_string(),
            ColumnType::MediumInt => "MEDIUMINT".to_string(),
            ColumnType::Integer => "INT".to_string(),
            ColumnType::BigInt => "BIGINT".to_string(),
            ColumnType::Boolean => "TINYINT(1)".to_string(),
            ColumnType::Decimal => format!(
                "NUMERIC({}, {})",
                column.precision.unwrap_or(10),
                column.scale.unwrap_or(0)
            ),
            ColumnType::Float => "DOUBLE PRECISION".to_string(),
            ColumnType::String => {
                let length = column.length.unwrap_or(DEFAULT_VARCHAR_LENGTH);
                if column.fixed {
                    format!("CHAR({})", length)
                } else {
                    format!("VARCHAR({})", length)
                }
            }
            ColumnType::Text => sized_lob("TEXT", column.length).to_string(),
            ColumnType::Binary => {
                let length = column.length.unwrap_or(DEFAULT_VARCHAR_LENGTH);
                if column.fixed {
                    format!("BINARY({})", length)
                } else {
                    format!("VARBINARY({})", length)
                }
            }
            ColumnType::Blob => sized_lob("BLOB", column.length).to_string(),
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

    fn column_declaration(&self, name: &str, column: &ColumnDefinition) -> Result<String> {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(name),
            self.type_declaration(column)?
        );

        let numeric = column.column_type.is_integer()
            || matches!(column.column_type, ColumnType::Decimal | ColumnType::Float);
        if column.unsigned && numeric {
            sql.push_str(" UNSIGNED");
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
        if column.autoincrement {
            sql.push_str(" AUTO_INCREMENT");
        }
        if let Some(comment) = &column.comment {
            sql.push_str(" COMMENT ");
            sql.push_str(&quote_literal(comment));
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
}

fn sized_lob(base: &'static str, length: Option<u32>) -> &'static str {
    let (tiny, regular, medium, long) = match base {
        "BLOB" => ("TINYBLOB", "BLOB", "MEDIUMBLOB", "LONGBLOB"),
        _ => ("TINYTEXT", "TEXT", "MEDIUMTEXT", "LONGTEXT"),
    };
    match length {
        Some(len) if len <= 255 => tiny,
        Some(len) if len <= 65_535 => regular,
        Some(len) if len <= 16_777_215 => medium,
        _ => long,
    }
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

/// Table options are spliced into DDL, so only plain words are accepted
fn option_word<'a>(option: &str, value: &'a str) -> Result<&'a str> {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(value)
    } else {
        Err(TabulaError::Configuration(format!(
            "invalid {} option '{}'",
            option, value
        )))
    }
}

impl Platform for MySqlPlatform {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn capabilities(&self) -> PlatformCapabilities {
        PlatformCapabilities {
            databases: true,
            functions: false,
            triggers: false,
            sequences: true,
            users: true,
            storage_engines: true,
            alter_foreign_keys: true,
            // DDL commits implicitly
            transactional_ddl: false,
        }
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        format!("`{}`", identifier.replace('`', "``"))
    }

    fn create_database_sql(&self, name: &str) -> Result<String> {
        Ok(format!("CREATE DATABASE {}", self.quote_identifier(name)))
    }

    fn drop_database_sql(&self, name: &str) -> Result<String> {
        Ok(format!("DROP DATABASE {}", self.quote_identifier(name)))
    }

    fn create_table_sql(&self, table: &TableDefinition) -> Result<Vec<String>> {
        table.validate()?;

        let mut parts = Vec::with_capacity(table.columns.len() + table.options.indexes.len() + 1);
        for (name, column) in &table.columns {
            parts.push(self.column_declaration(name, column)?);
        }
        for (name, index) in &table.options.indexes {
            let keyword = if index.is_unique() { "UNIQUE INDEX" } else { "INDEX" };
            parts.push(format!(
                "{} {} ({})",
                keyword,
                self.quote_identifier(name),
                self.column_list(&index.fields)
            ));
        }
        let primary: Vec<String> = table
            .primary_key_columns()
            .into_iter()
            .map(str::to_string)
            .collect();
        if !primary.is_empty() {
            parts.push(format!("PRIMARY KEY ({})", self.column_list(&primary)));
        }

        let mut create = format!(
            "CREATE TABLE {} ({})",
            self.quote_identifier(&table.name),
            parts.join(", ")
        );
        let options = &table.options;
        if let Some(charset) = &options.charset {
            create.push_str(" DEFAULT CHARACTER SET ");
            create.push_str(option_word("charset", charset)?);
        }
        if let Some(collate) = &options.collate {
            create.push_str(" COLLATE ");
            create.push_str(option_word("collate", collate)?);
        }
        if let Some(engine) = &options.engine {
            create.push_str(" ENGINE = ");
            create.push_str(option_word("engine", engine)?);
        }
        if let Some(comment) = &options.comment {
            create.push_str(" COMMENT = ");
            create.push_str(&quote_literal(comment));
        }

        let mut statements = vec![create];
        for fk in &options.foreign_keys {
            statements.push(self.create_foreign_key_sql(&table.name, fk)?);
        }
        Ok(statements)
    }

    fn create_foreign_key_sql(
        &self,
        table: &str,
        foreign_key: &ForeignKeyDefinition,
    ) -> Result<String> {
        foreign_key.validate()?;

        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quote_identifier(table),
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tabula_core::{ForeignKeyAction, IndexDefinition};

    fn test_table(name: &str) -> TableDefinition {
        TableDefinition::new(name)
            .column(
                "id",
                ColumnDefinition::new(ColumnType::Integer).autoincrement().primary(),
            )
            .column("test", ColumnDefinition::new(ColumnType::String).length(255))
    }

    #[test]
    fn create_table_with_unique_index_and_engine() {
        let table = test_table("list_table_indexes_test")
            .index("test_index_name", IndexDefinition::unique(["test"]))
            .engine("InnoDB");

        let statements = MySqlPlatform.create_table_sql(&table).unwrap();
        assert_eq!(
            statements,
            vec![
                "CREATE TABLE `list_table_indexes_test` (\
                 `id` INT NOT NULL AUTO_INCREMENT, \
                 `test` VARCHAR(255) DEFAULT NULL, \
                 UNIQUE INDEX `test_index_name` (`test`), \
                 PRIMARY KEY (`id`)) ENGINE = InnoDB"
                    .to_string()
            ]
        );
    }

    #[test]
    fn inline_foreign_keys_follow_the_create_statement() {
        let table = test_table("child")
            .foreign_key(
                ForeignKeyDefinition::new("fk_parent", "test", "parent", "id")
                    .on_delete(ForeignKeyAction::Cascade),
            );

        let statements = MySqlPlatform.create_table_sql(&table).unwrap();
        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[1],
            "ALTER TABLE `child` ADD CONSTRAINT `fk_parent` FOREIGN KEY (`test`) \
             REFERENCES `parent` (`id`) ON DELETE CASCADE"
        );
    }

    #[test]
    fn column_declarations_cover_defaults_and_flags() {
        let platform = MySqlPlatform;
        let decl = |column: ColumnDefinition| platform.column_declaration("c", &column).unwrap();

        assert_eq!(
            decl(ColumnDefinition::new(ColumnType::Integer).unsigned().notnull()),
            "`c` INT UNSIGNED NOT NULL"
        );
        assert_eq!(
            decl(ColumnDefinition::new(ColumnType::String).length(2).fixed()),
            "`c` CHAR(2) DEFAULT NULL"
        );
        assert_eq!(
            decl(
                ColumnDefinition::new(ColumnType::String)
                    .notnull()
                    .default_value(ColumnDefault::Literal("it's".into()))
            ),
            "`c` VARCHAR(255) DEFAULT 'it''s' NOT NULL"
        );
        assert_eq!(
            decl(
                ColumnDefinition::new(ColumnType::DateTime)
                    .notnull()
                    .default_value(ColumnDefault::Expression("CURRENT_TIMESTAMP".into()))
            ),
            "`c` DATETIME DEFAULT CURRENT_TIMESTAMP NOT NULL"
        );
        assert_eq!(
            decl(ColumnDefinition::new(ColumnType::Text)),
            "`c` LONGTEXT DEFAULT NULL"
        );
        assert_eq!(
            decl(ColumnDefinition::new(ColumnType::Boolean).notnull()),
            "`c` TINYINT(1) NOT NULL"
        );
    }

    #[test]
    fn engine_option_rejects_injected_sql() {
        let table = test_table("t").engine("InnoDB; DROP TABLE users");
        let err = MySqlPlatform.create_table_sql(&table).unwrap_err();
        assert!(matches!(err, TabulaError::Configuration(_)));
    }

    #[test]
    fn identifiers_escape_backticks() {
        assert_eq!(MySqlPlatform.quote_identifier("we`ird"), "`we``ird`");
    }

    #[test]
    fn database_statements_quote_the_name() {
        assert_eq!(
            MySqlPlatform.create_database_sql("test_create_database").unwrap(),
            "CREATE DATABASE `test_create_database`"
        );
        assert_eq!(
            MySqlPlatform.drop_database_sql("test_create_database").unwrap(),
            "DROP DATABASE `test_create_database`"
        );
    }

    #[test]
    fn mysql_lacks_routine_and_trigger_catalogs() {
        use tabula_core::Feature;
        let platform = MySqlPlatform;
        assert!(!platform.supports(Feature::Functions));
        assert!(!platform.supports(Feature::Triggers));
        assert!(platform.supports(Feature::Databases));
        assert!(platform.supports(Feature::StorageEngines));
        assert!(!platform.supports(Feature::TransactionalDdl));
    }
}
