//! Tests for the schema manager.

use super::*;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use tabula_core::{
    ColumnDefinition, ColumnType, IndexDefinition, QueryResult, ResultExt, StatementResult, Value,
};
use tabula_driver_mysql::MySqlPlatform;
use tabula_driver_sqlite::{SqliteConnection, SqlitePlatform};

/// Records every statement and answers queries from a queue of canned results
#[derive(Default)]
struct RecordingConnection {
    executed: Mutex<Vec<String>>,
    queried: Mutex<Vec<(String, Vec<Value>)>>,
    results: Mutex<VecDeque<QueryResult>>,
    /// Statements starting with this prefix fail with a referential error
    fail_on: Option<&'static str>,
}

impl RecordingConnection {
    fn with_result(self, columns: &[&str], rows: Vec<Vec<Value>>) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|values| Row::new(columns.clone(), values))
            .collect();
        self.results.lock().push_back(QueryResult {
            columns,
            rows,
            execution_time_ms: 0,
        });
        self
    }

    fn failing_on(mut self, prefix: &'static str) -> Self {
        self.fail_on = Some(prefix);
        self
    }

    fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }

    fn statement_count(&self) -> usize {
        self.executed.lock().len() + self.queried.lock().len()
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    fn driver_name(&self) -> &str {
        "recording"
    }

    async fn execute(&self, sql: &str, _params: &[Value]) -> Result<StatementResult> {
        self.executed.lock().push(sql.to_string());
        if self.fail_on.is_some_and(|prefix| sql.starts_with(prefix)) {
            return Err(TabulaError::Referential("cannot add foreign key".into()));
        }
        Ok(StatementResult { affected_rows: 0 })
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        self.queried.lock().push((sql.to_string(), params.to_vec()));
        Ok(self.results.lock().pop_front().unwrap_or_default())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

fn sqlite() -> (SchemaManager<SqlitePlatform>, SqliteConnection) {
    let conn = SqliteConnection::open(":memory:").unwrap();
    (SchemaManager::new(SqlitePlatform::new()), conn)
}

fn id_and_test(name: &str) -> TableDefinition {
    TableDefinition::new(name)
        .column(
            "id",
            ColumnDefinition::new(ColumnType::Integer).autoincrement().primary(),
        )
        .column("test", ColumnDefinition::new(ColumnType::String).length(255))
}

mod sqlite_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn columns_of_a_fresh_table() {
        let (manager, conn) = sqlite();
        manager
            .create_table(&conn, &id_and_test("list_table_columns"))
            .await
            .unwrap();

        let columns = manager
            .list_table_columns(&conn, "list_table_columns")
            .await
            .unwrap();
        assert_eq!(columns.len(), 2);

        assert_eq!(columns[0].name, "id");
        assert!(columns[0].primary);
        assert!(columns[0].autoincrement);
        assert!(columns[0].notnull);
        assert_eq!(columns[0].column_type, ColumnType::Integer);
        assert_eq!(columns[0].length, Some(4));
        assert_eq!(columns[0].default, None);

        assert_eq!(columns[1].name, "test");
        assert_eq!(columns[1].column_type, ColumnType::String);
        assert_eq!(columns[1].length, Some(255));
        assert!(!columns[1].notnull);
        assert_eq!(columns[1].default, None);
    }

    #[tokio::test]
    async fn unique_index_is_listed_after_primary() {
        let (manager, conn) = sqlite();
        let table = id_and_test("list_table_indexes_test")
            .index("test_index_name", IndexDefinition::unique(["test"]));
        manager.create_table(&conn, &table).await.unwrap();

        let indexes = manager
            .list_table_indexes(&conn, "list_table_indexes_test")
            .await
            .unwrap();
        assert_eq!(indexes.len(), 2);
        assert_eq!(indexes[0].name, "PRIMARY");
        assert!(indexes[0].primary);
        assert_eq!(indexes[1].name, "test_index_name");
        assert!(indexes[1].unique);
        assert!(!indexes[1].primary);
        assert_eq!(indexes[1].columns, vec!["test".to_string()]);
    }

    #[tokio::test]
    async fn tables_drop_and_recreate() {
        let (manager, conn) = sqlite();
        let table = id_and_test("list_tables_test");

        manager
            .drop_table(&conn, "list_tables_test")
            .await
            .ignore_not_found()
            .unwrap();
        manager.create_table(&conn, &table).await.unwrap();
        assert!(
            manager
                .create_table(&conn, &table)
                .await
                .unwrap_err()
                .is_already_exists()
        );
        assert_eq!(
            manager.list_tables(&conn).await.unwrap(),
            vec!["list_tables_test".to_string()]
        );

        manager.drop_table(&conn, "list_tables_test").await.unwrap();
        let err = manager
            .list_table_columns(&conn, "list_tables_test")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(
            manager
                .drop_table(&conn, "list_tables_test")
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn failed_index_leaves_no_table_behind() {
        let (manager, conn) = sqlite();
        let a = id_and_test("a").index("test_index_name", IndexDefinition::unique(["test"]));
        manager.create_table(&conn, &a).await.unwrap();

        // Index names are database-global, so the index of `b` collides with `a`'s
        let b = id_and_test("b").index("test_index_name", IndexDefinition::unique(["test"]));
        assert!(manager.create_table(&conn, &b).await.is_err());
        assert_eq!(manager.list_tables(&conn).await.unwrap(), vec!["a".to_string()]);

        let b = id_and_test("b").index("b_test_index", IndexDefinition::unique(["test"]));
        manager.create_table(&conn, &b).await.unwrap();
        assert_eq!(
            manager.list_tables(&conn).await.unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[tokio::test]
    async fn multi_statement_create_runs_in_a_transaction() {
        let manager = SchemaManager::new(SqlitePlatform::new());
        let conn = RecordingConnection::default();
        let table = id_and_test("t").index("t_test", IndexDefinition::simple(["test"]));

        manager.create_table(&conn, &table).await.unwrap();

        let executed = conn.executed();
        assert_eq!(executed.len(), 4);
        assert_eq!(executed[0], "BEGIN");
        assert!(executed[1].starts_with("CREATE TABLE \"t\""));
        assert!(executed[2].starts_with("CREATE INDEX \"t_test\""));
        assert_eq!(executed[3], "COMMIT");
    }

    #[tokio::test]
    async fn underscore_is_not_a_wildcard_in_the_internal_table_filter() {
        let (manager, conn) = sqlite();
        manager.create_table(&conn, &id_and_test("sqlitex")).await.unwrap();
        manager
            .create_table(&conn, &id_and_test("sqlite_like"))
            .await
            .unwrap_err();
        manager.create_table(&conn, &id_and_test("sqlite1x")).await.unwrap();

        assert_eq!(
            manager.list_tables(&conn).await.unwrap(),
            vec!["sqlite1x".to_string(), "sqlitex".to_string()]
        );
    }

    #[tokio::test]
    async fn primary_key_is_the_only_constraint() {
        let (manager, conn) = sqlite();
        manager
            .create_table(&conn, &id_and_test("list_table_constraints"))
            .await
            .unwrap();
        assert_eq!(
            manager
                .list_table_constraints(&conn, "list_table_constraints")
                .await
                .unwrap(),
            vec!["PRIMARY".to_string()]
        );
    }

    #[tokio::test]
    async fn inline_foreign_keys_are_introspected() {
        let (manager, conn) = sqlite();
        let parent = TableDefinition::new("list_table_foreign_keys_test")
            .column("id", ColumnDefinition::new(ColumnType::Integer).primary())
            .column("whatever", ColumnDefinition::new(ColumnType::String).length(255));
        let child = TableDefinition::new("list_table_foreign_keys_test2")
            .column("id", ColumnDefinition::new(ColumnType::Integer).primary())
            .column("test", ColumnDefinition::new(ColumnType::Integer).length(4))
            .foreign_key(ForeignKeyDefinition::new(
                "testing",
                "test",
                "list_table_foreign_keys_test",
                "id",
            ));
        manager.create_table(&conn, &parent).await.unwrap();
        manager.create_table(&conn, &child).await.unwrap();

        let fks = manager
            .list_table_foreign_keys(&conn, "list_table_foreign_keys_test2")
            .await
            .unwrap();
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].foreign_table, "list_table_foreign_keys_test");
        assert_eq!(fks[0].local_columns, vec!["test".to_string()]);
        assert_eq!(fks[0].foreign_columns, vec!["id".to_string()]);

        let details = manager
            .list_table_details(&conn, "list_table_foreign_keys_test2")
            .await
            .unwrap();
        assert_eq!(details.columns.len(), 2);
        assert_eq!(details.foreign_keys, fks);
        assert_eq!(
            details.primary_key().map(|pk| pk.columns.clone()),
            Some(vec!["id".to_string()])
        );
    }

    #[tokio::test]
    async fn views_round_trip_through_the_catalog() {
        let (manager, conn) = sqlite();
        manager
            .create_table(&conn, &id_and_test("view_source"))
            .await
            .unwrap();
        manager
            .create_view(&conn, "test_create_view", "SELECT id FROM view_source")
            .await
            .unwrap();

        let views = manager.list_views(&conn).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].name, "test_create_view");
        assert!(views[0].sql.contains("SELECT id FROM view_source"));

        manager.drop_view(&conn, "test_create_view").await.unwrap();
        assert!(manager.list_views(&conn).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn triggers_and_databases_are_listed() {
        let (manager, conn) = sqlite();
        manager
            .create_table(&conn, &id_and_test("audited"))
            .await
            .unwrap();
        conn.execute(
            "CREATE TRIGGER audited_insert AFTER INSERT ON audited BEGIN SELECT 1; END",
            &[],
        )
        .await
        .unwrap();

        let triggers = manager.list_triggers(&conn).await.unwrap();
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].name, "audited_insert");
        assert_eq!(triggers[0].table, "audited");

        let databases = manager.list_databases(&conn).await.unwrap();
        assert!(databases.iter().any(|db| db.name == "main"));
    }

    #[tokio::test]
    async fn unsupported_operations_never_reach_the_connection() {
        let manager = SchemaManager::new(SqlitePlatform::new());
        let conn = RecordingConnection::default();
        let fk = ForeignKeyDefinition::new("fk", "a", "b", "c");

        assert!(manager.create_database(&conn, "db").await.unwrap_err().is_unsupported());
        assert!(manager.drop_database(&conn, "db").await.unwrap_err().is_unsupported());
        assert!(manager.list_users(&conn).await.unwrap_err().is_unsupported());
        assert!(manager.list_functions(&conn).await.unwrap_err().is_unsupported());
        assert!(manager.list_sequences(&conn).await.unwrap_err().is_unsupported());
        assert!(
            manager
                .create_foreign_key(&conn, "t", &fk)
                .await
                .unwrap_err()
                .is_unsupported()
        );
        assert_eq!(conn.statement_count(), 0);
    }
}

mod mysql_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn create_table_runs_create_then_foreign_keys() {
        let manager = SchemaManager::new(MySqlPlatform::new());
        let conn = RecordingConnection::default();
        let table = id_and_test("child")
            .engine("InnoDB")
            .foreign_key(ForeignKeyDefinition::new("testing", "test", "parent", "id"));

        manager.create_table(&conn, &table).await.unwrap();

        let executed = conn.executed();
        assert_eq!(executed.len(), 2);
        assert!(executed[0].starts_with("CREATE TABLE `child`"));
        assert!(executed[0].ends_with("ENGINE = InnoDB"));
        assert!(executed[1].starts_with("ALTER TABLE `child` ADD CONSTRAINT `testing`"));
    }

    #[tokio::test]
    async fn failed_foreign_key_drops_the_new_table() {
        let manager = SchemaManager::new(MySqlPlatform::new());
        let conn = RecordingConnection::default().failing_on("ALTER TABLE");
        let table = id_and_test("child")
            .foreign_key(ForeignKeyDefinition::new("testing", "test", "parent", "id"));

        let err = manager.create_table(&conn, &table).await.unwrap_err();
        assert!(err.is_referential());

        let executed = conn.executed();
        assert_eq!(executed.len(), 3);
        assert!(executed[0].starts_with("CREATE TABLE `child`"));
        assert!(executed[1].starts_with("ALTER TABLE `child`"));
        assert_eq!(executed[2], "DROP TABLE `child`");
    }

    #[tokio::test]
    async fn functions_and_triggers_are_unsupported() {
        let manager = SchemaManager::new(MySqlPlatform::new());
        let conn = RecordingConnection::default();

        let err = manager.list_functions(&conn).await.unwrap_err();
        assert!(err.is_unsupported());
        assert!(err.to_string().contains("list_functions"));
        assert!(manager.list_triggers(&conn).await.unwrap_err().is_unsupported());
        assert_eq!(conn.statement_count(), 0);
    }

    #[tokio::test]
    async fn column_query_binds_the_table_name() {
        let manager = SchemaManager::new(MySqlPlatform::new());
        let conn = RecordingConnection::default().with_result(
            &["name", "data_type", "column_type", "nullable", "column_key", "extra"],
            vec![vec![
                Value::from("id"),
                Value::from("int"),
                Value::from("int"),
                Value::from("NO"),
                Value::from("PRI"),
                Value::from("auto_increment"),
            ]],
        );

        let columns = manager.list_table_columns(&conn, "t").await.unwrap();
        assert_eq!(columns.len(), 1);
        assert!(columns[0].autoincrement);

        let queried = conn.queried.lock();
        assert_eq!(queried[0].1, vec![Value::from("t")]);
    }

    #[tokio::test]
    async fn databases_are_created_and_dropped() {
        let manager = SchemaManager::new(MySqlPlatform::new());
        let conn = RecordingConnection::default();

        manager.create_database(&conn, "test_create_database").await.unwrap();
        manager.drop_database(&conn, "test_create_database").await.unwrap();

        assert_eq!(
            conn.executed(),
            vec![
                "CREATE DATABASE `test_create_database`".to_string(),
                "DROP DATABASE `test_create_database`".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn missing_table_has_no_columns() {
        let manager = SchemaManager::new(MySqlPlatform::new());
        let conn = RecordingConnection::default();
        let err = manager.list_table_columns(&conn, "nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn users_carry_their_host() {
        let manager = SchemaManager::new(MySqlPlatform::new());
        let conn = RecordingConnection::default().with_result(
            &["name", "host"],
            vec![
                vec![Value::from("root"), Value::from("localhost")],
                vec![Value::from("app"), Value::from("%")],
            ],
        );

        let users = manager.list_users(&conn).await.unwrap();
        assert_eq!(
            users,
            vec![
                User {
                    name: "root".into(),
                    host: Some("localhost".into()),
                },
                User {
                    name: "app".into(),
                    host: Some("%".into()),
                },
            ]
        );
    }

    #[tokio::test]
    async fn tables_are_sorted_and_sequences_name_their_table() {
        let manager = SchemaManager::new(MySqlPlatform::new());
        let conn = RecordingConnection::default()
            .with_result(&["name"], vec![vec![Value::from("b")], vec![Value::from("a")]])
            .with_result(&["name"], vec![vec![Value::from("list_sequences_test")]]);

        assert_eq!(
            manager.list_tables(&conn).await.unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert_eq!(
            manager.list_sequences(&conn).await.unwrap(),
            vec!["list_sequences_test".to_string()]
        );
    }
}
