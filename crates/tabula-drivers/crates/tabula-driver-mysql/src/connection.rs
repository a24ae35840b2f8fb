//! MySQL connection implementation

use async_trait::async_trait;
use mysql_async::{
    Conn, Opts, OptsBuilder, Params, Pool, PoolConstraints, PoolOpts, Row as MySqlRow,
    consts::ColumnType, prelude::*,
};
use tabula_core::{Connection, QueryResult, Result, Row, StatementResult, TabulaError, Value};

use crate::errors::map_mysql_error;

/// MySQL connection wrapper
///
/// The pool is capped at a single physical connection with session reset
/// disabled, so every statement runs on the same server session one at a time.
pub struct MySqlConnection {
    pool: Pool,
    database_name: Option<String>,
}

impl MySqlConnection {
    /// Connect to a MySQL database
    pub async fn connect(
        host: &str,
        port: u16,
        database: Option<&str>,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self> {
        tracing::info!(host = %host, port = %port, database = ?database, "connecting to MySQL database");

        let mut opts_builder = OptsBuilder::from_opts(Opts::default())
            .ip_or_hostname(host)
            .tcp_port(port);

        if let Some(db) = database {
            opts_builder = opts_builder.db_name(Some(db));
        }
        if let Some(u) = user {
            opts_builder = opts_builder.user(Some(u));
        }
        if let Some(p) = password {
            opts_builder = opts_builder.pass(Some(p));
        }

        let constraints = PoolConstraints::new(1, 1).ok_or_else(|| {
            TabulaError::Configuration(
                "failed to configure MySQL pool constraints (min=1, max=1)".into(),
            )
        })?;
        let pool_opts = PoolOpts::default()
            .with_constraints(constraints)
            .with_reset_connection(false);
        opts_builder = opts_builder.pool_opts(pool_opts);

        let pool = Pool::new(Opts::from(opts_builder));

        // Verify connectivity and resolve the active database in one round trip
        let database_name = {
            let mut conn = pool.get_conn().await.map_err(map_mysql_error)?;
            let row: Option<(Option<String>,)> = conn
                .query_first("SELECT DATABASE()")
                .await
                .map_err(map_mysql_error)?;
            row.and_then(|(db,)| db)
        };

        tracing::info!(host = %host, port = %port, database = ?database_name, "MySQL connection established");
        Ok(Self {
            pool,
            database_name,
        })
    }

    async fn get_conn(&self) -> Result<Conn> {
        self.pool.get_conn().await.map_err(|e| {
            TabulaError::Transport(format!("failed to get MySQL connection: {}", e))
        })
    }

    /// Database selected at connect time, if any
    pub fn default_database(&self) -> Option<&str> {
        self.database_name.as_deref()
    }
}

fn value_to_mysql(value: &Value) -> mysql_async::Value {
    match value {
        Value::Null => mysql_async::Value::NULL,
        Value::Bool(v) => mysql_async::Value::Int(i64::from(*v)),
        Value::Int64(v) => mysql_async::Value::Int(*v),
        Value::Float64(v) => mysql_async::Value::Double(*v),
        Value::Decimal(v) | Value::String(v) => mysql_async::Value::Bytes(v.as_bytes().to_vec()),
        Value::Bytes(v) => mysql_async::Value::Bytes(v.clone()),
        Value::Date(v) => mysql_async::Value::Bytes(v.to_string().into_bytes()),
        Value::Time(v) => mysql_async::Value::Bytes(v.to_string().into_bytes()),
        Value::DateTime(v) => {
            mysql_async::Value::Bytes(v.format("%Y-%m-%d %H:%M:%S%.f").to_string().into_bytes())
        }
    }
}

fn params_for(values: &[Value]) -> Params {
    Params::Positional(values.iter().map(value_to_mysql).collect())
}

/// Convert mysql_async Value to our Value type, using column type metadata
/// to correctly interpret byte strings from the text protocol.
fn mysql_value_to_value(val: mysql_async::Value, col_type: ColumnType) -> Value {
    match val {
        mysql_async::Value::NULL => Value::Null,
        mysql_async::Value::Bytes(bytes) => match String::from_utf8(bytes) {
            Ok(s) => match col_type {
                ColumnType::MYSQL_TYPE_TINY
                | ColumnType::MYSQL_TYPE_SHORT
                | ColumnType::MYSQL_TYPE_LONG
                | ColumnType::MYSQL_TYPE_LONGLONG
                | ColumnType::MYSQL_TYPE_INT24
                | ColumnType::MYSQL_TYPE_YEAR => {
                    s.parse::<i64>().map(Value::Int64).unwrap_or(Value::String(s))
                }
                ColumnType::MYSQL_TYPE_FLOAT | ColumnType::MYSQL_TYPE_DOUBLE => {
                    s.parse::<f64>().map(Value::Float64).unwrap_or(Value::String(s))
                }
                ColumnType::MYSQL_TYPE_DECIMAL | ColumnType::MYSQL_TYPE_NEWDECIMAL => {
                    Value::Decimal(s)
                }
                _ => Value::String(s),
            },
            Err(e) => Value::Bytes(e.into_bytes()),
        },
        mysql_async::Value::Int(i) => Value::Int64(i),
        mysql_async::Value::UInt(u) => match i64::try_from(u) {
            Ok(v) => Value::Int64(v),
            Err(_) => Value::Decimal(u.to_string()),
        },
        mysql_async::Value::Float(f) => Value::Float64(f64::from(f)),
        mysql_async::Value::Double(d) => Value::Float64(d),
        mysql_async::Value::Date(year, month, day, hour, min, sec, micro) => {
            let date = chrono::NaiveDate::from_ymd_opt(year.into(), month.into(), day.into());
            if hour == 0 && min == 0 && sec == 0 && micro == 0 {
                date.map(Value::Date).unwrap_or_else(|| {
                    Value::String(format!("{:04}-{:02}-{:02}", year, month, day))
                })
            } else {
                date.and_then(|d| d.and_hms_micro_opt(hour.into(), min.into(), sec.into(), micro))
                    .map(Value::DateTime)
                    .unwrap_or_else(|| {
                        Value::String(format!(
                            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                            year, month, day, hour, min, sec
                        ))
                    })
            }
        }
        mysql_async::Value::Time(negative, days, hours, mins, secs, micros) => {
            let total_hours = days * 24 + u32::from(hours);
            let sign = if negative { "-" } else { "" };
            Value::String(format!(
                "{}{:02}:{:02}:{:02}.{:06}",
                sign, total_hours, mins, secs, micros
            ))
        }
    }
}

fn convert_rows(mysql_rows: Vec<MySqlRow>) -> (Vec<String>, Vec<Row>) {
    let mut column_names = Vec::new();
    let mut column_types = Vec::new();

    if let Some(first_row) = mysql_rows.first() {
        for col in first_row.columns_ref() {
            column_names.push(col.name_str().to_string());
            column_types.push(col.column_type());
        }
    }

    let rows = mysql_rows
        .into_iter()
        .map(|mut mysql_row| {
            let values = column_types
                .iter()
                .enumerate()
                .map(|(idx, col_type)| {
                    let val: mysql_async::Value =
                        mysql_row.take(idx).unwrap_or(mysql_async::Value::NULL);
                    mysql_value_to_value(val, *col_type)
                })
                .collect();
            Row::new(column_names.clone(), values)
        })
        .collect();

    (column_names, rows)
}

#[async_trait]
impl Connection for MySqlConnection {
    fn driver_name(&self) -> &str {
        "mysql"
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        let mut conn = self.get_conn().await?;

        if params.is_empty() {
            conn.query_drop(sql).await
        } else {
            conn.exec_drop(sql, params_for(params)).await
        }
        .map_err(map_mysql_error)?;

        let affected_rows = conn.affected_rows();
        tracing::debug!(affected_rows = affected_rows, "statement executed");
        Ok(StatementResult { affected_rows })
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let start_time = std::time::Instant::now();
        let mut conn = self.get_conn().await?;

        let mysql_rows = if params.is_empty() {
            conn.query::<MySqlRow, _>(sql).await
        } else {
            conn.exec::<MySqlRow, _, _>(sql, params_for(params)).await
        }
        .map_err(map_mysql_error)?;

        let (columns, rows) = convert_rows(mysql_rows);
        let execution_time_ms = start_time.elapsed().as_millis() as u64;

        tracing::debug!(
            row_count = rows.len(),
            execution_time_ms = execution_time_ms,
            "query executed successfully"
        );
        Ok(QueryResult {
            columns,
            rows,
            execution_time_ms,
        })
    }

    async fn close(&self) -> Result<()> {
        tracing::info!("closing MySQL connection pool");
        self.pool
            .clone()
            .disconnect()
            .await
            .map_err(|e| TabulaError::Transport(format!("failed to close MySQL connection: {}", e)))
    }
}
