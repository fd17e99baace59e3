//! MySQL client backed by a `sqlx` connection pool.

use crate::client::{ConnectionOptions, ExecResult, GenericClient};
use crate::config::ConnectionConfig;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, MySql, MySqlPool, Row as SqlxRow, TypeInfo, ValueRef};

type MySqlQuery<'q> = sqlx::query::Query<'q, MySql, MySqlArguments>;

/// Connect options for one configured connection.
///
/// Credentials are passed as fields, so they never go through URL parsing.
pub fn connect_options(config: &ConnectionConfig) -> MySqlConnectOptions {
    let options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .database(&config.database);
    if config.password.is_empty() {
        options
    } else {
        options.password(&config.password)
    }
}

/// Open a pool for one configured connection.
pub async fn create_pool(config: &ConnectionConfig) -> OrmResult<MySqlPool> {
    MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(connect_options(config))
        .await
        .map_err(|e| {
            OrmError::connection(format!(
                "failed to connect to {}:{}/{}: {e}",
                config.host, config.port, config.database
            ))
        })
}

/// A pooled MySQL connection plus its statement policy.
#[derive(Clone, Debug)]
pub struct MySqlClient {
    pool: MySqlPool,
    options: ConnectionOptions,
}

impl MySqlClient {
    pub fn new(pool: MySqlPool) -> Self {
        Self {
            pool,
            options: ConnectionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConnectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Connect using a configured connection and carry over its options.
    pub async fn connect(config: &ConnectionConfig) -> OrmResult<Self> {
        let pool = create_pool(config).await?;
        tracing::debug!(
            target: "myorm",
            host = %config.host,
            database = %config.database,
            max_connections = config.max_connections,
            "mysql pool ready"
        );
        Ok(Self::new(pool).with_options(config.options()))
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Close every connection in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    fn bind_value<'q>(query: MySqlQuery<'q>, value: &'q Value) -> MySqlQuery<'q> {
        match value {
            Value::Null => query.bind(None::<i32>),
            Value::Bool(b) => query.bind(b),
            Value::Int(i) => query.bind(i),
            Value::UInt(u) => query.bind(u),
            Value::Float(f) => query.bind(f),
            Value::Text(s) => query.bind(s.as_str()),
            Value::Bytes(b) => query.bind(b.as_slice()),
            Value::DateTime(dt) => query.bind(dt),
            Value::Date(d) => query.bind(d),
            Value::Json(j) => query.bind(sqlx::types::Json(j)),
        }
    }

    fn build<'q>(sql: &'q str, params: &'q [Value]) -> MySqlQuery<'q> {
        params
            .iter()
            .fold(sqlx::query(sql), |query, param| Self::bind_value(query, param))
    }

    fn convert_row(mysql_row: MySqlRow) -> OrmResult<Row> {
        let mut row = Row::new();
        for (index, column) in mysql_row.columns().iter().enumerate() {
            let name = column.name();
            let type_name = column.type_info().name();
            let value = decode_column(&mysql_row, index, column_decoder(type_name))
                .map_err(|e| OrmError::decode(name, format!("{type_name} column: {e}")))?;
            row.insert(name, value);
        }
        Ok(row)
    }
}

/// How a column is read back, chosen from the MySQL type name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ColumnDecoder {
    Null,
    Bool,
    Int,
    UInt,
    /// YEAR travels as a two byte integer no checked decoder accepts.
    Year,
    Float,
    /// Exact decimals are kept as text so no precision is lost.
    Decimal,
    Text,
    Bytes,
    DateTime,
    Timestamp,
    Date,
    Time,
    Json,
    /// Unknown type names: try the common decoders in turn.
    Fallback,
}

fn column_decoder(type_name: &str) -> ColumnDecoder {
    match type_name {
        "NULL" => ColumnDecoder::Null,
        "BOOLEAN" => ColumnDecoder::Bool,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => ColumnDecoder::Int,
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => ColumnDecoder::UInt,
        "YEAR" => ColumnDecoder::Year,
        "FLOAT" | "DOUBLE" => ColumnDecoder::Float,
        "DECIMAL" => ColumnDecoder::Decimal,
        "CHAR" | "VARCHAR" | "TINYTEXT" | "TEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET" => {
            ColumnDecoder::Text
        }
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "GEOMETRY" => {
            ColumnDecoder::Bytes
        }
        "DATETIME" => ColumnDecoder::DateTime,
        "TIMESTAMP" => ColumnDecoder::Timestamp,
        "DATE" => ColumnDecoder::Date,
        "TIME" => ColumnDecoder::Time,
        "JSON" => ColumnDecoder::Json,
        _ => ColumnDecoder::Fallback,
    }
}

fn decode_column(row: &MySqlRow, index: usize, decoder: ColumnDecoder) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(index)?.is_null() {
        return Ok(Value::Null);
    }
    Ok(match decoder {
        ColumnDecoder::Null => Value::Null,
        ColumnDecoder::Bool => Value::Bool(row.try_get(index)?),
        ColumnDecoder::Int => Value::Int(row.try_get(index)?),
        ColumnDecoder::UInt => Value::UInt(row.try_get(index)?),
        ColumnDecoder::Year => Value::Int(row.try_get_unchecked(index)?),
        ColumnDecoder::Float => match row.try_get::<f64, _>(index) {
            Ok(v) => Value::Float(v),
            Err(_) => Value::Float(f64::from(row.try_get::<f32, _>(index)?)),
        },
        ColumnDecoder::Decimal => Value::Text(row.try_get_unchecked(index)?),
        ColumnDecoder::Text => Value::Text(row.try_get(index)?),
        // Binary-collated text columns are reported as blobs.
        ColumnDecoder::Bytes => bytes_value(row.try_get(index)?),
        ColumnDecoder::DateTime => Value::DateTime(row.try_get(index)?),
        ColumnDecoder::Timestamp => {
            Value::DateTime(row.try_get::<chrono::DateTime<chrono::Utc>, _>(index)?.naive_utc())
        }
        ColumnDecoder::Date => Value::Date(row.try_get(index)?),
        ColumnDecoder::Time => Value::Text(row.try_get::<chrono::NaiveTime, _>(index)?.to_string()),
        ColumnDecoder::Json => {
            Value::Json(row.try_get::<sqlx::types::Json<serde_json::Value>, _>(index)?.0)
        }
        ColumnDecoder::Fallback => {
            if let Ok(v) = row.try_get::<i64, _>(index) {
                Value::Int(v)
            } else if let Ok(v) = row.try_get::<u64, _>(index) {
                Value::UInt(v)
            } else if let Ok(v) = row.try_get::<f64, _>(index) {
                Value::Float(v)
            } else if let Ok(v) = row.try_get::<String, _>(index) {
                Value::Text(v)
            } else {
                bytes_value(row.try_get_unchecked(index)?)
            }
        }
    })
}

fn bytes_value(bytes: Vec<u8>) -> Value {
    match String::from_utf8(bytes) {
        Ok(s) => Value::Text(s),
        Err(e) => Value::Bytes(e.into_bytes()),
    }
}

impl GenericClient for MySqlClient {
    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        let rows = Self::build(sql, params)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| OrmError::driver(sql, e.to_string()))?;
        rows.into_iter().map(Self::convert_row).collect()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<ExecResult> {
        let done = Self::build(sql, params)
            .execute(&self.pool)
            .await
            .map_err(|e| OrmError::driver(sql, e.to_string()))?;

        let result = ExecResult::new(done.rows_affected());
        Ok(match done.last_insert_id() {
            0 => result,
            id => result.with_last_insert_id(id),
        })
    }

    fn options(&self) -> ConnectionOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_columns_never_decode_as_bool() {
        for name in ["TINYINT", "SMALLINT", "MEDIUMINT", "INT", "BIGINT"] {
            assert_eq!(column_decoder(name), ColumnDecoder::Int, "{name}");
        }
        assert_eq!(column_decoder("BOOLEAN"), ColumnDecoder::Bool);
    }

    #[test]
    fn unsigned_columns_decode_as_u64() {
        for name in [
            "TINYINT UNSIGNED",
            "SMALLINT UNSIGNED",
            "MEDIUMINT UNSIGNED",
            "INT UNSIGNED",
            "BIGINT UNSIGNED",
        ] {
            assert_eq!(column_decoder(name), ColumnDecoder::UInt, "{name}");
        }
    }

    #[test]
    fn text_binary_and_temporal_columns() {
        assert_eq!(column_decoder("VARCHAR"), ColumnDecoder::Text);
        assert_eq!(column_decoder("ENUM"), ColumnDecoder::Text);
        assert_eq!(column_decoder("LONGTEXT"), ColumnDecoder::Text);
        assert_eq!(column_decoder("VARBINARY"), ColumnDecoder::Bytes);
        assert_eq!(column_decoder("BLOB"), ColumnDecoder::Bytes);
        assert_eq!(column_decoder("DECIMAL"), ColumnDecoder::Decimal);
        assert_eq!(column_decoder("DOUBLE"), ColumnDecoder::Float);
        assert_eq!(column_decoder("DATETIME"), ColumnDecoder::DateTime);
        assert_eq!(column_decoder("TIMESTAMP"), ColumnDecoder::Timestamp);
        assert_eq!(column_decoder("DATE"), ColumnDecoder::Date);
        assert_eq!(column_decoder("TIME"), ColumnDecoder::Time);
        assert_eq!(column_decoder("YEAR"), ColumnDecoder::Year);
        assert_eq!(column_decoder("JSON"), ColumnDecoder::Json);
        assert_eq!(column_decoder("NULL"), ColumnDecoder::Null);
        assert_eq!(column_decoder("BIT"), ColumnDecoder::Fallback);
        assert_eq!(column_decoder("VECTOR"), ColumnDecoder::Fallback);
    }

    #[test]
    fn non_utf8_blobs_stay_bytes() {
        assert_eq!(bytes_value(b"abc".to_vec()), Value::from("abc"));
        assert_eq!(bytes_value(vec![0xff, 0x00]), Value::Bytes(vec![0xff, 0x00]));
    }

    #[test]
    fn connect_options_take_credentials_verbatim() {
        let config = ConnectionConfig {
            host: "db".into(),
            port: 3307,
            user: "app".into(),
            password: "p@ss/w#rd".into(),
            database: "shop".into(),
            default: false,
            require_where_on_mutation: true,
            log_queries: false,
            max_connections: 5,
            query_timeout_ms: None,
            slow_query_ms: None,
        };
        let options = format!("{:?}", connect_options(&config));
        assert!(options.contains("\"db\""), "{options}");
        assert!(options.contains("3307"), "{options}");
    }
}
