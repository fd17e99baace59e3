//! Generic client trait for unified database access.

use crate::error::OrmResult;
use crate::row::Row;
use crate::value::Value;

/// Per-connection policy consulted by the query builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectionOptions {
    /// Reject UPDATE/DELETE statements that carry no where or between predicate.
    pub require_where_on_mutation: bool,
    /// Emit rendered SQL through `tracing` before execution.
    pub log_queries: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            require_where_on_mutation: true,
            log_queries: false,
        }
    }
}

impl ConnectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_require_where_on_mutation(mut self, enabled: bool) -> Self {
        self.require_where_on_mutation = enabled;
        self
    }

    pub fn with_log_queries(mut self, enabled: bool) -> Self {
        self.log_queries = enabled;
        self
    }
}

/// Outcome of a statement that does not return rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExecResult {
    /// Rows matched/changed by the statement.
    pub rows_affected: u64,
    /// `LAST_INSERT_ID()` for inserts into tables with an auto-increment key.
    pub last_insert_id: Option<u64>,
}

impl ExecResult {
    pub fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected,
            last_insert_id: None,
        }
    }

    pub fn with_last_insert_id(mut self, id: u64) -> Self {
        self.last_insert_id = Some(id);
        self
    }
}

/// The execution collaborator used by every terminal query operation.
///
/// Implemented by the sqlx-backed [`MySqlClient`](crate::mysql::MySqlClient),
/// by [`InstrumentedClient`](crate::monitor::InstrumentedClient), and by test doubles.
/// Bound values are passed in placeholder order.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Execute a statement and report affected rows and the generated id.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<ExecResult>> + Send;

    /// Execute a query and return the first row, if any.
    fn query_opt(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Option<Row>>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            Ok(rows.into_iter().next())
        }
    }

    /// Policy for this connection.
    fn options(&self) -> ConnectionOptions {
        ConnectionOptions::default()
    }
}

impl<C: GenericClient> GenericClient for &C {
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<Row>>> + Send {
        (**self).query(sql, params)
    }

    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<ExecResult>> + Send {
        (**self).execute(sql, params)
    }

    fn options(&self) -> ConnectionOptions {
        (**self).options()
    }
}
