//! Fluent query builder.

use crate::client::{ConnectionOptions, ExecResult, GenericClient};
use crate::error::{OrmError, OrmResult};
use crate::qb::args::{Arg, PredicateRequest};
use crate::qb::clause::{
    Assignment, BetweenItem, BetweenPredicate, Conjunction, Direction, JoinItem, JoinKind,
    Operand, OrderItem, OrderTerm, Predicate, Raw, SelectItem, SetItem, StatementKind,
    StatementOptions, WhereItem, WhereValue,
};
use crate::qb::join::JoinClause;
use crate::qb::render::{Rendered, render};
use crate::row::{FromRow, Row};
use crate::value::Value;
use std::fmt;

/// Column alias used by [`Query::count`].
const COUNT_ALIAS: &str = "aggregate";

/// An immutable, cloneable description of one statement.
///
/// Every builder method consumes the query and returns the extended one, so a
/// base query can be cloned and specialised without aliasing. Terminal
/// operations borrow the query and never modify it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    opts: StatementOptions,
}

impl Query {
    /// Create a query against `table`.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            opts: StatementOptions::new(table),
        }
    }

    /// Accumulated clause lists.
    pub fn options(&self) -> &StatementOptions {
        &self.opts
    }

    // ==================== Table / SELECT ====================

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.opts.table = table.into();
        self
    }

    /// Replace the select list.
    pub fn select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectItem>,
    {
        self.opts.select = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Append to the select list.
    pub fn add_select<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectItem>,
    {
        self.opts.select.extend(columns.into_iter().map(Into::into));
        self
    }

    /// Append a raw select expression.
    pub fn select_raw(mut self, sql: impl Into<String>) -> Self {
        self.opts.select.push(SelectItem::Raw(Raw::new(sql)));
        self
    }

    pub fn distinct(mut self) -> Self {
        self.opts.distinct = true;
        self
    }

    // ==================== WHERE ====================

    /// Add predicates from a request, AND-joined.
    pub fn filter(mut self, request: PredicateRequest) -> Self {
        self.opts.where_.extend(request.into_items(Conjunction::And));
        self
    }

    /// Add predicates from a request, OR-joined.
    pub fn or_filter(mut self, request: PredicateRequest) -> Self {
        self.opts.where_.extend(request.into_items(Conjunction::Or));
        self
    }

    /// Dynamic `where(...)`: see [`PredicateRequest::from_args`].
    pub fn where_args(self, args: Vec<Arg>) -> OrmResult<Self> {
        Ok(self.filter(PredicateRequest::from_args("where", args)?))
    }

    /// Dynamic `orWhere(...)`.
    pub fn or_where_args(self, args: Vec<Arg>) -> OrmResult<Self> {
        Ok(self.or_filter(PredicateRequest::from_args("orWhere", args)?))
    }

    /// Add WHERE: column = value
    pub fn where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(PredicateRequest::eq(column, scalar(value)))
    }

    /// Add WHERE: column <op> value
    pub fn where_op(self, column: &str, operator: &str, value: impl Into<Value>) -> Self {
        self.filter(PredicateRequest::cmp(column, operator, scalar(value)))
    }

    /// Add WHERE: column <op> <raw sql>
    pub fn where_op_raw(self, column: &str, operator: &str, sql: impl Into<String>) -> Self {
        self.filter(PredicateRequest::cmp(column, operator, Raw::new(sql)))
    }

    /// Add WHERE: column IN (values...)
    pub fn where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filter(PredicateRequest::eq(column, collect_values(values)))
    }

    /// Add one equality per pair, in pair order.
    pub fn where_map<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.filter(PredicateRequest::map(pairs))
    }

    /// Add a raw WHERE fragment without params.
    pub fn where_raw(self, sql: impl Into<String>) -> Self {
        self.filter(PredicateRequest::raw(sql))
    }

    pub fn or_where_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.or_filter(PredicateRequest::eq(column, scalar(value)))
    }

    pub fn or_where_op(self, column: &str, operator: &str, value: impl Into<Value>) -> Self {
        self.or_filter(PredicateRequest::cmp(column, operator, scalar(value)))
    }

    pub fn or_where_in<I, V>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.or_filter(PredicateRequest::eq(column, collect_values(values)))
    }

    pub fn or_where_map<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.or_filter(PredicateRequest::map(pairs))
    }

    pub fn or_where_raw(self, sql: impl Into<String>) -> Self {
        self.or_filter(PredicateRequest::raw(sql))
    }

    /// Add WHERE: column IS NULL
    pub fn where_null(mut self, column: &str) -> Self {
        self.opts
            .where_
            .push(WhereItem::Predicate(Predicate::is_null(column)));
        self
    }

    /// Add WHERE: column IS NOT NULL
    pub fn where_not_null(mut self, column: &str) -> Self {
        self.opts
            .where_
            .push(WhereItem::Predicate(Predicate::is_not_null(column)));
        self
    }

    pub fn or_where_null(mut self, column: &str) -> Self {
        self.opts.where_.push(WhereItem::Predicate(
            Predicate::is_null(column).with_conjunction(Conjunction::Or),
        ));
        self
    }

    pub fn or_where_not_null(mut self, column: &str) -> Self {
        self.opts.where_.push(WhereItem::Predicate(
            Predicate::is_not_null(column).with_conjunction(Conjunction::Or),
        ));
        self
    }

    // ==================== BETWEEN ====================

    /// Append a prepared between predicate (bounds may be raw).
    pub fn between_predicate(mut self, between: BetweenPredicate) -> Self {
        self.opts.between.push(BetweenItem::Between(between));
        self
    }

    /// Add WHERE: column BETWEEN low AND high
    pub fn between(self, column: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.between_predicate(BetweenPredicate::new(column, scalar(low), scalar(high)))
    }

    pub fn or_between(self, column: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.between_predicate(
            BetweenPredicate::new(column, scalar(low), scalar(high))
                .with_conjunction(Conjunction::Or),
        )
    }

    /// Add WHERE: column NOT BETWEEN low AND high
    pub fn not_between(self, column: &str, low: impl Into<Value>, high: impl Into<Value>) -> Self {
        self.between_predicate(BetweenPredicate::new(column, scalar(low), scalar(high)).negate())
    }

    pub fn or_not_between(
        self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.between_predicate(
            BetweenPredicate::new(column, scalar(low), scalar(high))
                .negate()
                .with_conjunction(Conjunction::Or),
        )
    }

    /// Append a raw fragment to the between list.
    pub fn between_raw(mut self, sql: impl Into<String>) -> Self {
        self.opts
            .between
            .push(BetweenItem::Raw(Raw::new(sql), Conjunction::And));
        self
    }

    /// Add HAVING: column BETWEEN low AND high
    pub fn between_having(
        mut self,
        column: &str,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.opts.having_between.push(BetweenItem::Between(BetweenPredicate::new(
            column,
            scalar(low),
            scalar(high),
        )));
        self
    }

    // ==================== HAVING ====================

    /// Add HAVING predicates from a request, AND-joined.
    pub fn having(mut self, request: PredicateRequest) -> Self {
        self.opts.having.extend(request.into_items(Conjunction::And));
        self
    }

    /// Add HAVING predicates from a request, OR-joined.
    pub fn or_having(mut self, request: PredicateRequest) -> Self {
        self.opts.having.extend(request.into_items(Conjunction::Or));
        self
    }

    /// Dynamic `whereHaving(...)`.
    pub fn having_args(self, args: Vec<Arg>) -> OrmResult<Self> {
        Ok(self.having(PredicateRequest::from_args("whereHaving", args)?))
    }

    /// Add HAVING: column = value
    pub fn having_eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.having(PredicateRequest::eq(column, scalar(value)))
    }

    /// Add HAVING: column <op> value
    pub fn having_op(self, column: &str, operator: &str, value: impl Into<Value>) -> Self {
        self.having(PredicateRequest::cmp(column, operator, scalar(value)))
    }

    pub fn having_raw(self, sql: impl Into<String>) -> Self {
        self.having(PredicateRequest::raw(sql))
    }

    // ==================== Ordering & Grouping ====================

    pub fn order_by(mut self, column: &str, direction: Direction) -> Self {
        self.opts.order.push(OrderItem::Term(OrderTerm {
            column: column.to_string(),
            direction,
        }));
        self
    }

    /// Add ORDER BY column ASC.
    pub fn order_by_asc(self, column: &str) -> Self {
        self.order_by(column, Direction::Asc)
    }

    /// Add ORDER BY column DESC.
    pub fn order_by_desc(self, column: &str) -> Self {
        self.order_by(column, Direction::Desc)
    }

    /// Add ORDER BY rand().
    pub fn order_random(self) -> Self {
        self.order_by("", Direction::Random)
    }

    pub fn order_raw(mut self, sql: impl Into<String>) -> Self {
        self.opts.order.push(OrderItem::Raw(Raw::new(sql)));
        self
    }

    pub fn group_by(mut self, column: &str) -> Self {
        self.opts.group.push(OrderItem::Term(OrderTerm {
            column: column.to_string(),
            direction: Direction::Asc,
        }));
        self
    }

    pub fn group_raw(mut self, sql: impl Into<String>) -> Self {
        self.opts.group.push(OrderItem::Raw(Raw::new(sql)));
        self
    }

    // ==================== JOIN ====================

    fn push_join(mut self, clause: JoinClause) -> Self {
        self.opts.join.push(JoinItem::Join(clause.into_spec()));
        self
    }

    /// `inner join table on left = right`
    pub fn join(self, table: &str, left: &str, right: &str) -> Self {
        self.push_join(JoinClause::new(JoinKind::Inner, table).on(left, right))
    }

    /// `inner join table on left <op> right`
    pub fn join_op(self, table: &str, left: &str, operator: &str, right: &str) -> Self {
        self.push_join(JoinClause::new(JoinKind::Inner, table).on_op(left, operator, right))
    }

    /// Build an inner join's `on` clause in a callback.
    pub fn join_with<F>(self, table: &str, build: F) -> Self
    where
        F: FnOnce(JoinClause) -> JoinClause,
    {
        self.push_join(build(JoinClause::new(JoinKind::Inner, table)))
    }

    pub fn left_join(self, table: &str, left: &str, right: &str) -> Self {
        self.push_join(JoinClause::new(JoinKind::Left, table).on(left, right))
    }

    pub fn left_join_op(self, table: &str, left: &str, operator: &str, right: &str) -> Self {
        self.push_join(JoinClause::new(JoinKind::Left, table).on_op(left, operator, right))
    }

    pub fn left_join_with<F>(self, table: &str, build: F) -> Self
    where
        F: FnOnce(JoinClause) -> JoinClause,
    {
        self.push_join(build(JoinClause::new(JoinKind::Left, table)))
    }

    pub fn right_join(self, table: &str, left: &str, right: &str) -> Self {
        self.push_join(JoinClause::new(JoinKind::Right, table).on(left, right))
    }

    pub fn right_join_op(self, table: &str, left: &str, operator: &str, right: &str) -> Self {
        self.push_join(JoinClause::new(JoinKind::Right, table).on_op(left, operator, right))
    }

    pub fn right_join_with<F>(self, table: &str, build: F) -> Self
    where
        F: FnOnce(JoinClause) -> JoinClause,
    {
        self.push_join(build(JoinClause::new(JoinKind::Right, table)))
    }

    /// Append a verbatim join fragment.
    pub fn join_raw(mut self, sql: impl Into<String>) -> Self {
        self.opts.join.push(JoinItem::Raw(Raw::new(sql)));
        self
    }

    // ==================== SET ====================

    /// Add an assignment: column = ?
    pub fn set(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.opts.set.push(SetItem::Assign(Assignment {
            column: column.to_string(),
            value: Operand::Value(scalar(value)),
        }));
        self
    }

    /// Add an assignment with a raw right-hand side: column = <sql>
    pub fn set_raw(mut self, column: &str, sql: impl Into<String>) -> Self {
        self.opts.set.push(SetItem::Assign(Assignment {
            column: column.to_string(),
            value: Operand::Raw(Raw::new(sql)),
        }));
        self
    }

    /// Append a verbatim assignment fragment such as `hits = hits + 1`.
    pub fn set_fragment(mut self, sql: impl Into<String>) -> Self {
        self.opts.set.push(SetItem::Raw(Raw::new(sql)));
        self
    }

    // ==================== Pagination ====================

    /// Set LIMIT. Values `<= 0` remove the clause.
    pub fn limit(mut self, limit: i64) -> Self {
        self.opts.limit = limit;
        self
    }

    /// Set OFFSET (only rendered together with a positive limit).
    pub fn offset(mut self, offset: i64) -> Self {
        self.opts.offset = offset;
        self
    }

    /// Set LIMIT and OFFSET; a non-positive offset leaves the current one.
    pub fn limit_offset(mut self, limit: i64, offset: i64) -> Self {
        self.opts.limit = limit;
        if offset > 0 {
            self.opts.offset = offset;
        }
        self
    }

    // ==================== Rendering ====================

    /// Render as the given statement kind.
    pub fn render(&self, kind: StatementKind) -> Rendered {
        render(&self.opts, kind)
    }

    /// Get the SELECT SQL string (for debugging).
    pub fn to_sql(&self) -> String {
        self.render(StatementKind::Select).sql
    }

    fn count_statement(&self) -> Rendered {
        if self.opts.is_grouped() || self.opts.distinct {
            let mut inner = self.opts.clone();
            inner.order.clear();
            inner.limit = 0;
            inner.offset = 0;
            let inner = render(&inner, StatementKind::Select);
            return Rendered {
                sql: format!("select count(*) as {COUNT_ALIAS} from ({}) as t", inner.sql),
                bindings: inner.bindings,
            };
        }

        let mut opts = self.opts.clone();
        opts.select = vec![SelectItem::Raw(Raw::new(format!("count(*) as {COUNT_ALIAS}")))];
        opts.order.clear();
        opts.limit = 0;
        opts.offset = 0;
        render(&opts, StatementKind::Select)
    }

    fn check_mutation(&self, kind: StatementKind, options: ConnectionOptions) -> OrmResult<()> {
        if options.require_where_on_mutation && self.opts.has_no_filter() {
            tracing::warn!(
                target: "myorm.sql",
                statement = kind.as_str(),
                table = %self.opts.table,
                "rejected mutation without where clause"
            );
            return Err(OrmError::UnsafeMutation {
                statement: kind.as_str(),
                table: self.opts.table.clone(),
            });
        }
        Ok(())
    }

    // ==================== Execution ====================

    /// Execute the SELECT and return all rows.
    pub async fn get(&self, conn: &impl GenericClient) -> OrmResult<Vec<Row>> {
        let stmt = self.render(StatementKind::Select);
        log_statement(conn.options(), &stmt);
        conn.query(&stmt.sql, &stmt.bindings).await
    }

    /// Execute the SELECT and map all rows to `T`.
    pub async fn get_as<T: FromRow>(&self, conn: &impl GenericClient) -> OrmResult<Vec<T>> {
        let rows = self.get(conn).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Execute with `limit 1` and return the first row, if any.
    pub async fn first(&self, conn: &impl GenericClient) -> OrmResult<Option<Row>> {
        let rows = self.clone().limit(1).get(conn).await?;
        Ok(rows.into_iter().next())
    }

    pub async fn first_as<T: FromRow>(&self, conn: &impl GenericClient) -> OrmResult<Option<T>> {
        let row = self.first(conn).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Like [`Query::first`], failing with `OrmError::NotFound` on zero rows.
    pub async fn first_or_fail(&self, conn: &impl GenericClient) -> OrmResult<Row> {
        self.first(conn).await?.ok_or_else(|| {
            OrmError::not_found(format!("no rows in '{}' for the given query", self.opts.table))
        })
    }

    /// Project a single column of the first row.
    pub async fn value(&self, conn: &impl GenericClient, column: &str) -> OrmResult<Option<Value>> {
        let row = self.clone().select([column]).first(conn).await?;
        Ok(row.and_then(|row| pick_column(row, column)))
    }

    /// Project a single column of every row.
    pub async fn values(&self, conn: &impl GenericClient, column: &str) -> OrmResult<Vec<Value>> {
        let rows = self.clone().select([column]).get(conn).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| pick_column(row, column))
            .collect())
    }

    /// Count matching rows, ignoring order and limit.
    pub async fn count(&self, conn: &impl GenericClient) -> OrmResult<i64> {
        let stmt = self.count_statement();
        log_statement(conn.options(), &stmt);
        let rows = conn.query(&stmt.sql, &stmt.bindings).await?;
        match rows.first() {
            Some(row) => row.try_get::<i64>(COUNT_ALIAS),
            None => Ok(0),
        }
    }

    /// Whether at least one row matches.
    pub async fn exists(&self, conn: &impl GenericClient) -> OrmResult<bool> {
        Ok(self.first(conn).await?.is_some())
    }

    /// Walk the result in pages of `size` rows.
    ///
    /// Pages are fetched one after another with an increasing offset, starting
    /// at the query's own offset. Iteration stops after a page shorter than
    /// `size`; an empty page is never passed to `callback`. An error from the
    /// callback stops the walk and is returned.
    pub async fn chunk<F>(&self, conn: &impl GenericClient, size: i64, mut callback: F) -> OrmResult<()>
    where
        F: FnMut(Vec<Row>) -> OrmResult<()>,
    {
        if size <= 0 {
            return Err(OrmError::validation(format!(
                "chunk size must be positive, got {size}"
            )));
        }

        let mut offset = self.opts.offset.max(0);
        loop {
            let mut page = self.clone().limit(size);
            page.opts.offset = offset;
            let rows = page.get(conn).await?;
            let len = rows.len();
            if len == 0 {
                break;
            }
            callback(rows)?;
            if (len as i64) < size {
                break;
            }
            offset += size;
        }
        Ok(())
    }

    /// [`Query::chunk`] with each page mapped to `T`.
    pub async fn chunk_as<T, F>(&self, conn: &impl GenericClient, size: i64, mut callback: F) -> OrmResult<()>
    where
        T: FromRow,
        F: FnMut(Vec<T>) -> OrmResult<()>,
    {
        self.chunk(conn, size, |rows| {
            let mapped = rows.iter().map(T::from_row).collect::<OrmResult<Vec<T>>>()?;
            callback(mapped)
        })
        .await
    }

    /// Execute `insert into <table> set ...`.
    ///
    /// Returns `Ok(None)` without touching the connection when no assignment
    /// has been added.
    pub async fn insert(&self, conn: &impl GenericClient) -> OrmResult<Option<ExecResult>> {
        if self.opts.set.is_empty() {
            tracing::debug!(target: "myorm.sql", table = %self.opts.table, "insert skipped: nothing to set");
            return Ok(None);
        }
        let stmt = self.render(StatementKind::Insert);
        log_statement(conn.options(), &stmt);
        conn.execute(&stmt.sql, &stmt.bindings).await.map(Some)
    }

    /// Execute `update <table> set ... where ...`.
    pub async fn update(&self, conn: &impl GenericClient) -> OrmResult<ExecResult> {
        let options = conn.options();
        self.check_mutation(StatementKind::Update, options)?;
        if self.opts.set.is_empty() {
            return Err(OrmError::validation(format!(
                "update of '{}' has no assignments",
                self.opts.table
            )));
        }
        let stmt = self.render(StatementKind::Update);
        log_statement(options, &stmt);
        conn.execute(&stmt.sql, &stmt.bindings).await
    }

    /// Execute `delete from <table> where ...`.
    pub async fn delete(&self, conn: &impl GenericClient) -> OrmResult<ExecResult> {
        let options = conn.options();
        self.check_mutation(StatementKind::Delete, options)?;
        let stmt = self.render(StatementKind::Delete);
        log_statement(options, &stmt);
        conn.execute(&stmt.sql, &stmt.bindings).await
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

fn scalar(value: impl Into<Value>) -> Value {
    value.into()
}

fn collect_values<I, V>(values: I) -> WhereValue
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    WhereValue::List(values.into_iter().map(Into::into).collect())
}

// Drivers report `t.col` as `col`, so fall back to the only selected column.
fn pick_column(row: Row, column: &str) -> Option<Value> {
    if let Some(value) = row.get(column) {
        return Some(value.clone());
    }
    row.into_values().into_iter().next()
}

fn log_statement(options: ConnectionOptions, stmt: &Rendered) {
    if options.log_queries {
        tracing::debug!(
            target: "myorm.sql",
            sql = %stmt.sql,
            params = stmt.bindings.len(),
            "executing statement"
        );
    }
}
