//! Query Builder (QB) for MySQL statements.
//!
//! A [`Query`] accumulates clause lists (select, join, where, between, having,
//! group, order, set) and renders them as SELECT, INSERT, UPDATE or DELETE text
//! with `?` placeholders plus an ordered list of bound values.
//!
//! # Usage
//!
//! ```ignore
//! use myorm::qb;
//!
//! // SELECT
//! let rows = qb::table("users")
//!     .select(["id", "name as display_name"])
//!     .where_eq("status", "active")
//!     .where_in("role", ["admin", "editor"])
//!     .order_by_desc("created_at")
//!     .limit(20)
//!     .get(&client)
//!     .await?;
//!
//! // INSERT
//! qb::table("users")
//!     .set("name", "alice")
//!     .set_raw("created_at", "now()")
//!     .insert(&client)
//!     .await?;
//!
//! // UPDATE
//! qb::table("users")
//!     .set("status", "inactive")
//!     .where_eq("id", user_id)
//!     .update(&client)
//!     .await?;
//!
//! // DELETE
//! qb::table("users").where_eq("id", user_id).delete(&client).await?;
//! ```

mod args;
mod builder;
mod clause;
mod expr;
mod join;
mod render;

#[cfg(test)]
mod tests;

pub use args::{Arg, PredicateRequest};
pub use builder::Query;
pub use clause::{
    Assignment, BetweenItem, BetweenPredicate, Conjunction, Direction, JoinItem, JoinKind,
    JoinPredicate, JoinSpec, OnPredicate, Operand, OrderItem, OrderTerm, Predicate, Raw,
    SelectItem, SelectTerm, SetItem, StatementKind, StatementOptions, WhereItem, WhereValue,
};
pub use expr::compose;
pub use join::JoinClause;
pub use render::{Rendered, render};

/// Create a query against `table`.
///
/// # Example
/// ```ignore
/// let q = myorm::qb::table("users").where_eq("id", 1);
/// ```
pub fn table(table: impl Into<String>) -> Query {
    Query::new(table)
}

/// Wrap SQL text so it is inserted verbatim, never bound.
pub fn raw(sql: impl Into<String>) -> Raw {
    Raw::new(sql)
}
