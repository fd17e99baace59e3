//! # myorm
//!
//! A fluent MySQL statement builder with a thin active-record layer.
//!
//! ## Features
//!
//! - **Fluent builder**: accumulate select/join/where/between/having/group/order/set
//!   clauses on a cloneable [`Query`] and render them as `?`-placeholder SQL
//! - **Bound values only**: user values never appear in SQL text, except through
//!   explicit [`qb::raw`] fragments
//! - **Safe defaults**: UPDATE and DELETE without a where clause are rejected
//!   unless the connection opts out
//! - **Named connections**: TOML configuration plus a [`ConnectionRegistry`]
//! - **Query monitoring**: timing, logging, stats and timeouts via [`InstrumentedClient`]
//!
//! ## Query Builder (qb)
//!
//! ```ignore
//! use myorm::qb;
//!
//! // SELECT
//! let users = qb::table("users")
//!     .where_eq("status", "active")
//!     .order_by_desc("created_at")
//!     .limit(10)
//!     .get(&client)
//!     .await?;
//!
//! // INSERT
//! qb::table("users")
//!     .set("username", "alice")
//!     .set("email", "alice@example.com")
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

pub mod client;
pub mod config;
pub mod error;
pub mod monitor;
pub mod qb;
pub mod record;
pub mod registry;
pub mod row;
pub mod value;

#[cfg(feature = "mysql")]
pub mod mysql;

pub use client::{ConnectionOptions, ExecResult, GenericClient};
pub use config::{ConnectionConfig, DatabaseConfig};
pub use error::{OrmError, OrmResult};
pub use monitor::{
    CompositeMonitor, InstrumentedClient, LoggingMonitor, MonitorConfig, NoopMonitor,
    QueryContext, QueryMonitor, QueryResult, QueryStats, QueryType, StatsMonitor,
};
pub use qb::{Direction, JoinClause, PredicateRequest, Query, Raw, Rendered, StatementKind};
pub use record::Record;
pub use registry::ConnectionRegistry;
pub use row::{FromRow, FromValue, Row};
pub use value::Value;

#[cfg(feature = "mysql")]
pub use mysql::{MySqlClient, connect_options, create_pool};
