//! Query monitoring for statement execution.
//!
//! [`InstrumentedClient`] wraps any [`GenericClient`](crate::GenericClient),
//! measures each statement, enforces an optional timeout and reports to a
//! [`QueryMonitor`].
//!
//! # Example
//!
//! ```rust,ignore
//! use myorm::monitor::{InstrumentedClient, LoggingMonitor, MonitorConfig};
//! use std::time::Duration;
//!
//! let config = MonitorConfig::new()
//!     .with_query_timeout(Duration::from_secs(30))
//!     .with_slow_query_threshold(Duration::from_millis(500))
//!     .enable_monitoring();
//!
//! let client = InstrumentedClient::new(mysql_client)
//!     .with_config(config)
//!     .with_monitor(LoggingMonitor::new().max_sql_length(120));
//!
//! let rows = myorm::qb::table("users").get(&client).await?;
//! ```

mod config;
mod instrumented;
mod monitors;
mod types;


pub use config::MonitorConfig;
pub use instrumented::InstrumentedClient;
pub use monitors::{CompositeMonitor, LoggingMonitor, NoopMonitor, QueryStats, StatsMonitor};
pub use types::{QueryContext, QueryMonitor, QueryResult, QueryType};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
