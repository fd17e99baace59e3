use crate::config::ConnectionConfig;
use std::time::Duration;

/// Timeout and slow-statement policy for an [`InstrumentedClient`](super::InstrumentedClient).
///
/// Reporting stays off until enabled, either explicitly or by configuring a
/// slow-statement threshold on the connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorConfig {
    /// `None` waits forever.
    pub query_timeout: Option<Duration>,
    pub slow_query_threshold: Option<Duration>,
    pub monitoring_enabled: bool,
}

impl MonitorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `query_timeout_ms` and `slow_query_ms` from a connection entry.
    pub fn from_connection(conn: &ConnectionConfig) -> Self {
        Self {
            query_timeout: conn.query_timeout_ms.map(Duration::from_millis),
            slow_query_threshold: conn.slow_query_ms.map(Duration::from_millis),
            monitoring_enabled: conn.slow_query_ms.is_some(),
        }
    }

    /// Statements exceeding this fail with `OrmError::Timeout`.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = Some(timeout);
        self
    }

    pub fn with_slow_query_threshold(mut self, threshold: Duration) -> Self {
        self.slow_query_threshold = Some(threshold);
        self
    }

    pub fn enable_monitoring(mut self) -> Self {
        self.monitoring_enabled = true;
        self
    }

    pub(super) fn is_slow(&self, elapsed: Duration) -> bool {
        self.slow_query_threshold
            .is_some_and(|threshold| elapsed > threshold)
    }
}
