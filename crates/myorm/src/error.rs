//! Error types for myorm

use thiserror::Error;

/// Result type alias for myorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for statement building and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// A dynamic argument list did not match any supported shape
    #[error("Invalid number of \"{method}\" arguments: {got}")]
    InvalidArgumentCount { method: &'static str, got: usize },

    /// UPDATE/DELETE without any WHERE predicate while the connection requires one
    #[error("Unsafe {statement} rejected: no where clause for table '{table}'")]
    UnsafeMutation {
        statement: &'static str,
        table: String,
    },

    /// Failure reported by the database driver
    #[error("Driver error: {message} (sql: {sql})")]
    Driver { sql: String, message: String },

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record layer used on a table without a primary key
    #[error("Missing primary key configuration for table '{0}'")]
    MissingPrimaryKey(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Configuration file could not be read or parsed
    #[error("Config error: {0}")]
    Config(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a driver error carrying the statement that failed
    pub fn driver(sql: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Driver {
            sql: sql.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is an unsafe mutation rejection
    pub fn is_unsafe_mutation(&self) -> bool {
        matches!(self, Self::UnsafeMutation { .. })
    }

    /// Check if this error came from the driver
    pub fn is_driver(&self) -> bool {
        matches!(self, Self::Driver { .. })
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
