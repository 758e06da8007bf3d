//! Order KPI Library
//!
//! Computes verified business KPIs from two raw sources: a customer file and
//! an order file at line-item grain that repeats order-level fields on every
//! line.
//!
//! This library provides tools for:
//! - Normalizing raw rows into typed records (contacts, amounts, timestamps)
//! - Validating records with one recorded reason per rejection
//! - Deriving one header per order and excluding orders whose lines disagree
//! - Computing KPIs with a polars engine and a SQLite engine from one contract
//! - Failing a run when the two engines differ on any metric
//! - Recording snapshots and data-quality logs in append-only history files
//!
//! Record-level problems are never errors: they become `ValidationIssue`s in
//! the quality log. [`Error`] covers the failures that stop a run from
//! producing a snapshot, plus the I/O and parsing failures of the adapters.

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod deduplicator;
        pub mod kpi_engine;
        pub mod pipeline;
        pub mod record_normalizer;
        pub mod validator;
    }
    pub mod adapters {
        pub mod csv_source;
        pub mod run_history;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::quality_log::DataQualityLog;
pub use app::models::snapshot::{KpiSnapshot, Metric, MetricValue};
pub use app::models::{Customer, OrderHeader, OrderLineItem, RawCustomerRow, RawOrderRow};
pub use app::services::pipeline::{PipelineRunner, RunReport};
pub use config::PipelineConfig;

/// Result type alias for the KPI pipeline
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for pipeline, engine and adapter operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing error
    #[error("CSV parsing error in file '{file}': {message}")]
    CsvParsing {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// Tabular engine failure
    #[error("Tabular engine error: {message}")]
    Polars {
        message: String,
        #[source]
        source: polars::error::PolarsError,
    },

    /// Relational engine failure
    #[error("Relational engine error: {message}")]
    Sqlite {
        message: String,
        #[source]
        source: rusqlite::Error,
    },

    /// JSON or TOML (de)serialization failure
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A required field is absent from every record of a source
    #[error("Required field '{field}' is missing from every {source_name} record")]
    MissingColumn { source_name: String, field: String },

    /// Snapshot builder was finished before every metric was set
    #[error("KPI snapshot is incomplete: missing {missing:?}")]
    IncompleteSnapshot { missing: Vec<String> },

    /// The two aggregation engines disagreed
    #[error("Consistency violation between '{left}' and '{right}': {divergences} diverging metric(s)")]
    ConsistencyViolation {
        left: String,
        right: String,
        divergences: usize,
    },

    /// Data validation error
    #[error("Data validation error: {message}")]
    DataValidation { message: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a CSV parsing error with context
    pub fn csv_parsing(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::CsvParsing {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a tabular engine error with context
    pub fn polars(message: impl Into<String>, source: polars::error::PolarsError) -> Self {
        Self::Polars {
            message: message.into(),
            source,
        }
    }

    /// Create a relational engine error with context
    pub fn sqlite(message: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Sqlite {
            message: message.into(),
            source,
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a fatal missing-column error
    pub fn missing_column(source_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingColumn {
            source_name: source_name.into(),
            field: field.into(),
        }
    }

    pub fn incomplete_snapshot(missing: Vec<String>) -> Self {
        Self::IncompleteSnapshot { missing }
    }

    pub fn consistency_violation(
        left: impl Into<String>,
        right: impl Into<String>,
        divergences: usize,
    ) -> Self {
        Self::ConsistencyViolation {
            left: left.into(),
            right: right.into(),
            divergences,
        }
    }

    /// Create a data validation error
    pub fn data_validation(message: impl Into<String>) -> Self {
        Self::DataValidation {
            message: message.into(),
        }
    }

    /// Whether the error stops a run before any snapshot can exist
    pub fn is_fatal_schema_error(&self) -> bool {
        matches!(self, Self::MissingColumn { .. })
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::CsvParsing {
            file: "unknown".to_string(),
            message: "CSV parsing failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<polars::error::PolarsError> for Error {
    fn from(error: polars::error::PolarsError) -> Self {
        Self::Polars {
            message: "DataFrame operation failed".to_string(),
            source: error,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Self {
        Self::Sqlite {
            message: "SQLite operation failed".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization {
            message: error.to_string(),
        }
    }
}

impl From<regex::Error> for Error {
    fn from(error: regex::Error) -> Self {
        Self::Configuration {
            message: format!("Invalid pattern: {}", error),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Self::Configuration {
            message: format!("Invalid TOML: {}", error),
        }
    }
}

impl From<toml::ser::Error> for Error {
    fn from(error: toml::ser::Error) -> Self {
        Self::Serialization {
            message: error.to_string(),
        }
    }
}
