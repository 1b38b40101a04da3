//! Error types for the fallible edges of the crate: configuration, CSV
//! loading and report export. The filter state machine and the aggregator
//! are total and never return these.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Goal must be a finite number greater than zero.
    #[error("invalid goal {0}: must be a positive, finite amount")]
    InvalidGoal(f64),

    #[error("cannot parse {var}={value:?} as a number")]
    UnparseableGoal { var: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown hierarchy level {0:?} (expected region, district or territory)")]
pub struct ParseLevelError(pub String);

/// Top-level error for the report binary.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error("no data loaded; load the CSV file first")]
    NoData,
}
