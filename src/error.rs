// SPDX-License-Identifier: MIT
use thiserror::Error;

/// Which side of the linkage a row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Input,
    Reference,
}

impl std::fmt::Display for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dataset::Input => f.write_str("input"),
            Dataset::Reference => f.write_str("reference"),
        }
    }
}

/// Preconditions checked before any matching work starts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("k must be at least 1, got {0}")]
    InvalidK(usize),

    #[error("worker count must be at least 1")]
    ZeroWorkers,

    #[error("{0} field name must not be empty")]
    EmptyFieldName(&'static str),

    #[error("key width must be at least 1")]
    ZeroKeyWidth,

    #[error("output column `{0}` would appear more than once")]
    DuplicateColumn(String),

    #[error("reference dataset is empty")]
    EmptyReference,

    #[error("{dataset} row {row} is missing required field `{field}`")]
    MissingField {
        dataset: Dataset,
        field: String,
        row: usize,
    },
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("malformed value in field `{field}`: {reason}")]
    MalformedField { field: String, reason: String },

    #[error("failed to start worker pool: {0}")]
    WorkerPool(String),
}

pub type Result<T> = std::result::Result<T, MatchError>;
