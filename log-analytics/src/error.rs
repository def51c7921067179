use std::path::PathBuf;

use thiserror::Error;

use crate::invariants::TimestampError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why a single input row could not become a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("expected 5 fields, found {0}")]
    FieldCount(usize),

    #[error("field `{0}` is empty")]
    EmptyField(&'static str),

    #[error("status `{0}` is not an integer code")]
    Status(String),

    #[error("bad timestamp: {0}")]
    Timestamp(#[from] TimestampError),

    #[error("row is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord {
        line: usize,
        #[source]
        reason: MalformedReason,
    },
}

impl IngestError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },
}

impl OptionsError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    #[error("status {status} is not a declared partition in strict mode")]
    UndeclaredPartition { status: i32 },

    #[error("strict mode requires at least one declared partition")]
    MissingStaticPartition,

    #[error("{found} partitions exceed the limit of {limit}")]
    TooManyPartitions { found: usize, limit: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Options(#[from] OptionsError),

    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error("failed to encode json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to export metrics: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}
