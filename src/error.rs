//! Error types shared by the playback and transport layers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for simulator operations
pub type SimResult<T> = std::result::Result<T, SimError>;

/// Failures the simulator can run into
///
/// Every variant is contained at the smallest scope that produced it: a bad
/// configuration stops startup, a missing source skips one vehicle, a bad line
/// ends one stream and a failed send is only logged.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Source unavailable: {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("Transport failure: {0}")]
    TransportFailure(String),

    #[error("Dispatch queue closed")]
    QueueClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    pub fn config(msg: impl Into<String>) -> Self {
        SimError::InvalidConfiguration(msg.into())
    }

    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        SimError::MalformedRecord {
            line,
            reason: reason.into(),
        }
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        SimError::TransportFailure(msg.into())
    }
}

impl From<reqwest::Error> for SimError {
    fn from(err: reqwest::Error) -> Self {
        SimError::TransportFailure(err.to_string())
    }
}
