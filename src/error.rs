//! Error types for the sequence-number demo.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for demo operations
pub type Result<T> = std::result::Result<T, DemoError>;

/// Every failure the core can raise. All of them abort the current invocation.
#[derive(Debug, Error)]
pub enum DemoError {
    /// A trace entry is missing a required field or carries an unusable value
    #[error("malformed record #{index} in {source_name}: {reason}")]
    MalformedRecord {
        source_name: String,
        index: usize,
        reason: String,
    },

    /// Direction string is neither "C->S" nor "S->C"
    #[error("invalid direction '{value}' in record #{index} of {source_name}")]
    InvalidDirection {
        value: String,
        source_name: String,
        index: usize,
    },

    /// The trace document itself has the wrong shape
    #[error("invalid trace {source_name}: {reason}")]
    InvalidTrace { source_name: String, reason: String },

    #[error("missing required config key: {0}")]
    MissingConfigKey(String),

    #[error("profile '{0}' not found or not a mapping")]
    ProfileNotFound(String),

    #[error("invalid drop list ({context}): {reason}")]
    InvalidDropList { context: String, reason: String },

    #[error("invalid configuration {path}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("unknown mode '{0}'")]
    UnknownMode(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DemoError {
    pub fn malformed<S, R>(source_name: S, index: usize, reason: R) -> Self
    where
        S: Into<String>,
        R: Into<String>,
    {
        DemoError::MalformedRecord {
            source_name: source_name.into(),
            index,
            reason: reason.into(),
        }
    }

    pub fn invalid_drop_list<C: Into<String>, R: Into<String>>(context: C, reason: R) -> Self {
        DemoError::InvalidDropList {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DemoError::Io {
            path: path.into(),
            source,
        }
    }
}
