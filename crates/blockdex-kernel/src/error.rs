//! Error types for the dictionary and query engine.
//!
//! Engine errors are plain values: adapters turn them into tagged tool
//! responses, so nothing here ever needs to cross the boundary as a panic.

use std::path::PathBuf;

use blockdex_types::TypeError;
use thiserror::Error;

/// Errors returned by lookup, search and formatting operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Nothing matches the requested key.
    #[error("{what} not found: {key}")]
    NotFound {
        /// Kind of thing looked up ("block", "category", ...).
        what: &'static str,
        /// The key that was requested.
        key: String,
    },

    /// A caller-supplied argument is malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Context needed for the request (e.g. a workspace file) is missing.
    #[error("context unavailable: {0}")]
    UnavailableContext(String),
}

impl EngineError {
    pub fn block_not_found(block_type: impl Into<String>) -> Self {
        Self::NotFound {
            what: "block",
            key: block_type.into(),
        }
    }

    pub fn category_not_found(category: impl Into<String>) -> Self {
        Self::NotFound {
            what: "category",
            key: category.into(),
        }
    }

    /// Whether the error means "nothing matched" rather than "bad request".
    pub fn is_no_match(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::UnavailableContext(_))
    }
}

impl From<TypeError> for EngineError {
    fn from(e: TypeError) -> Self {
        Self::InvalidArgument(e.to_string())
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Errors building a [`BlockDictionary`](crate::BlockDictionary).
#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("duplicate block type: {0}")]
    DuplicateType(String),

    #[error("invalid catalog {source_name}: {error}")]
    Parse {
        source_name: String,
        #[source]
        error: serde_json::Error,
    },

    #[error("failed to read catalog {path}: {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}
