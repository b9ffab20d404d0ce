//! Construction errors for dictionary types.

use thiserror::Error;

/// A block definition (or one of its parts) violates an invariant.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("board compatibility must name at least one board")]
    EmptyBoardCompatibility,

    #[error("unknown board: {0}")]
    UnknownBoard(String),

    #[error("unknown locale: {0}")]
    UnknownLocale(String),

    #[error("malformed locale tag: '{0}'")]
    MalformedLocale(String),

    #[error("block '{0}' has no display name for the default locale")]
    MissingDefaultName(String),

    #[error("block type must not be empty")]
    EmptyBlockType,

    #[error("block '{block}' field '{field}': {reason}")]
    InvalidField {
        block: String,
        field: String,
        reason: String,
    },

    #[error("block '{block}' declares '{name}' more than once")]
    DuplicateMember { block: String, name: String },
}
