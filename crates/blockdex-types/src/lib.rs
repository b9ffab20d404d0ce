//! Shared dictionary types for blockdex.
//!
//! A leaf crate: block definitions and the vocabulary around them (locales,
//! boards, categories, query context). It has **no internal blockdex
//! dependencies**; the kernel and the MCP server build on it.
//!
//! # Key Types
//!
//! |--------------------------|------------------------------------------------|
//! | Type                     | Purpose                                        |
//! |--------------------------|------------------------------------------------|
//! | [`BlockDefinition`]      | One block type: fields, inputs, boards, names  |
//! | [`BlockField`]           | Editable field with type, default, options     |
//! | [`BlockInput`]           | Socket: expected value type and what it holds  |
//! | [`BoardCompatibility`]   | `all` or a non-empty set of [`BoardId`]s       |
//! | [`Category`]             | Toolbox category, ordered by priority          |
//! | [`LocaleCode`]           | Closed locale set with default fallback        |
//! | [`QueryOptions`]         | Locale + board, validated at the boundary      |
//! | [`BlockContext`]         | Board + workspace digest for tailored output   |
//! | [`SearchResult`]         | Ranked, borrowed hit                           |
//! |--------------------------|------------------------------------------------|

pub mod block;
pub mod board;
pub mod catalog;
pub mod category;
pub mod context;
pub mod error;
pub mod locale;

pub use block::{
    BlockDefinition, BlockDefinitionBuilder, BlockField, BlockInput, BlockShape, FieldType,
    InputKind, ValueType,
};
pub use board::{BoardCompatibility, BoardFamily, BoardId, BoardInfo};
pub use catalog::{CategoryInfo, MatchedField, SearchResult};
pub use category::Category;
pub use context::{BlockContext, QueryOptions, WorkspaceSummary};
pub use error::TypeError;
pub use locale::LocaleCode;
