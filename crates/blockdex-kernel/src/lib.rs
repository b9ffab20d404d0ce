//! # blockdex-kernel
//!
//! The block dictionary and everything that queries it.
//!
//! - [`dictionary`]: immutable catalog, built once and shared as [`SharedDictionary`]
//! - [`search`]: tiered free-text ranking
//! - [`usage`]: usage descriptions, Blockly JSON templates, insertion guides
//! - [`workspace`]: reading, validating and atomically replacing `blockly/main.json`
//! - [`tools`]: the static operation table the MCP server is driven by
//!
//! Engine calls are synchronous and lock-free; the dictionary is never
//! mutated after construction.

pub mod config;
pub mod dictionary;
pub mod error;
pub mod search;
pub mod tools;
pub mod usage;
pub mod workspace;

pub use config::{BlockdexConfig, ConfigError};
pub use dictionary::{BlockDictionary, SharedDictionary, parse_catalog};
pub use error::{DictionaryError, EngineError, EngineResult};
pub use tools::{Adapter, TOOL_TABLE, ToolEnv, ToolResponse, ToolSpec, dispatch, find_tool};
pub use usage::{
    BlockUsage, InputUsage, UsageDescription, UsageSummary, format_block_usage,
    format_category_blocks, generate_block_json_template, generate_insertion_guide,
};
pub use workspace::{IssueKind, Severity, WorkspaceDocument, WorkspaceError, WorkspaceIssue};
