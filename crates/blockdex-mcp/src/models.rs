//! Prompt argument types.

use rmcp::schemars;
use serde::{Deserialize, Serialize};

/// Arguments for the block explanation prompt
#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
#[schemars(description = "Block explanation parameters")]
pub struct ExplainBlockArgs {
    #[schemars(description = "Block type id, e.g. servo_move")]
    pub block_type: String,
    #[schemars(description = "Locale for names and descriptions (default: server locale)")]
    pub locale: Option<String>,
}
