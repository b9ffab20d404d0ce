//! Tool adapters and the operation table.
//!
//! Every tool is one row of [`TOOL_TABLE`]: name, adapter group, description,
//! a JSON-schema generator for its parameters and a handler. [`dispatch`] is
//! the single entry point; the MCP server lists and calls tools from the
//! table and never reaches the engine another way.
//!
//! Handlers take raw JSON arguments and always produce a [`ToolResponse`]:
//! - parameters that fail to deserialize or validate → `invalid_arguments`
//! - engine `NotFound` / `UnavailableContext` → `no_match`
//! - success → `ok` with a JSON payload

mod block_query;
mod platform;
mod workspace;

use std::path::PathBuf;

use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::BlockdexConfig;
use crate::dictionary::SharedDictionary;
use crate::error::{EngineError, EngineResult};

pub use block_query::{
    GetBlockUsageParams, ListBlocksByCategoryParams, ListCategoriesParams, SearchBlocksParams,
};
pub use platform::{GetPlatformConfigParams, ListBoardsParams};
pub use workspace::{GetWorkspaceStateParams, UpdateWorkspaceParams, ValidateWorkspaceParams};

/// Outcome of one tool call.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolResponse {
    Ok { data: Value },
    NoMatch { message: String },
    InvalidArguments { message: String },
}

impl ToolResponse {
    pub fn is_ok(&self) -> bool {
        matches!(self, ToolResponse::Ok { .. })
    }

    /// Payload of a successful call.
    pub fn data(&self) -> Option<&Value> {
        match self {
            ToolResponse::Ok { data } => Some(data),
            _ => None,
        }
    }

    /// Human-readable text for the response.
    pub fn message(&self) -> Option<&str> {
        match self {
            ToolResponse::Ok { .. } => None,
            ToolResponse::NoMatch { message } | ToolResponse::InvalidArguments { message } => {
                Some(message)
            }
        }
    }
}

impl From<EngineError> for ToolResponse {
    fn from(e: EngineError) -> Self {
        if e.is_no_match() {
            ToolResponse::NoMatch {
                message: e.to_string(),
            }
        } else {
            ToolResponse::InvalidArguments {
                message: e.to_string(),
            }
        }
    }
}

/// Which adapter a tool belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Adapter {
    BlockQuery,
    Platform,
    Workspace,
}

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct ToolEnv {
    pub dictionary: SharedDictionary,
    pub config: BlockdexConfig,
}

impl ToolEnv {
    pub fn new(dictionary: SharedDictionary, config: BlockdexConfig) -> Self {
        Self { dictionary, config }
    }

    /// Workspace file for a request's optional project path.
    pub(crate) fn workspace_file(&self, project_path: Option<&str>) -> PathBuf {
        let root = self
            .config
            .resolve_project_root(project_path.map(std::path::Path::new));
        crate::workspace::workspace_path(&root, &self.config.workspace_file)
    }
}

/// One row of the operation table.
pub struct ToolSpec {
    pub name: &'static str,
    pub adapter: Adapter,
    pub description: &'static str,
    /// JSON schema of the parameters object.
    pub input_schema: fn() -> Value,
    pub handler: fn(&ToolEnv, Value) -> ToolResponse,
}

impl std::fmt::Debug for ToolSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSpec")
            .field("name", &self.name)
            .field("adapter", &self.adapter)
            .finish_non_exhaustive()
    }
}

fn schema_of<P: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(P))
        .unwrap_or_else(|_| serde_json::json!({ "type": "object" }))
}

/// Deserialize `args` into `P` and run `handler`.
fn invoke<P: DeserializeOwned>(
    env: &ToolEnv,
    args: Value,
    handler: fn(&ToolEnv, P) -> EngineResult<Value>,
) -> ToolResponse {
    // Clients may omit arguments entirely for parameterless tools.
    let args = if args.is_null() {
        Value::Object(Map::new())
    } else {
        args
    };
    let params: P = match serde_json::from_value(args) {
        Ok(p) => p,
        Err(e) => {
            return ToolResponse::InvalidArguments {
                message: format!("invalid parameters: {e}"),
            };
        }
    };
    match handler(env, params) {
        Ok(data) => ToolResponse::Ok { data },
        Err(e) => e.into(),
    }
}

/// Serialize a handler result.
pub(crate) fn to_data<T: Serialize>(value: &T) -> EngineResult<Value> {
    serde_json::to_value(value).map_err(|e| EngineError::InvalidArgument(e.to_string()))
}

macro_rules! tool {
    ($name:literal, $adapter:expr, $params:ty, $handler:path, $description:literal) => {
        ToolSpec {
            name: $name,
            adapter: $adapter,
            description: $description,
            input_schema: schema_of::<$params>,
            handler: |env, args| invoke::<$params>(env, args, $handler),
        }
    };
}

/// All tools, in listing order.
pub static TOOL_TABLE: &[ToolSpec] = &[
    tool!(
        "search_blocks",
        Adapter::BlockQuery,
        SearchBlocksParams,
        block_query::search_blocks,
        "Search the block dictionary by type id, display name, description or category. \
         Results are ranked; pass a board to drop blocks that cannot run on it. \
         An empty query lists every block."
    ),
    tool!(
        "get_block_usage",
        Adapter::BlockQuery,
        GetBlockUsageParams,
        block_query::get_block_usage,
        "Describe one block: fields, inputs, supported boards, a ready-to-insert \
         Blockly JSON template and advice on where it goes in the current workspace."
    ),
    tool!(
        "list_blocks_by_category",
        Adapter::BlockQuery,
        ListBlocksByCategoryParams,
        block_query::list_blocks_by_category,
        "List the blocks of one toolbox category in toolbox order."
    ),
    tool!(
        "list_categories",
        Adapter::BlockQuery,
        ListCategoriesParams,
        block_query::list_categories,
        "List toolbox categories in priority order with their block types."
    ),
    tool!(
        "get_platform_config",
        Adapter::Platform,
        GetPlatformConfigParams,
        platform::get_platform_config,
        "Show the active board (from the workspace file or configuration), its \
         hardware facts, and the supported boards and locales."
    ),
    tool!(
        "list_boards",
        Adapter::Platform,
        ListBoardsParams,
        platform::list_boards,
        "List supported boards with PlatformIO ids and how many blocks each can run."
    ),
    tool!(
        "get_workspace_state",
        Adapter::Workspace,
        GetWorkspaceStateParams,
        workspace::get_workspace_state,
        "Summarize the project's Blockly workspace file: board, block counts, \
         top-level blocks and variables."
    ),
    tool!(
        "validate_workspace",
        Adapter::Workspace,
        ValidateWorkspaceParams,
        workspace::validate_workspace,
        "Check the workspace for unknown blocks, blocks the board cannot run and a \
         missing or duplicated setup/loop block."
    ),
    tool!(
        "update_workspace",
        Adapter::Workspace,
        UpdateWorkspaceParams,
        workspace::update_workspace,
        "Replace the workspace with new Blockly JSON. The JSON is validated first; \
         the previous file is kept as main.json.bak."
    ),
];

/// Look up a tool by name.
pub fn find_tool(name: &str) -> Option<&'static ToolSpec> {
    TOOL_TABLE.iter().find(|t| t.name == name)
}

/// Run the named tool. An unknown name is `NotFound`.
pub fn dispatch(env: &ToolEnv, name: &str, args: Value) -> EngineResult<ToolResponse> {
    let spec = find_tool(name).ok_or_else(|| EngineError::NotFound {
        what: "tool",
        key: name.to_string(),
    })?;

    tracing::debug!(tool = name, adapter = %spec.adapter, "tool call");
    let response = (spec.handler)(env, args);
    if let Some(message) = response.message() {
        tracing::warn!(tool = name, %message, "tool call did not succeed");
    }
    Ok(response)
}

/// Parse an optional project path parameter.
pub(crate) fn project_path(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
