//! MCP server exposing the blockdex block dictionary.
//!
//! Lets coding agents look up Blockly blocks, see which boards run them and
//! edit a project's `blockly/main.json` without guessing at block JSON.
//!
//! ## Surface
//!
//! - **Tools**: every row of [`TOOL_TABLE`], listed and called by name
//! - **Resources**: `blockdex://categories`, `blockdex://categories/{category}`,
//!   `blockdex://blocks/{type}`, `blockdex://boards`
//! - **Prompts**: `explain_block`
//! - **Completions**: block types, categories, boards and locales

mod models;

use std::sync::{Arc, Mutex};

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler,
    handler::server::{router::prompt::PromptRouter, wrapper::Parameters},
    model::{
        // Tool types
        CallToolRequestParams, CallToolResult, Content, JsonObject, ListToolsResult, Tool,
        // Prompt types
        GetPromptRequestParams, GetPromptResult, ListPromptsResult,
        PaginatedRequestParams, PromptMessage, PromptMessageRole,
        // Resource types
        AnnotateAble, RawResource, ReadResourceRequestParams, ReadResourceResult, ResourceContents,
        ListResourcesResult, Resource,
        // Completion types
        CompleteRequestParams, CompleteResult, CompletionInfo,
        // Logging types
        SetLevelRequestParams, LoggingLevel,
        // Cancellation types
        CancelledNotificationParam,
        // Server types
        ServerCapabilities, ServerInfo,
    },
    prompt, prompt_handler, prompt_router,
    service::{NotificationContext, RequestContext},
};
use serde_json::{Value, json};

use blockdex_kernel::{
    EngineError, TOOL_TABLE, ToolEnv, ToolResponse, UsageDescription, dispatch,
    format_block_usage,
};
use blockdex_types::{BlockContext, BoardId, Category, LocaleCode, QueryOptions};

pub use models::*;

const CATEGORIES_URI: &str = "blockdex://categories";
const BOARDS_URI: &str = "blockdex://boards";
const CATEGORY_PREFIX: &str = "blockdex://categories/";
const BLOCK_PREFIX: &str = "blockdex://blocks/";

/// Most completion values returned for one request.
const MAX_COMPLETIONS: usize = 20;

/// MCP server over one shared dictionary and configuration.
#[derive(Clone)]
pub struct BlockdexMcp {
    env: ToolEnv,
    prompt_router: PromptRouter<Self>,
    log_level: Arc<Mutex<LoggingLevel>>,
}

impl std::fmt::Debug for BlockdexMcp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockdexMcp")
            .field("blocks", &self.env.dictionary.len())
            .field("config", &self.env.config)
            .finish()
    }
}

impl BlockdexMcp {
    pub fn new(env: ToolEnv) -> Self {
        Self {
            env,
            prompt_router: Self::prompt_router(),
            log_level: Arc::new(Mutex::new(LoggingLevel::Info)),
        }
    }

    pub fn env(&self) -> &ToolEnv {
        &self.env
    }

    /// Tool descriptors built from the operation table.
    pub fn tools(&self) -> Vec<Tool> {
        TOOL_TABLE
            .iter()
            .map(|spec| {
                let schema = match (spec.input_schema)() {
                    Value::Object(map) => map,
                    _ => JsonObject::new(),
                };
                Tool::new(spec.name, spec.description, Arc::new(schema))
            })
            .collect()
    }

    /// Run a tool by name. Only an unknown tool is a protocol error.
    pub fn respond(&self, name: &str, arguments: Option<JsonObject>) -> Result<ToolResponse, McpError> {
        let args = Value::Object(arguments.unwrap_or_default());
        dispatch(&self.env, name, args).map_err(|e| match e {
            EngineError::NotFound { key, .. } => {
                McpError::invalid_params(format!("Unknown tool: {key}"), None)
            }
            other => McpError::invalid_params(other.to_string(), None),
        })
    }

    /// Every concrete resource: the two indexes, each category and each block.
    pub fn resources(&self) -> Vec<Resource> {
        let locale = self.env.config.default_locale;
        let mut resources = vec![
            RawResource {
                uri: CATEGORIES_URI.to_string(),
                name: "categories".to_string(),
                title: Some("Block Categories".to_string()),
                description: Some("Toolbox categories in display order with their block types".to_string()),
                mime_type: Some("application/json".to_string()),
                size: None,
                icons: None,
                meta: None,
            }
            .no_annotation(),
            RawResource {
                uri: BOARDS_URI.to_string(),
                name: "boards".to_string(),
                title: Some("Supported Boards".to_string()),
                description: Some("Boards, their PlatformIO ids and how many blocks run on each".to_string()),
                mime_type: Some("application/json".to_string()),
                size: None,
                icons: None,
                meta: None,
            }
            .no_annotation(),
        ];

        for info in self.env.dictionary.all_categories() {
            resources.push(
                RawResource {
                    uri: format!("{CATEGORY_PREFIX}{}", info.category),
                    name: info.category.to_string(),
                    title: Some(info.category.display_name(locale).to_string()),
                    description: Some(format!("{} blocks", info.len())),
                    mime_type: Some("application/json".to_string()),
                    size: None,
                    icons: None,
                    meta: None,
                }
                .no_annotation(),
            );
        }

        for def in self.env.dictionary.iter_by_category() {
            resources.push(
                RawResource {
                    uri: format!("{BLOCK_PREFIX}{}", def.block_type()),
                    name: def.block_type().to_string(),
                    title: Some(def.display_name(locale).to_string()),
                    description: def.description(locale).map(str::to_string),
                    mime_type: Some("application/json".to_string()),
                    size: None,
                    icons: None,
                    meta: None,
                }
                .no_annotation(),
            );
        }
        resources
    }

    /// JSON text behind a resource URI.
    pub fn resource_text(&self, uri: &str) -> Result<String, McpError> {
        let (tool, args) = if uri == CATEGORIES_URI {
            ("list_categories", json!({}))
        } else if uri == BOARDS_URI {
            ("list_boards", json!({}))
        } else if let Some(category) = uri.strip_prefix(CATEGORY_PREFIX) {
            ("list_blocks_by_category", json!({ "category": category }))
        } else if let Some(block_type) = uri.strip_prefix(BLOCK_PREFIX) {
            ("get_block_usage", json!({ "block_type": block_type }))
        } else {
            return Err(McpError::invalid_params(format!("Unknown resource URI: {uri}"), None));
        };

        let arguments = match args {
            Value::Object(map) => Some(map),
            _ => None,
        };
        match self.respond(tool, arguments)? {
            ToolResponse::Ok { data } => serde_json::to_string_pretty(&data)
                .map_err(|e| McpError::internal_error(e.to_string(), None)),
            other => Err(McpError::invalid_params(
                other.message().unwrap_or("resource unavailable").to_string(),
                None,
            )),
        }
    }

    /// Completion candidates for a named argument.
    pub fn complete_argument(&self, argument: &str, prefix: &str) -> Vec<String> {
        let prefix = prefix.trim().to_lowercase();
        let candidates: Vec<String> = match argument {
            "block_type" | "type" => self
                .env
                .dictionary
                .iter_by_category()
                .map(|d| d.block_type().to_string())
                .collect(),
            "category" => Category::all().map(|c| c.to_string()).collect(),
            "board" => BoardId::all().map(|b| b.to_string()).collect(),
            "locale" => LocaleCode::all().map(|l| l.to_string()).collect(),
            _ => Vec::new(),
        };
        candidates
            .into_iter()
            .filter(|c| c.to_lowercase().contains(&prefix))
            .take(MAX_COMPLETIONS)
            .collect()
    }

    /// Record the client-requested log level.
    pub fn apply_log_level(&self, level: LoggingLevel) -> Result<(), McpError> {
        let mut current = self
            .log_level
            .lock()
            .map_err(|_| McpError::internal_error("Lock error", None))?;
        *current = level;
        tracing::info!("Log level set to {:?}", level);
        Ok(())
    }

    pub fn log_level(&self) -> LoggingLevel {
        self.log_level
            .lock()
            .map(|level| *level)
            .unwrap_or(LoggingLevel::Info)
    }
}

/// Wrap a tool response for the wire. Non-ok responses are tool errors, not
/// protocol errors, so the agent can read the message and retry.
pub fn tool_result(response: &ToolResponse) -> CallToolResult {
    let text = match response {
        ToolResponse::Ok { data } => {
            serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string())
        }
        other => serde_json::to_string_pretty(other)
            .unwrap_or_else(|_| other.message().unwrap_or_default().to_string()),
    };
    if response.is_ok() {
        CallToolResult::success(vec![Content::text(text)])
    } else {
        CallToolResult::error(vec![Content::text(text)])
    }
}

// ============================================================================
// Prompt Router
// ============================================================================

#[prompt_router]
impl BlockdexMcp {
    /// Explain one block: what it does, how to fill it in and where it goes.
    #[prompt(
        name = "explain_block",
        description = "Explain a block's purpose, fields, inputs and board support, with a Blockly JSON example"
    )]
    fn explain_block(
        &self,
        Parameters(args): Parameters<ExplainBlockArgs>,
    ) -> Result<GetPromptResult, McpError> {
        let opts = QueryOptions::from_raw(args.locale.as_deref(), None, self.env.config.query_defaults())
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        let def = self
            .env
            .dictionary
            .get_block_by_type(args.block_type.trim())
            .ok_or_else(|| McpError::invalid_params(
                format!("Block '{}' not found", args.block_type),
                None,
            ))?;

        let context = opts.board.map(BlockContext::for_board);
        let usage = match format_block_usage(Some(def), opts.locale, context.as_ref()) {
            UsageDescription::Available(usage) => usage,
            UsageDescription::Unavailable { reason } => {
                return Err(McpError::invalid_params(reason, None));
            }
        };

        let mut content = String::new();
        content.push_str(&format!("# {} (`{}`)\n\n", usage.name, usage.block_type));
        if let Some(ref description) = usage.description {
            content.push_str(description);
            content.push_str("\n\n");
        }
        content.push_str(&format!("**Category:** {}\n", usage.category_name));
        content.push_str(&format!("**Shape:** {}\n", usage.shape));
        if let Some(output) = usage.output {
            content.push_str(&format!("**Output:** {}\n", output.as_str()));
        }
        content.push_str(&format!("**Boards:** {}\n\n", usage.boards.label()));

        if !usage.fields.is_empty() {
            content.push_str("## Fields\n\n");
            for field in &usage.fields {
                content.push_str(&format!(
                    "- `{}` ({}), default `{}`",
                    field.name,
                    field.field_type.as_str(),
                    field.default
                ));
                if !field.options.is_empty() {
                    content.push_str(&format!(", one of: {}", field.options.join(", ")));
                }
                content.push('\n');
            }
            content.push('\n');
        }

        if !usage.inputs.is_empty() {
            content.push_str("## Inputs\n\n");
            for input in &usage.inputs {
                content.push_str(&format!(
                    "- `{}`: {} {}{}\n",
                    input.name,
                    input.check.as_str(),
                    input.kind.as_str(),
                    if input.required { " (required)" } else { "" }
                ));
            }
            content.push('\n');
        }

        let example = serde_json::to_string_pretty(&usage.example)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        content.push_str("## Blockly JSON\n\n```json\n");
        content.push_str(&example);
        content.push_str("\n```\n\n");

        content.push_str("## Placement\n\n");
        content.push_str(&usage.insertion_guide);
        content.push('\n');
        if let Some(ref note) = usage.board_note {
            content.push_str(&format!("\n{note}\n"));
        }

        content.push_str(
            "\nExplain this block to the user in plain language, then show how to \
             insert it into their workspace using the JSON above.",
        );

        Ok(GetPromptResult::new(vec![PromptMessage::new(
            PromptMessageRole::User,
            rmcp::model::PromptMessageContent::Text { text: content },
        )])
        .with_description(format!("Explanation of block '{}'", usage.block_type)))
    }
}

#[prompt_handler]
impl ServerHandler for BlockdexMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(
            ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .enable_resources()
                .enable_logging()
                .enable_completions()
                .build(),
        )
        .with_instructions(
            "Blockly block dictionary for Arduino and ESP32 projects. Search blocks, read their usage \
             and JSON templates, check board support, and read or update blockly/main.json.",
        )
    }

    // ========================================================================
    // Tools
    // ========================================================================

    fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListToolsResult, McpError>> + Send + '_ {
        async move {
            Ok(ListToolsResult {
                meta: None,
                next_cursor: None,
                tools: self.tools(),
            })
        }
    }

    fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CallToolResult, McpError>> + Send + '_ {
        async move {
            let response = self.respond(&request.name, request.arguments)?;
            Ok(tool_result(&response))
        }
    }

    // ========================================================================
    // Resources
    // ========================================================================

    fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ListResourcesResult, McpError>> + Send + '_ {
        async move {
            Ok(ListResourcesResult {
                meta: None,
                next_cursor: None,
                resources: self.resources(),
            })
        }
    }

    fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<ReadResourceResult, McpError>> + Send + '_ {
        async move {
            let uri = &request.uri;
            let content = self.resource_text(uri)?;
            Ok(ReadResourceResult::new(vec![ResourceContents::text(
                content,
                uri.clone(),
            )]))
        }
    }

    // ========================================================================
    // Completion
    // ========================================================================

    fn complete(
        &self,
        request: CompleteRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<CompleteResult, McpError>> + Send + '_ {
        async move {
            let values = match &request.r#ref {
                rmcp::model::Reference::Prompt(prompt_ref) => match prompt_ref.name.as_str() {
                    "explain_block" => {
                        self.complete_argument(&request.argument.name, &request.argument.value)
                    }
                    _ => Vec::new(),
                },
                rmcp::model::Reference::Resource(resource_ref) => {
                    let uri = &resource_ref.uri;
                    if uri.starts_with(BLOCK_PREFIX) {
                        self.complete_argument("block_type", &request.argument.value)
                    } else if uri.starts_with(CATEGORY_PREFIX) {
                        self.complete_argument("category", &request.argument.value)
                    } else {
                        Vec::new()
                    }
                }
            };

            Ok(CompleteResult::new(CompletionInfo {
                values,
                total: None,
                has_more: Some(false),
            }))
        }
    }

    // ========================================================================
    // Logging
    // ========================================================================

    fn set_level(
        &self,
        request: SetLevelRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> impl std::future::Future<Output = Result<(), McpError>> + Send + '_ {
        async move { self.apply_log_level(request.level) }
    }

    // ========================================================================
    // Cancellation
    // ========================================================================

    /// Every call finishes synchronously, so there is nothing to abort.
    fn on_cancelled(
        &self,
        notification: CancelledNotificationParam,
        _context: NotificationContext<RoleServer>,
    ) -> impl std::future::Future<Output = ()> + Send + '_ {
        async move {
            tracing::info!(
                request_id = ?notification.request_id,
                reason = ?notification.reason,
                "Request cancelled"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockdex_kernel::{BlockDictionary, BlockdexConfig};

    fn mcp() -> BlockdexMcp {
        let dictionary = BlockDictionary::builtin().unwrap().into_shared();
        BlockdexMcp::new(ToolEnv::new(dictionary, BlockdexConfig::default()))
    }

    fn args(value: Value) -> Option<JsonObject> {
        match value {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    fn prompt_text(result: &GetPromptResult) -> &str {
        match &result.messages[0].content {
            rmcp::model::PromptMessageContent::Text { text } => text,
            _ => panic!("expected text prompt"),
        }
    }

    #[test]
    fn test_tools_match_table() {
        let tools = mcp().tools();
        assert_eq!(tools.len(), TOOL_TABLE.len());
        let search = tools.iter().find(|t| t.name == "search_blocks").unwrap();
        assert!(search.input_schema.contains_key("properties"));
        assert!(search.input_schema["properties"].get("query").is_some());
    }

    #[test]
    fn test_respond_and_unknown_tool() {
        let mcp = mcp();
        let response = mcp
            .respond("search_blocks", args(json!({ "query": "wifi", "board": "esp32" })))
            .unwrap();
        assert_eq!(response.data().unwrap()["results"][0]["type"], "wifi_connect");

        // Parameterless tools accept missing arguments.
        assert!(mcp.respond("list_boards", None).unwrap().is_ok());

        let err = mcp.respond("teleport", None).unwrap_err();
        assert!(err.message.contains("Unknown tool: teleport"));
    }

    #[test]
    fn test_tool_result_marks_errors() {
        let mcp = mcp();
        let ok = mcp.respond("list_categories", None).unwrap();
        assert_ne!(tool_result(&ok).is_error, Some(true));

        let miss = mcp
            .respond("search_blocks", args(json!({ "query": "wifi", "board": "uno" })))
            .unwrap();
        assert_eq!(tool_result(&miss).is_error, Some(true));
    }

    #[test]
    fn test_workspace_round_trip_through_tools() {
        let mcp = mcp();
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().to_str().unwrap();

        let workspace = json!({
            "blocks": {
                "languageVersion": 0,
                "blocks": [{ "type": "arduino_setup_loop" }]
            }
        });
        let response = mcp
            .respond(
                "update_workspace",
                args(json!({ "project_path": project, "workspace": workspace, "board": "nano" })),
            )
            .unwrap();
        assert!(response.is_ok(), "{response:?}");

        let response = mcp
            .respond("get_platform_config", args(json!({ "project_path": project })))
            .unwrap();
        assert_eq!(response.data().unwrap()["board"]["id"], "nano");
        assert_eq!(response.data().unwrap()["board_source"], "workspace");
    }

    #[test]
    fn test_resources_cover_indexes_categories_and_blocks() {
        let mcp = mcp();
        let resources = mcp.resources();
        let dict = &mcp.env().dictionary;
        assert_eq!(resources.len(), 2 + dict.all_categories().len() + dict.len());

        let uris: Vec<&str> = resources.iter().map(|r| r.uri.as_str()).collect();
        assert!(uris.contains(&"blockdex://categories"));
        assert!(uris.contains(&"blockdex://boards"));
        assert!(uris.contains(&"blockdex://categories/network"));
        assert!(uris.contains(&"blockdex://blocks/wifi_connect"));
    }

    #[test]
    fn test_resource_text() {
        let mcp = mcp();
        let text = mcp.resource_text("blockdex://blocks/servo_move").unwrap();
        let usage: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(usage["type"], "servo_move");
        assert_eq!(usage["status"], "available");

        let text = mcp.resource_text("blockdex://categories/motors").unwrap();
        let listing: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(listing["blocks"][0]["type"], "servo_setup");

        let text = mcp.resource_text("blockdex://boards").unwrap();
        assert!(text.contains("esp32-c3-devkitm-1"));

        assert!(mcp.resource_text("blockdex://blocks/teleport").is_err());
        assert!(mcp.resource_text("file:///tmp/nothing").is_err());
    }

    #[test]
    fn test_complete_argument() {
        let mcp = mcp();
        let values = mcp.complete_argument("block_type", "wifi");
        assert_eq!(values, vec!["wifi_connect", "wifi_status"]);

        assert_eq!(mcp.complete_argument("category", "VIS"), vec!["vision"]);
        assert_eq!(mcp.complete_argument("board", "super"), vec!["supermini"]);
        assert!(mcp.complete_argument("locale", "zh").contains(&"zh-hant".to_string()));
        assert!(mcp.complete_argument("focus", "").is_empty());

        let all = mcp.complete_argument("block_type", "");
        assert_eq!(all.len(), MAX_COMPLETIONS);
    }

    #[test]
    fn test_explain_block_prompt() {
        let mcp = mcp();
        let result = mcp
            .explain_block(Parameters(ExplainBlockArgs {
                block_type: "servo_move".into(),
                locale: Some("zh-TW".into()),
            }))
            .unwrap();
        let text = prompt_text(&result);
        assert!(text.starts_with("# 伺服馬達轉動角度 (`servo_move`)"));
        assert!(text.contains("```json"));
        assert!(text.contains("\"type\": \"servo_move\""));

        let err = mcp
            .explain_block(Parameters(ExplainBlockArgs {
                block_type: "teleport".into(),
                locale: None,
            }))
            .unwrap_err();
        assert!(err.message.contains("teleport"));

        assert!(mcp
            .explain_block(Parameters(ExplainBlockArgs {
                block_type: "servo_move".into(),
                locale: Some("not a tag".into()),
            }))
            .is_err());
    }

    #[test]
    fn test_log_level() {
        let mcp = mcp();
        assert_eq!(mcp.log_level(), LoggingLevel::Info);
        mcp.apply_log_level(LoggingLevel::Debug).unwrap();
        assert_eq!(mcp.clone().log_level(), LoggingLevel::Debug);
    }

    #[tokio::test]
    async fn test_serve_over_duplex() {
        use rmcp::ServiceExt;

        let (server_io, client_io) = tokio::io::duplex(64 * 1024);
        let server = tokio::spawn(async move {
            let service = mcp().serve(server_io).await?;
            service.waiting().await?;
            anyhow::Ok(())
        });

        let client = ().serve(client_io).await.unwrap();
        let tools = client.peer().list_all_tools().await.unwrap();
        assert_eq!(tools.len(), TOOL_TABLE.len());

        let result = client
            .peer()
            .call_tool({
                let mut params = CallToolRequestParams::new("get_block_usage");
                params.arguments = args(json!({ "block_type": "arduino_delay" }));
                params
            })
            .await
            .unwrap();
        assert_ne!(result.is_error, Some(true));

        let read = client
            .peer()
            .read_resource(ReadResourceRequestParams::new("blockdex://categories"))
            .await
            .unwrap();
        assert_eq!(read.contents.len(), 1);

        client.cancel().await.unwrap();
        let _ = server.await;
    }
}
