//! Block query adapter: search, usage, category listings.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use blockdex_types::{
    BlockContext, BoardCompatibility, Category, LocaleCode, MatchedField, QueryOptions,
};

use super::{ToolEnv, project_path, to_data};
use crate::error::{EngineError, EngineResult};
use crate::usage;
use crate::workspace::{self, WorkspaceError};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchBlocksParams {
    #[schemars(description = "Words to look for; empty lists every block")]
    pub query: String,
    #[schemars(description = "Locale for names (e.g. en, zh-hant, ja)")]
    pub locale: Option<String>,
    #[schemars(description = "Only blocks that run on this board (uno, nano, mega, esp32, supermini)")]
    pub board: Option<String>,
    #[schemars(description = "Maximum results (default: configured max_results, or every block for an empty query)")]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetBlockUsageParams {
    #[schemars(description = "Block type id, e.g. arduino_digital_write")]
    pub block_type: String,
    #[schemars(description = "Locale for names and descriptions")]
    pub locale: Option<String>,
    #[schemars(description = "Board to check compatibility against (defaults to the workspace board)")]
    pub board: Option<String>,
    #[schemars(description = "Project directory holding blockly/main.json")]
    pub project_path: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListBlocksByCategoryParams {
    #[schemars(description = "Category id, e.g. logic, arduino, network")]
    pub category: String,
    #[schemars(description = "Locale for names")]
    pub locale: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListCategoriesParams {
    #[schemars(description = "Locale for category labels")]
    pub locale: Option<String>,
}

#[derive(Serialize)]
struct SearchHit<'a> {
    #[serde(rename = "type")]
    block_type: &'a str,
    name: &'a str,
    category: Category,
    score: u32,
    matched: MatchedField,
    boards: &'a BoardCompatibility,
}

fn resolve_locale(env: &ToolEnv, raw: Option<&str>) -> EngineResult<LocaleCode> {
    Ok(QueryOptions::from_raw(raw, None, env.config.query_defaults())?.locale)
}

pub(super) fn search_blocks(env: &ToolEnv, params: SearchBlocksParams) -> EngineResult<Value> {
    // Only an explicit board filters; the configured default board does not.
    let defaults = QueryOptions::new(env.config.default_locale, None);
    let opts = QueryOptions::from_raw(params.locale.as_deref(), params.board.as_deref(), defaults)?;
    let limit = match params.limit {
        Some(0) => return Err(EngineError::InvalidArgument("limit must be at least 1".into())),
        Some(n) => n,
        None if params.query.trim().is_empty() => usize::MAX,
        None => env.config.max_results,
    };

    let results = env
        .dictionary
        .search_blocks(&params.query, opts.locale, opts.board);
    if results.is_empty() {
        let key = match opts.board {
            Some(board) => format!("{} (board {board})", params.query.trim()),
            None => params.query.trim().to_string(),
        };
        return Err(EngineError::NotFound {
            what: "block",
            key,
        });
    }

    let hits: Vec<SearchHit<'_>> = results
        .iter()
        .take(limit)
        .map(|r| SearchHit {
            block_type: r.definition.block_type(),
            name: r.definition.display_name(opts.locale),
            category: r.definition.category(),
            score: r.score,
            matched: r.matched,
            boards: r.definition.boards(),
        })
        .collect();

    Ok(json!({
        "query": params.query.trim(),
        "locale": opts.locale,
        "board": opts.board,
        "total": results.len(),
        "results": hits,
    }))
}

pub(super) fn get_block_usage(env: &ToolEnv, params: GetBlockUsageParams) -> EngineResult<Value> {
    // The board default is applied after the workspace is consulted.
    let defaults = QueryOptions::new(env.config.default_locale, None);
    let opts = QueryOptions::from_raw(params.locale.as_deref(), params.board.as_deref(), defaults)?;
    let def = env.dictionary.require(params.block_type.trim())?;

    let path = env.workspace_file(project_path(&params.project_path));
    let summary = match workspace::load(&path) {
        Ok(doc) => Some(doc.summarize()),
        Err(WorkspaceError::Missing(_)) => None,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable workspace");
            None
        }
    };

    let mut context = BlockContext {
        board: opts.board,
        workspace: None,
    };
    if let Some(summary) = summary {
        context = context.with_workspace(summary);
    }
    if context.board.is_none() {
        context.board = env.config.default_board;
    }

    to_data(&usage::format_block_usage(Some(def), opts.locale, Some(&context)))
}

pub(super) fn list_blocks_by_category(
    env: &ToolEnv,
    params: ListBlocksByCategoryParams,
) -> EngineResult<Value> {
    let locale = resolve_locale(env, params.locale.as_deref())?;
    let blocks = usage::format_category_blocks(&env.dictionary, &params.category, locale)?;
    Ok(json!({
        "category": params.category.trim().to_lowercase(),
        "locale": locale,
        "blocks": blocks,
    }))
}

pub(super) fn list_categories(env: &ToolEnv, params: ListCategoriesParams) -> EngineResult<Value> {
    let locale = resolve_locale(env, params.locale.as_deref())?;
    let categories: Vec<Value> = env
        .dictionary
        .all_categories()
        .into_iter()
        .map(|info| {
            json!({
                "category": info.category,
                "name": info.category.display_name(locale),
                "priority": info.category.priority(),
                "count": info.len(),
                "block_types": info.block_types,
            })
        })
        .collect();
    Ok(json!({ "locale": locale, "categories": categories }))
}
