//! Platform adapter: boards and locales.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use blockdex_types::{BoardId, BoardInfo, LocaleCode};

use super::{ToolEnv, project_path};
use crate::error::EngineResult;
use crate::workspace::{self, WorkspaceError};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetPlatformConfigParams {
    #[schemars(description = "Project directory holding blockly/main.json")]
    pub project_path: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListBoardsParams {}

/// Where the active board came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum BoardSource {
    Workspace,
    Config,
    #[serde(rename = "none")]
    Unset,
}

#[derive(Serialize)]
struct BoardEntry {
    #[serde(flatten)]
    info: BoardInfo,
    compatible_blocks: usize,
}

pub(super) fn get_platform_config(
    env: &ToolEnv,
    params: GetPlatformConfigParams,
) -> EngineResult<Value> {
    let path = env.workspace_file(project_path(&params.project_path));

    let recorded = match workspace::load(&path) {
        Ok(doc) => doc.board_id(),
        Err(WorkspaceError::Missing(_)) => None,
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable workspace");
            None
        }
    };
    let (board, source) = match (recorded, env.config.default_board) {
        (Some(b), _) => (Some(b), BoardSource::Workspace),
        (None, Some(b)) => (Some(b), BoardSource::Config),
        (None, None) => (None, BoardSource::Unset),
    };

    let locales: Vec<Value> = LocaleCode::all()
        .map(|l| json!({ "code": l, "name": l.native_name() }))
        .collect();

    Ok(json!({
        "board": board.map(|b| b.info()),
        "board_source": source,
        "workspace_file": path.display().to_string(),
        "default_locale": env.config.default_locale,
        "boards": BoardId::all().map(|b| b.as_str()).collect::<Vec<_>>(),
        "locales": locales,
    }))
}

pub(super) fn list_boards(env: &ToolEnv, _params: ListBoardsParams) -> EngineResult<Value> {
    let boards: Vec<BoardEntry> = BoardId::all()
        .map(|board| BoardEntry {
            info: board.info(),
            compatible_blocks: env
                .dictionary
                .iter()
                .filter(|d| d.supports_board(board))
                .count(),
        })
        .collect();
    Ok(json!({ "boards": boards }))
}
