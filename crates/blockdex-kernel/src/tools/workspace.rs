//! Workspace adapter: read, validate and replace the Blockly workspace file.

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Value, json};

use blockdex_types::BoardId;

use super::{ToolEnv, project_path};
use crate::error::{EngineError, EngineResult};
use crate::workspace::{self, WorkspaceDocument, WorkspaceError, has_errors};

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetWorkspaceStateParams {
    #[schemars(description = "Project directory holding blockly/main.json")]
    pub project_path: Option<String>,
    #[schemars(description = "Include the raw Blockly JSON in the response")]
    #[serde(default)]
    pub include_raw: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ValidateWorkspaceParams {
    #[schemars(description = "Project directory holding blockly/main.json")]
    pub project_path: Option<String>,
    #[schemars(description = "Check against this board instead of the recorded one")]
    pub board: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateWorkspaceParams {
    #[schemars(description = "Project directory holding blockly/main.json")]
    pub project_path: Option<String>,
    #[schemars(description = "New Blockly JSON serialization (the value of Blockly.serialization.workspaces.save)")]
    pub workspace: Value,
    #[schemars(description = "Board to record; keeps the current one when omitted")]
    pub board: Option<String>,
}

fn parse_board(raw: Option<&str>) -> EngineResult<Option<BoardId>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(id) => BoardId::from_str(id)
            .map(Some)
            .ok_or_else(|| EngineError::InvalidArgument(format!("unknown board: {id}"))),
    }
}

/// Load the project's workspace; any failure means there is no usable context.
fn load(env: &ToolEnv, raw_path: &Option<String>) -> EngineResult<(PathBuf, WorkspaceDocument)> {
    let path = env.workspace_file(project_path(raw_path));
    let doc = workspace::load(&path).map_err(|e| EngineError::UnavailableContext(e.to_string()))?;
    Ok((path, doc))
}

pub(super) fn get_workspace_state(
    env: &ToolEnv,
    params: GetWorkspaceStateParams,
) -> EngineResult<Value> {
    let (path, doc) = load(env, &params.project_path)?;
    let mut data = json!({
        "path": path.display().to_string(),
        "board": doc.board,
        "summary": doc.summarize(),
    });
    if params.include_raw {
        data["raw"] = doc.workspace;
    }
    Ok(data)
}

pub(super) fn validate_workspace(
    env: &ToolEnv,
    params: ValidateWorkspaceParams,
) -> EngineResult<Value> {
    let board = parse_board(params.board.as_deref())?;
    let (path, doc) = load(env, &params.project_path)?;
    let summary = doc.summarize();
    let issues = workspace::validate_workspace(&env.dictionary, &summary, board);

    Ok(json!({
        "path": path.display().to_string(),
        "board": board.or(summary.board),
        "valid": !has_errors(&issues),
        "issues": issues,
    }))
}

pub(super) fn update_workspace(env: &ToolEnv, params: UpdateWorkspaceParams) -> EngineResult<Value> {
    let board = parse_board(params.board.as_deref())?;
    let path = env.workspace_file(project_path(&params.project_path));

    let mut doc = WorkspaceDocument::from_value(params.workspace)
        .map_err(|e| EngineError::InvalidArgument(e.to_string()))?;

    let previous = match workspace::load(&path) {
        Ok(prev) => Some(prev),
        Err(WorkspaceError::Missing(_)) => None,
        Err(e) => {
            tracing::warn!(error = %e, "replacing unreadable workspace");
            None
        }
    };
    // Request board, then the document's own, then the one already on disk.
    let recorded = parse_board(doc.board.as_deref())?;
    let board = board
        .or(recorded)
        .or_else(|| previous.as_ref().and_then(|p| p.board_id()));
    doc.board = board.map(|b| b.as_str().to_string());

    let summary = doc.summarize();
    let issues = workspace::validate_workspace(&env.dictionary, &summary, board);
    if has_errors(&issues) {
        let messages: Vec<&str> = issues.iter().map(|i| i.message.as_str()).collect();
        return Err(EngineError::InvalidArgument(format!(
            "workspace rejected: {}",
            messages.join("; ")
        )));
    }

    let replaced = path.exists();
    workspace::save(&path, &doc)
        .map_err(|e| EngineError::UnavailableContext(format!("cannot write workspace: {e}")))?;

    Ok(json!({
        "path": path.display().to_string(),
        "backup": replaced.then(|| workspace::backup_path(&path).display().to_string()),
        "board": doc.board,
        "summary": summary,
        "warnings": issues,
    }))
}

#[cfg(test)]
mod tests {
    use super::super::tests::env;
    use super::super::{ToolResponse, dispatch};
    use serde_json::{Value, json};
    use std::path::Path;

    fn blink() -> Value {
        json!({
            "blocks": {
                "languageVersion": 0,
                "blocks": [{
                    "type": "arduino_setup_loop",
                    "inputs": {
                        "LOOP": { "block": { "type": "arduino_digital_write" } }
                    }
                }]
            }
        })
    }

    fn project(dir: &Path) -> Value {
        json!(dir.to_str().unwrap())
    }

    #[test]
    fn test_state_without_file_is_no_match() {
        let dir = tempfile::tempdir().unwrap();
        let response = dispatch(
            &env(),
            "get_workspace_state",
            json!({ "project_path": project(dir.path()) }),
        )
        .unwrap();
        assert!(matches!(response, ToolResponse::NoMatch { .. }));
    }

    #[test]
    fn test_update_then_read_back() {
        let env = env();
        let dir = tempfile::tempdir().unwrap();

        let response = dispatch(
            &env,
            "update_workspace",
            json!({ "project_path": project(dir.path()), "workspace": blink(), "board": "uno" }),
        )
        .unwrap();
        let data = response.data().unwrap();
        assert!(data["backup"].is_null());
        assert_eq!(data["board"], "uno");

        let response = dispatch(
            &env,
            "get_workspace_state",
            json!({ "project_path": project(dir.path()), "include_raw": true }),
        )
        .unwrap();
        let data = response.data().unwrap();
        assert_eq!(data["board"], "uno");
        assert_eq!(data["summary"]["total_blocks"], 2);
        assert_eq!(data["summary"]["top_level"], json!(["arduino_setup_loop"]));
        assert_eq!(data["raw"], blink());

        // Second write keeps the board and leaves a backup.
        let response = dispatch(
            &env,
            "update_workspace",
            json!({ "project_path": project(dir.path()), "workspace": {} }),
        )
        .unwrap();
        let data = response.data().unwrap();
        assert_eq!(data["board"], "uno");
        let backup = data["backup"].as_str().unwrap();
        assert!(backup.ends_with("main.json.bak"));
        assert!(Path::new(backup).exists());
    }

    #[test]
    fn test_update_rejects_incompatible_blocks() {
        let env = env();
        let dir = tempfile::tempdir().unwrap();
        let mut ws = blink();
        ws["blocks"]["blocks"][0]["inputs"]["SETUP"] = json!({ "block": { "type": "wifi_connect" } });

        let response = dispatch(
            &env,
            "update_workspace",
            json!({ "project_path": project(dir.path()), "workspace": ws, "board": "uno" }),
        )
        .unwrap();
        let ToolResponse::InvalidArguments { message } = response else {
            panic!("expected invalid_arguments, got {response:?}");
        };
        assert!(message.contains("wifi_connect is not available on uno"));
        assert!(!dir.path().join("blockly/main.json").exists());

        let response = dispatch(
            &env,
            "update_workspace",
            json!({ "project_path": project(dir.path()), "workspace": [1, 2] }),
        )
        .unwrap();
        assert!(matches!(response, ToolResponse::InvalidArguments { .. }));
    }

    #[test]
    fn test_update_rejects_unknown_recorded_board() {
        let env = env();
        let dir = tempfile::tempdir().unwrap();
        let mut ws = blink();
        ws["blocks"]["blocks"][0]["inputs"]["SETUP"] = json!({ "block": { "type": "wifi_connect" } });

        let response = dispatch(
            &env,
            "update_workspace",
            json!({
                "project_path": project(dir.path()),
                "workspace": { "workspace": ws, "board": "teensy" },
            }),
        )
        .unwrap();
        let ToolResponse::InvalidArguments { message } = response else {
            panic!("expected invalid_arguments, got {response:?}");
        };
        assert!(message.contains("unknown board: teensy"));
        assert!(!dir.path().join("blockly/main.json").exists());
    }

    #[test]
    fn test_update_checks_and_normalizes_recorded_board() {
        let env = env();
        let dir = tempfile::tempdir().unwrap();
        let mut ws = blink();
        ws["blocks"]["blocks"][0]["inputs"]["SETUP"] = json!({ "block": { "type": "wifi_connect" } });

        // The board inside the wrapper is enforced like a request board.
        let response = dispatch(
            &env,
            "update_workspace",
            json!({
                "project_path": project(dir.path()),
                "workspace": { "workspace": ws.clone(), "board": "uno" },
            }),
        )
        .unwrap();
        let ToolResponse::InvalidArguments { message } = response else {
            panic!("expected invalid_arguments, got {response:?}");
        };
        assert!(message.contains("wifi_connect is not available on uno"));

        let response = dispatch(
            &env,
            "update_workspace",
            json!({
                "project_path": project(dir.path()),
                "workspace": { "workspace": ws, "board": " ESP32 " },
            }),
        )
        .unwrap();
        assert_eq!(response.data().unwrap()["board"], "esp32");
    }

    #[test]
    fn test_update_reports_backup_of_unreadable_file() {
        let env = env();
        let dir = tempfile::tempdir().unwrap();
        let blockly = dir.path().join("blockly");
        std::fs::create_dir_all(&blockly).unwrap();
        std::fs::write(blockly.join("main.json"), "not json").unwrap();

        let response = dispatch(
            &env,
            "update_workspace",
            json!({ "project_path": project(dir.path()), "workspace": blink() }),
        )
        .unwrap();
        let backup = response.data().unwrap()["backup"].as_str().unwrap().to_string();
        assert!(backup.ends_with("main.json.bak"));
        assert_eq!(std::fs::read_to_string(backup).unwrap(), "not json");
    }

    #[test]
    fn test_validate_with_board_override() {
        let env = env();
        let dir = tempfile::tempdir().unwrap();
        let mut ws = blink();
        ws["blocks"]["blocks"][0]["inputs"]["SETUP"] = json!({ "block": { "type": "sensor_touch" } });
        dispatch(
            &env,
            "update_workspace",
            json!({ "project_path": project(dir.path()), "workspace": ws, "board": "esp32" }),
        )
        .unwrap();

        let response = dispatch(
            &env,
            "validate_workspace",
            json!({ "project_path": project(dir.path()) }),
        )
        .unwrap();
        assert_eq!(response.data().unwrap()["valid"], true);

        let response = dispatch(
            &env,
            "validate_workspace",
            json!({ "project_path": project(dir.path()), "board": "supermini" }),
        )
        .unwrap();
        let data = response.data().unwrap();
        assert_eq!(data["valid"], false);
        assert_eq!(data["issues"][0]["kind"], "board_incompatible");
        assert_eq!(data["board"], "supermini");
    }
}
