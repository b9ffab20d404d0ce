//! Blockly workspace file access.
//!
//! The file (`blockly/main.json` under a project root by default) holds a
//! Blockly JSON serialization plus the selected board:
//!
//! ```json
//! { "workspace": { "blocks": { "languageVersion": 0, "blocks": [ ... ] } }, "board": "esp32" }
//! ```
//!
//! A bare serialization without the wrapper is accepted on read. Layout
//! (coordinates, ids) is carried through untouched; only block types, nesting
//! and variables are looked at.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use blockdex_types::{BoardId, WorkspaceSummary};

use crate::dictionary::BlockDictionary;
use crate::usage::SETUP_LOOP_BLOCK;

/// Errors reading or writing a workspace file.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("workspace file not found: {0}")]
    Missing(PathBuf),

    #[error("failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("not a Blockly workspace: {0}")]
    Shape(String),
}

pub type Result<T> = std::result::Result<T, WorkspaceError>;

/// Contents of a workspace file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceDocument {
    /// Blockly JSON serialization, kept verbatim.
    pub workspace: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<String>,
}

impl WorkspaceDocument {
    /// Accept either the wrapped form or a bare Blockly serialization.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut obj) = value else {
            return Err(WorkspaceError::Shape("expected a JSON object".into()));
        };

        let doc = if let Some(workspace) = obj.remove("workspace") {
            let board = match obj.remove("board") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s),
                Some(other) => {
                    return Err(WorkspaceError::Shape(format!(
                        "board must be a string, got {other}"
                    )));
                }
            };
            Self { workspace, board }
        } else {
            Self {
                workspace: Value::Object(obj),
                board: None,
            }
        };

        check_shape(&doc.workspace)?;
        Ok(doc)
    }

    /// Board recorded in the file, if it names a known board.
    pub fn board_id(&self) -> Option<BoardId> {
        let raw = self.board.as_deref()?;
        let board = BoardId::from_str(raw);
        if board.is_none() {
            tracing::warn!(board = raw, "workspace names an unknown board");
        }
        board
    }

    /// Walk the block tree and count what is there.
    pub fn summarize(&self) -> WorkspaceSummary {
        let mut summary = WorkspaceSummary {
            board: self.board_id(),
            ..Default::default()
        };

        for block in top_blocks(&self.workspace) {
            if let Some(t) = block.get("type").and_then(Value::as_str) {
                summary.top_level.push(t.to_string());
            }
            walk_block(block, &mut summary);
        }

        if let Some(vars) = self.workspace.get("variables").and_then(Value::as_array) {
            summary.variables = vars
                .iter()
                .filter_map(|v| v.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect();
        }

        summary
    }
}

fn check_shape(workspace: &Value) -> Result<()> {
    if !workspace.is_object() {
        return Err(WorkspaceError::Shape("workspace must be an object".into()));
    }
    match workspace.get("blocks") {
        None => Ok(()),
        Some(blocks) => match blocks.get("blocks") {
            Some(Value::Array(list)) if list.iter().all(Value::is_object) => Ok(()),
            _ => Err(WorkspaceError::Shape(
                "blocks.blocks must be an array of block objects".into(),
            )),
        },
    }
}

fn top_blocks(workspace: &Value) -> impl Iterator<Item = &Value> {
    workspace
        .get("blocks")
        .and_then(|b| b.get("blocks"))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

/// Count `block` and everything below it. Shadows are skipped.
fn walk_block(block: &Value, summary: &mut WorkspaceSummary) {
    if let Some(t) = block.get("type").and_then(Value::as_str) {
        *summary.block_counts.entry(t.to_string()).or_default() += 1;
        summary.total_blocks += 1;
    }

    if let Some(inputs) = block.get("inputs").and_then(Value::as_object) {
        for input in inputs.values() {
            if let Some(child) = input.get("block") {
                walk_block(child, summary);
            }
        }
    }
    if let Some(next) = block.get("next").and_then(|n| n.get("block")) {
        walk_block(next, summary);
    }
}

/// Resolve the workspace file for a project.
pub fn workspace_path(project_root: &Path, workspace_file: &Path) -> PathBuf {
    if workspace_file.is_absolute() {
        workspace_file.to_path_buf()
    } else {
        project_root.join(workspace_file)
    }
}

/// Read and parse a workspace file.
pub fn load(path: &Path) -> Result<WorkspaceDocument> {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(WorkspaceError::Missing(path.to_path_buf()));
        }
        Err(source) => {
            return Err(WorkspaceError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let value: Value = serde_json::from_str(&contents).map_err(|source| WorkspaceError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    WorkspaceDocument::from_value(value)
}

/// Write a workspace file.
///
/// The previous file, if any, is copied to `<name>.bak` first. The new
/// contents go to a temp file in the same directory and are renamed over the
/// target.
pub fn save(path: &Path, doc: &WorkspaceDocument) -> Result<()> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| WorkspaceError::Io { path, source }
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    if path.exists() {
        let backup = backup_path(path);
        fs::copy(path, &backup).map_err(io_err(&backup))?;
    }

    let contents = serde_json::to_string_pretty(doc).map_err(|source| WorkspaceError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let temp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&temp_path).map_err(io_err(&temp_path))?;
    file.write_all(contents.as_bytes())
        .map_err(io_err(&temp_path))?;
    file.sync_all().map_err(io_err(&temp_path))?;

    fs::rename(&temp_path, path).map_err(io_err(path))?;

    tracing::info!(path = %path.display(), bytes = contents.len(), "workspace saved");
    Ok(())
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

/// How serious a [`WorkspaceIssue`] is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IssueKind {
    UnknownBlock,
    BoardIncompatible,
    MissingSetupLoop,
    DuplicateSetupLoop,
}

/// A problem found by [`validate_workspace`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorkspaceIssue {
    pub severity: Severity,
    pub kind: IssueKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_type: Option<String>,
    pub message: String,
}

impl WorkspaceIssue {
    fn error(kind: IssueKind, block_type: Option<&str>, message: String) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            block_type: block_type.map(str::to_string),
            message,
        }
    }
}

/// Check a workspace against the dictionary.
///
/// `board` overrides the board recorded in the workspace. Issues come out in
/// block-type order; the setup/loop check comes last.
pub fn validate_workspace(
    dictionary: &BlockDictionary,
    summary: &WorkspaceSummary,
    board: Option<BoardId>,
) -> Vec<WorkspaceIssue> {
    let board = board.or(summary.board);
    let mut issues = Vec::new();

    for (block_type, count) in &summary.block_counts {
        match dictionary.get_block_by_type(block_type) {
            None => issues.push(WorkspaceIssue::error(
                IssueKind::UnknownBlock,
                Some(block_type.as_str()),
                format!("{block_type} is not a known block ({count} in workspace)"),
            )),
            Some(def) => {
                if let Some(board) = board.filter(|&b| !def.supports_board(b)) {
                    issues.push(WorkspaceIssue::error(
                        IssueKind::BoardIncompatible,
                        Some(block_type.as_str()),
                        format!(
                            "{block_type} is not available on {board} (supported: {})",
                            def.boards().label()
                        ),
                    ));
                }
            }
        }
    }

    match summary.count(SETUP_LOOP_BLOCK) {
        0 if !summary.is_empty() => issues.push(WorkspaceIssue {
            severity: Severity::Warning,
            kind: IssueKind::MissingSetupLoop,
            block_type: None,
            message: format!("no {SETUP_LOOP_BLOCK} block; the sketch will have empty setup() and loop()"),
        }),
        n if n > 1 => issues.push(WorkspaceIssue::error(
            IssueKind::DuplicateSetupLoop,
            Some(SETUP_LOOP_BLOCK),
            format!("{n} {SETUP_LOOP_BLOCK} blocks; a sketch needs exactly one"),
        )),
        _ => {}
    }

    for issue in &issues {
        tracing::warn!(kind = %issue.kind, message = %issue.message, "workspace issue");
    }
    issues
}

pub fn has_errors(issues: &[WorkspaceIssue]) -> bool {
    issues.iter().any(|i| i.severity == Severity::Error)
}
