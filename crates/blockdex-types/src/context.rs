//! Caller-supplied query context.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::board::BoardId;
use crate::error::TypeError;
use crate::locale::LocaleCode;

/// Locale and board for one query, validated once at the boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub locale: LocaleCode,
    pub board: Option<BoardId>,
}

impl QueryOptions {
    pub fn new(locale: LocaleCode, board: Option<BoardId>) -> Self {
        Self { locale, board }
    }

    /// Build options from raw request strings.
    ///
    /// Absent or blank values take the defaults. A well-formed but unlisted
    /// locale resolves to [`LocaleCode::DEFAULT`]; a malformed locale tag or
    /// an unknown board is an error.
    pub fn from_raw(
        locale: Option<&str>,
        board: Option<&str>,
        defaults: QueryOptions,
    ) -> Result<Self, TypeError> {
        let locale = match locale.map(str::trim).filter(|s| !s.is_empty()) {
            None => defaults.locale,
            Some(tag) if LocaleCode::is_well_formed(tag) => LocaleCode::resolve(tag),
            Some(tag) => return Err(TypeError::MalformedLocale(tag.to_string())),
        };
        let board = match board.map(str::trim).filter(|s| !s.is_empty()) {
            None => defaults.board,
            Some(id) => {
                Some(BoardId::from_str(id).ok_or_else(|| TypeError::UnknownBoard(id.to_string()))?)
            }
        };
        Ok(Self { locale, board })
    }
}

/// Digest of a Blockly workspace file, enough to tailor advice.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSummary {
    /// Board recorded alongside the workspace, if recognized.
    pub board: Option<BoardId>,
    pub total_blocks: usize,
    /// Block type → occurrences (shadows excluded).
    pub block_counts: BTreeMap<String, usize>,
    /// Types of blocks placed directly on the workspace, in file order.
    pub top_level: Vec<String>,
    pub variables: Vec<String>,
}

impl WorkspaceSummary {
    pub fn contains(&self, block_type: &str) -> bool {
        self.block_counts.contains_key(block_type)
    }

    pub fn count(&self, block_type: &str) -> usize {
        self.block_counts.get(block_type).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.total_blocks == 0
    }
}

/// Optional context used to filter results and tailor usage text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockContext {
    pub board: Option<BoardId>,
    pub workspace: Option<WorkspaceSummary>,
}

impl BlockContext {
    pub fn for_board(board: BoardId) -> Self {
        Self {
            board: Some(board),
            workspace: None,
        }
    }

    pub fn with_workspace(mut self, workspace: WorkspaceSummary) -> Self {
        // An explicit board wins over the one recorded in the workspace.
        if self.board.is_none() {
            self.board = workspace.board;
        }
        self.workspace = Some(workspace);
        self
    }
}
