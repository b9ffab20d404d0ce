//! Free-text block search with tiered scoring.
//!
//! A block is scored by the best tier its fields reach:
//!
//! | Tier                                                  | Score |
//! |-------------------------------------------------------|-------|
//! | exact type id                                         | 100   |
//! | exact display name (requested or default locale)      | 90    |
//! | display name / type id prefix                         | 75    |
//! | display name / type id substring                      | 60    |
//! | description substring                                 | 40    |
//! | category id or localized category name substring      | 20    |
//!
//! Type ids are also compared with `_` read as a space, so `"digital write"`
//! reaches `arduino_digital_write`.

use blockdex_types::{BlockDefinition, BoardId, LocaleCode, MatchedField, SearchResult};

use crate::dictionary::BlockDictionary;

/// Score constants.
pub mod score {
    pub const EXACT_TYPE: u32 = 100;
    pub const EXACT_NAME: u32 = 90;
    pub const PREFIX: u32 = 75;
    pub const SUBSTRING: u32 = 60;
    pub const DESCRIPTION: u32 = 40;
    pub const CATEGORY: u32 = 20;
}

impl BlockDictionary {
    /// Rank blocks against `query`.
    ///
    /// With a board, incompatible blocks are dropped. An empty query returns
    /// every remaining block with score 0 in category order. Otherwise results
    /// are sorted by descending score; equal scores keep declaration order.
    pub fn search_blocks(
        &self,
        query: &str,
        locale: LocaleCode,
        board: Option<BoardId>,
    ) -> Vec<SearchResult<'_>> {
        let query = query.trim().to_lowercase();
        let compatible = |def: &&BlockDefinition| board.is_none_or(|b| def.supports_board(b));

        if query.is_empty() {
            return self
                .iter_by_category()
                .filter(compatible)
                .map(|definition| SearchResult {
                    definition,
                    score: 0,
                    matched: MatchedField::All,
                })
                .collect();
        }

        let mut results: Vec<SearchResult<'_>> = self
            .iter()
            .filter(compatible)
            .filter_map(|definition| {
                score_block(definition, &query, locale).map(|(score, matched)| SearchResult {
                    definition,
                    score,
                    matched,
                })
            })
            .collect();

        // sort_by is stable: ties stay in declaration order.
        results.sort_by(|a, b| b.score.cmp(&a.score));

        tracing::debug!(%query, %locale, board = ?board, hits = results.len(), "search_blocks");
        results
    }
}

/// Best tier `def` reaches for an already-normalized query.
fn score_block(def: &BlockDefinition, query: &str, locale: LocaleCode) -> Option<(u32, MatchedField)> {
    let type_id = def.block_type().to_lowercase();
    if type_id == query {
        return Some((score::EXACT_TYPE, MatchedField::TypeId));
    }

    let mut names = vec![def.display_name(locale).to_lowercase()];
    let default_name = def.display_name(LocaleCode::DEFAULT).to_lowercase();
    if !names.contains(&default_name) {
        names.push(default_name);
    }
    if names.iter().any(|n| n == query) {
        return Some((score::EXACT_NAME, MatchedField::DisplayName));
    }

    let type_spaced = type_id.replace('_', " ");
    let type_ids = [type_id.as_str(), type_spaced.as_str()];

    if names.iter().any(|n| n.starts_with(query)) {
        return Some((score::PREFIX, MatchedField::DisplayName));
    }
    if type_ids.iter().any(|t| t.starts_with(query)) {
        return Some((score::PREFIX, MatchedField::TypeId));
    }
    if names.iter().any(|n| n.contains(query)) {
        return Some((score::SUBSTRING, MatchedField::DisplayName));
    }
    if type_ids.iter().any(|t| t.contains(query)) {
        return Some((score::SUBSTRING, MatchedField::TypeId));
    }

    let descriptions = [def.description(locale), def.description(LocaleCode::DEFAULT)];
    if descriptions
        .iter()
        .flatten()
        .any(|d| d.to_lowercase().contains(query))
    {
        return Some((score::DESCRIPTION, MatchedField::Description));
    }

    let category = def.category();
    if category.as_str().contains(query)
        || category.display_name(locale).to_lowercase().contains(query)
    {
        return Some((score::CATEGORY, MatchedField::Category));
    }

    None
}
