//! Views derived from the dictionary: category groups and search hits.

use serde::Serialize;

use crate::block::BlockDefinition;
use crate::category::Category;

/// Blocks of one category, in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryInfo<'a> {
    pub category: Category,
    pub block_types: Vec<&'a str>,
}

impl CategoryInfo<'_> {
    pub fn len(&self) -> usize {
        self.block_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.block_types.is_empty()
    }
}

/// Which part of a definition a query matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedField {
    TypeId,
    DisplayName,
    Description,
    Category,
    /// Empty query: everything matches.
    All,
}

impl MatchedField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchedField::TypeId => "type_id",
            MatchedField::DisplayName => "display_name",
            MatchedField::Description => "description",
            MatchedField::Category => "category",
            MatchedField::All => "all",
        }
    }
}

/// A ranked hit borrowed from the dictionary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchResult<'a> {
    pub definition: &'a BlockDefinition,
    pub score: u32,
    pub matched: MatchedField,
}
