//! The block metadata store.
//!
//! Built once at startup from the embedded catalog (plus optional extension
//! files) and never mutated afterwards. Callers share it as
//! [`SharedDictionary`]; every query borrows from it.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use blockdex_types::{BlockDefinition, Category, CategoryInfo};

use crate::error::{DictionaryError, EngineError, EngineResult};

/// Catalog compiled into the binary.
const BUILTIN_CATALOG: &str = include_str!("../data/blocks.json");

/// Shared handle to an immutable dictionary.
pub type SharedDictionary = Arc<BlockDictionary>;

/// Immutable catalog of block definitions.
///
/// Definitions keep their declaration order. Lookups by type go through a
/// hash index; category grouping is precomputed.
#[derive(Debug)]
pub struct BlockDictionary {
    blocks: Vec<BlockDefinition>,
    by_type: HashMap<String, usize>,
    by_category: BTreeMap<Category, Vec<usize>>,
}

impl BlockDictionary {
    /// Build a dictionary, rejecting duplicate block types.
    pub fn from_definitions(blocks: Vec<BlockDefinition>) -> Result<Self, DictionaryError> {
        let mut by_type = HashMap::with_capacity(blocks.len());
        let mut by_category: BTreeMap<Category, Vec<usize>> = BTreeMap::new();

        for (idx, def) in blocks.iter().enumerate() {
            if by_type.insert(def.block_type().to_string(), idx).is_some() {
                return Err(DictionaryError::DuplicateType(def.block_type().to_string()));
            }
            by_category.entry(def.category()).or_default().push(idx);
        }

        tracing::info!(
            blocks = blocks.len(),
            categories = by_category.len(),
            "block dictionary built"
        );

        Ok(Self {
            blocks,
            by_type,
            by_category,
        })
    }

    /// The embedded catalog.
    pub fn builtin() -> Result<Self, DictionaryError> {
        Self::from_definitions(parse_catalog("builtin", BUILTIN_CATALOG)?)
    }

    /// The embedded catalog followed by extension catalogs, in order.
    ///
    /// An extension may only add block types; redefining one is an error.
    pub fn builtin_with_extensions<P: AsRef<Path>>(paths: &[P]) -> Result<Self, DictionaryError> {
        let mut blocks = parse_catalog("builtin", BUILTIN_CATALOG)?;
        for path in paths {
            let path = path.as_ref();
            let json = std::fs::read_to_string(path).map_err(|error| DictionaryError::Io {
                path: path.to_path_buf(),
                error,
            })?;
            let extra = parse_catalog(&path.display().to_string(), &json)?;
            tracing::debug!(path = %path.display(), blocks = extra.len(), "loaded extension catalog");
            blocks.extend(extra);
        }
        Self::from_definitions(blocks)
    }

    /// Look up a block by exact type id.
    pub fn get_block_by_type(&self, block_type: &str) -> Option<&BlockDefinition> {
        self.by_type.get(block_type).map(|&idx| &self.blocks[idx])
    }

    /// Like [`get_block_by_type`](Self::get_block_by_type), but `NotFound` on a miss.
    pub fn require(&self, block_type: &str) -> EngineResult<&BlockDefinition> {
        self.get_block_by_type(block_type)
            .ok_or_else(|| EngineError::block_not_found(block_type))
    }

    /// Non-empty categories in priority order.
    pub fn all_categories(&self) -> Vec<CategoryInfo<'_>> {
        self.by_category
            .iter()
            .map(|(&category, indices)| CategoryInfo {
                category,
                block_types: indices
                    .iter()
                    .map(|&idx| self.blocks[idx].block_type())
                    .collect(),
            })
            .collect()
    }

    /// Blocks of one category in declaration order.
    pub fn blocks_in_category(&self, category: Category) -> impl Iterator<Item = &BlockDefinition> {
        self.by_category
            .get(&category)
            .into_iter()
            .flatten()
            .map(|&idx| &self.blocks[idx])
    }

    /// Every block, category-priority order first, declaration order within.
    pub fn iter_by_category(&self) -> impl Iterator<Item = &BlockDefinition> {
        self.by_category
            .values()
            .flatten()
            .map(|&idx| &self.blocks[idx])
    }

    /// Every block in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &BlockDefinition> {
        self.blocks.iter()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn into_shared(self) -> SharedDictionary {
        Arc::new(self)
    }
}

/// Parse a JSON array of block definitions.
pub fn parse_catalog(source_name: &str, json: &str) -> Result<Vec<BlockDefinition>, DictionaryError> {
    serde_json::from_str(json).map_err(|error| DictionaryError::Parse {
        source_name: source_name.to_string(),
        error,
    })
}
