//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Later overrides earlier:
//! 1. Default values
//! 2. Config file (`--config <path>`, else `$XDG_CONFIG_HOME/blockdex/config.toml`)
//! 3. CLI flags (applied by the binary)
//!
//! A missing default config file is not an error; a missing explicit one is.
//!
//! ```toml
//! default_locale = "zh-hant"
//! default_board = "esp32"
//! project_root = "/home/me/sketches/blink"
//! workspace_file = "blockly/main.json"
//! max_results = 20
//! extra_definitions = ["/home/me/blocks/neopixel.json"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use blockdex_types::{BoardId, LocaleCode, QueryOptions};

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlockdexConfig {
    /// Locale used when a request names none.
    pub default_locale: LocaleCode,
    /// Board used for usage lookups when neither the request nor the workspace
    /// names one. Search never filters by it.
    pub default_board: Option<BoardId>,
    /// Project directory; the current directory when unset.
    pub project_root: Option<PathBuf>,
    /// Workspace file, relative to the project root unless absolute.
    pub workspace_file: PathBuf,
    /// Default result count for a non-empty search without a `limit`.
    pub max_results: usize,
    /// Extension block catalogs loaded after the builtin one.
    pub extra_definitions: Vec<PathBuf>,
}

impl Default for BlockdexConfig {
    fn default() -> Self {
        Self {
            default_locale: LocaleCode::DEFAULT,
            default_board: None,
            project_root: None,
            workspace_file: PathBuf::from("blockly/main.json"),
            max_results: 50,
            extra_definitions: Vec::new(),
        }
    }
}

impl BlockdexConfig {
    /// `$XDG_CONFIG_HOME/blockdex/config.toml` (or the platform equivalent).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("blockdex").join("config.toml"))
    }

    /// Load from `path`, or from [`default_path`](Self::default_path) when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::default_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::ReadError { path, source }),
        };

        let config = Self::parse(&contents).map_err(|e| match e {
            ConfigError::ParseError { message, .. } => ConfigError::ParseError {
                path: path.clone(),
                message,
            },
            other => other,
        })?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_results == 0 {
            return Err(ConfigError::InvalidValue("max_results must be at least 1".into()));
        }
        if self.workspace_file.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue("workspace_file must not be empty".into()));
        }
        Ok(())
    }

    /// Defaults for request parsing.
    pub fn query_defaults(&self) -> QueryOptions {
        QueryOptions::new(self.default_locale, self.default_board)
    }

    /// Project root for a request: the override, else the configured root,
    /// else the current directory.
    pub fn resolve_project_root(&self, requested: Option<&Path>) -> PathBuf {
        requested
            .map(Path::to_path_buf)
            .or_else(|| self.project_root.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BlockdexConfig::parse("").unwrap();
        assert_eq!(config, BlockdexConfig::default());
        assert_eq!(config.workspace_file, PathBuf::from("blockly/main.json"));
        assert_eq!(config.max_results, 50);
    }

    #[test]
    fn test_parse_values() {
        let config = BlockdexConfig::parse(
            r#"
            default_locale = "zh-hant"
            default_board = "esp32"
            max_results = 10
            extra_definitions = ["/tmp/a.json"]
            "#,
        )
        .unwrap();
        assert_eq!(config.default_locale, LocaleCode::ZhHant);
        assert_eq!(config.default_board, Some(BoardId::Esp32));
        assert_eq!(config.max_results, 10);
        assert_eq!(config.extra_definitions, vec![PathBuf::from("/tmp/a.json")]);
        assert_eq!(
            config.query_defaults(),
            QueryOptions::new(LocaleCode::ZhHant, Some(BoardId::Esp32))
        );
    }

    #[test]
    fn test_parse_accepts_aliases() {
        let config = BlockdexConfig::parse(
            r#"
            default_locale = "zh-TW"
            default_board = "esp32c3"
            "#,
        )
        .unwrap();
        assert_eq!(config.default_locale, LocaleCode::ZhHant);
        assert_eq!(config.default_board, Some(BoardId::SuperMini));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            BlockdexConfig::parse("max_results = 0"),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            BlockdexConfig::parse("default_board = \"teensy\""),
            Err(ConfigError::ParseError { .. })
        ));
        assert!(matches!(
            BlockdexConfig::parse("colour = \"blue\""),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_locale = \"ja\"\n").unwrap();
        let config = BlockdexConfig::load(Some(path.as_path())).unwrap();
        assert_eq!(config.default_locale, LocaleCode::Ja);

        std::fs::write(&path, "max_results = \"many\"\n").unwrap();
        let err = BlockdexConfig::load(Some(path.as_path())).unwrap_err();
        assert!(err.to_string().contains("config.toml"));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            BlockdexConfig::load(Some(missing.as_path())),
            Err(ConfigError::ReadError { .. })
        ));
    }

    #[test]
    fn test_project_root_precedence() {
        let mut config = BlockdexConfig::default();
        assert_eq!(config.resolve_project_root(None), PathBuf::from("."));
        config.project_root = Some(PathBuf::from("/work/blink"));
        assert_eq!(config.resolve_project_root(None), PathBuf::from("/work/blink"));
        assert_eq!(
            config.resolve_project_root(Some(Path::new("/work/other"))),
            PathBuf::from("/work/other")
        );
    }
}
