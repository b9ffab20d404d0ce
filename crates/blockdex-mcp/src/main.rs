//! blockdex MCP server binary.
//!
//! Serves the block dictionary to MCP clients over stdio.
//!
//! Usage:
//!   cargo run -p blockdex-mcp
//!   cargo run -p blockdex-mcp -- --project ~/sketches/blink --board esp32 --locale zh-hant
//!   cargo run -p blockdex-mcp -- --definitions extra/neopixel.json
//!
//! Test with MCP inspector:
//!   npx @modelcontextprotocol/inspector cargo run -p blockdex-mcp

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use rmcp::{ServiceExt, transport::stdio};
use tracing_subscriber::{EnvFilter, fmt};

use blockdex_kernel::{BlockDictionary, BlockdexConfig, ToolEnv};
use blockdex_mcp::BlockdexMcp;
use blockdex_types::{BoardId, LocaleCode};

/// MCP server for the blockdex block dictionary.
#[derive(Parser, Debug)]
#[command(name = "blockdex-mcp")]
#[command(about = "MCP server for Blockly block lookup and workspace editing")]
struct Args {
    /// Config file (default: ~/.config/blockdex/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Project directory holding blockly/main.json
    #[arg(long)]
    project: Option<PathBuf>,

    /// Default locale for names and descriptions
    #[arg(long)]
    locale: Option<String>,

    /// Default board (uno, nano, mega, esp32, supermini)
    #[arg(long)]
    board: Option<String>,

    /// Extra block catalogs to load after the builtin one
    #[arg(long, num_args = 1..)]
    definitions: Vec<PathBuf>,
}

impl Args {
    /// Fold command-line overrides into the loaded config.
    fn apply(self, mut config: BlockdexConfig) -> Result<BlockdexConfig> {
        if let Some(project) = self.project {
            config.project_root = Some(project);
        }
        if let Some(tag) = self.locale {
            anyhow::ensure!(LocaleCode::is_well_formed(&tag), "malformed locale: {tag}");
            config.default_locale = LocaleCode::resolve(&tag);
        }
        if let Some(id) = self.board {
            let board = BoardId::from_str(&id).with_context(|| format!("unknown board: {id}"))?;
            config.default_board = Some(board);
        }
        config.extra_definitions.extend(self.definitions);
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Tracing goes to stderr; stdout carries the protocol
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let config = BlockdexConfig::load(args.config.as_deref()).context("loading config")?;
    let config = args.apply(config)?;

    let dictionary = BlockDictionary::builtin_with_extensions(&config.extra_definitions)
        .context("building block dictionary")?
        .into_shared();

    tracing::info!(
        blocks = dictionary.len(),
        locale = %config.default_locale,
        board = ?config.default_board,
        "Starting blockdex-mcp"
    );

    let mcp = BlockdexMcp::new(ToolEnv::new(dictionary, config));

    let service = mcp
        .serve(stdio())
        .await
        .inspect_err(|e| {
            tracing::error!("MCP server error: {:?}", e);
        })?;

    tracing::info!("blockdex-mcp server ready");

    service.waiting().await?;

    tracing::info!("blockdex-mcp server shutting down");
    Ok(())
}
