//! `pinmap` command line: drives the federated search engine against the
//! configured sources.

pub mod config;
pub mod interactive;
pub mod logging;
pub mod query_cmd;

use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use pinmap_search_sources::build_sources;

use crate::config::AppConfig;
use crate::interactive::InteractiveArgs;
use crate::query_cmd::QueryArgs;

#[derive(Debug, Parser)]
#[command(name = "pinmap", version, about = "Map search-box autocomplete")]
pub struct Cli {
    /// Config file (defaults to ./pinmap.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read keystrokes and commands from stdin, print snapshots and events
    Interactive(InteractiveArgs),

    /// Run one query and print the merged suggestions
    Query(QueryArgs),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = AppConfig::load(self.config.as_deref())?;
        tracing::debug!(?config, "loaded config");
        let sources = build_sources(&config.sources).context("failed to build sources")?;

        match self.command {
            Command::Interactive(args) => interactive::run(args, config, sources).await,
            Command::Query(args) => query_cmd::run(args, config, sources).await,
        }
    }
}
