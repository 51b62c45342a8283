use std::sync::Arc;

use anyhow::Result;
use anyhow::bail;
use clap::Parser;
use pinmap_search_core::AggregateStats;
use pinmap_search_core::PanelState;
use pinmap_search_core::QueryMode;
use pinmap_search_core::SearchEngine;
use pinmap_search_core::SearchEventSender;
use pinmap_search_core::SearchSnapshot;
use pinmap_search_core::Suggestion;
use pinmap_search_core::SuggestionSource;
use pinmap_search_core::detect_mode;
use serde::Serialize;
use tokio::time::timeout;
use tracing::debug;

use crate::config::AppConfig;
use crate::config::ENV_VIEWER_TOKEN;

#[derive(Debug, Parser)]
pub struct QueryArgs {
    /// Text to type into the search box
    #[arg(value_name = "TEXT")]
    pub text: String,

    /// Include per-source diagnostics in the output
    #[arg(long)]
    pub stats: bool,
}

#[derive(Serialize)]
struct QueryOutput<'a> {
    suggestions: &'a [Suggestion],
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<&'a AggregateStats>,
}

fn settled(snapshot: &SearchSnapshot) -> bool {
    snapshot.last_sequence > 0
        && !snapshot.pending
        && snapshot.stats.sequence == snapshot.last_sequence
}

/// Types `args.text`, waits for the aggregation, prints it as JSON.
pub async fn run(
    args: QueryArgs,
    config: AppConfig,
    sources: Vec<Arc<dyn SuggestionSource>>,
) -> Result<()> {
    let decision = detect_mode(&args.text, config.search.directory_sigil);
    let viewer = config.viewer();
    match decision.mode {
        QueryMode::FreeText if decision.term_len() < config.search.min_query_chars => bail!(
            "query must be at least {} characters",
            config.search.min_query_chars
        ),
        QueryMode::Directory if viewer.is_none() => {
            bail!("directory search requires a signed-in viewer (set {ENV_VIEWER_TOKEN})")
        }
        _ => {}
    }

    // Debounce plus every source's own timeout bounds the wait.
    let deadline = config.search.debounce() + config.sources.request_timeout() * 2;
    let (events, _events_rx) = SearchEventSender::channel();
    let search = SearchEngine::spawn(config.search, viewer, sources, events)?;
    search.type_text(args.text);

    let snapshot = match timeout(deadline, search.wait_for(settled)).await {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => bail!("search engine stopped before the query settled"),
        Err(_) => bail!("query did not settle within {deadline:?}"),
    };
    debug!(stats = ?snapshot.stats, "query settled");

    if let PanelState::NoMatch { hint: Some(hint) } = snapshot.panel {
        eprintln!("no match; hint: {}", serde_json::to_string(&hint)?);
    }

    let output = QueryOutput {
        suggestions: &snapshot.suggestions,
        stats: args.stats.then_some(&snapshot.stats),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
