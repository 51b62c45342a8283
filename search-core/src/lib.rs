/*!
# Pinmap search core

Federated autocomplete for the map search box. One input fans out to
several independent sources, and their answers are merged into a single
dropdown:

- **Mode detection**: a leading `@` restricts the search to the account
  directory (signed-in viewers only)
- **Debounce**: free-text queries wait for a quiet period and a minimum
  length; directory queries go out on every keystroke
- **Staleness guard**: every dispatch gets a sequence number, and results
  from superseded dispatches are dropped on arrival
- **Fixed-priority merge**: addresses, entities, people, directory, content
- **Keyboard cursor** and **selection routing** into typed [`SearchEvent`]s

## Architecture

```text
SearchHandle ──inputs──> SearchEngine (actor) ──> SearchController
                             │                        │
                             │<──── Effects ──────────┘
                             ├─> debounce timer ──> DebounceElapsed
                             ├─> fan_out(sources) ─> SourcesSettled
                             ├─> SearchEventSender ─> map / router / panels
                             └─> watch<SearchSnapshot> ─> renderer
```

## Example

```rust,no_run
use pinmap_search_core::{SearchConfig, SearchEngine, SearchEventSender};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (events, mut rx) = SearchEventSender::channel();
    let sources = Vec::new(); // adapters from pinmap-search-sources
    let search = SearchEngine::spawn(SearchConfig::default(), None, sources, events)?;

    search.type_text("123 main");
    let settled = search.wait_for(|s| !s.pending && s.last_sequence > 0).await;
    println!("{:?}", settled.map(|s| s.suggestions));

    while let Some(event) = rx.recv().await {
        println!("{event:?}");
    }
    Ok(())
}
```
*/

mod aggregate;
mod config;
mod controller;
mod cursor;
mod engine;
mod error;
mod event;
mod mode;
mod router;
mod session;
mod source;
mod suggestion;

pub use aggregate::{AggregateStats, Aggregation, SourceStat, merge};
pub use config::{RegionBias, SearchConfig};
pub use controller::{
    DiscoverabilityHint, Effect, InputOrigin, PanelState, SearchController, SearchInput,
    SearchSnapshot,
};
pub use cursor::{NavKey, SelectionCursor};
pub use engine::{SearchEngine, SearchHandle};
pub use error::{ConfigError, SourceError};
pub use event::{CameraMove, SearchEvent, SearchEventSender};
pub use mode::{ModeDecision, QueryMode, detect_mode};
pub use router::route;
pub use session::{QuerySession, SequenceGuard, Viewer};
pub use source::{QueryContext, SourceResult, SuggestionSource, applicable, fan_out, query_source};
pub use suggestion::{
    AddressSuggestion, ContentSuggestion, Coordinates, DirectoryEntrySuggestion,
    EntitySuggestion, PersonSuggestion, SourceKind, Suggestion, SuggestionKind,
};
