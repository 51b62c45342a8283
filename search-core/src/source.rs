//! Source adapter seam and the fan-out that drives it.

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::debug;
use tracing::warn;

use crate::config::RegionBias;
use crate::error::SourceError;
use crate::mode::QueryMode;
use crate::session::Viewer;
use crate::suggestion::SourceKind;
use crate::suggestion::Suggestion;

/// Everything an adapter may need besides the term.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub mode: QueryMode,
    pub viewer: Option<Viewer>,
    pub region: RegionBias,
    /// Page size; adapters never return more than this.
    pub limit: usize,
}

#[async_trait]
pub trait SuggestionSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        self.kind().as_str()
    }

    async fn search(
        &self,
        term: &str,
        ctx: &QueryContext,
    ) -> Result<Vec<Suggestion>, SourceError>;

    /// Whether `ctx.viewer` is itself visible in this source's listing.
    /// `None` when the source cannot tell. Asked only after a directory
    /// search for a signed-in viewer came back empty.
    async fn viewer_discoverable(&self, _ctx: &QueryContext) -> Result<Option<bool>, SourceError> {
        Ok(None)
    }
}

/// Output of one adapter invocation for one dispatch.
#[derive(Debug, Clone)]
pub struct SourceResult {
    pub sequence: u64,
    pub source: SourceKind,
    pub suggestions: Vec<Suggestion>,
    pub failed: bool,
    pub elapsed: Duration,
    /// The viewer's own visibility as reported by the backend, when looked up.
    pub viewer_discoverable: Option<bool>,
}

/// Runs one adapter. Never fails: errors become an empty, `failed` result.
pub async fn query_source(
    source: &dyn SuggestionSource,
    sequence: u64,
    term: &str,
    ctx: &QueryContext,
) -> SourceResult {
    let start = Instant::now();
    let (mut suggestions, failed) = match source.search(term, ctx).await {
        Ok(suggestions) => (suggestions, false),
        Err(err) => {
            warn!(source = source.name(), sequence, "source query failed: {err}");
            (Vec::new(), true)
        }
    };
    suggestions.truncate(ctx.limit);
    let viewer_discoverable = if !failed
        && suggestions.is_empty()
        && ctx.mode == QueryMode::Directory
        && ctx.viewer.is_some()
    {
        match source.viewer_discoverable(ctx).await {
            Ok(discoverable) => discoverable,
            Err(err) => {
                warn!(source = source.name(), sequence, "visibility lookup failed: {err}");
                None
            }
        }
    } else {
        None
    };
    let elapsed = start.elapsed();
    debug!(
        source = source.name(),
        sequence,
        count = suggestions.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "source settled"
    );
    SourceResult {
        sequence,
        source: source.kind(),
        suggestions,
        failed,
        elapsed,
        viewer_discoverable,
    }
}

/// Sources queried for a given mode: everything for free text, only the
/// account directory for directory mode.
pub fn applicable(
    sources: &[Arc<dyn SuggestionSource>],
    mode: QueryMode,
) -> Vec<Arc<dyn SuggestionSource>> {
    sources
        .iter()
        .filter(|source| match mode {
            QueryMode::FreeText => true,
            QueryMode::Directory => source.kind() == SourceKind::Directory,
        })
        .cloned()
        .collect()
}

/// Queries every source concurrently and waits for all of them to settle.
pub async fn fan_out(
    sources: &[Arc<dyn SuggestionSource>],
    sequence: u64,
    term: &str,
    ctx: &QueryContext,
) -> Vec<SourceResult> {
    let tasks = sources
        .iter()
        .map(|source| query_source(source.as_ref(), sequence, term, ctx));
    join_all(tasks).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggestion::PersonSuggestion;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    struct Fixed(Vec<Suggestion>);

    #[async_trait]
    impl SuggestionSource for Fixed {
        fn kind(&self) -> SourceKind {
            SourceKind::Person
        }

        async fn search(
            &self,
            _term: &str,
            _ctx: &QueryContext,
        ) -> Result<Vec<Suggestion>, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct Broken;

    #[async_trait]
    impl SuggestionSource for Broken {
        fn kind(&self) -> SourceKind {
            SourceKind::Directory
        }

        async fn search(
            &self,
            _term: &str,
            _ctx: &QueryContext,
        ) -> Result<Vec<Suggestion>, SourceError> {
            Err(SourceError::Transport("connection reset".to_string()))
        }
    }

    struct HiddenViewer {
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl SuggestionSource for HiddenViewer {
        fn kind(&self) -> SourceKind {
            SourceKind::Directory
        }

        async fn search(
            &self,
            _term: &str,
            _ctx: &QueryContext,
        ) -> Result<Vec<Suggestion>, SourceError> {
            Ok(Vec::new())
        }

        async fn viewer_discoverable(
            &self,
            _ctx: &QueryContext,
        ) -> Result<Option<bool>, SourceError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(Some(false))
        }
    }

    fn ctx(limit: usize) -> QueryContext {
        QueryContext {
            mode: QueryMode::FreeText,
            viewer: None,
            region: RegionBias::default(),
            limit,
        }
    }

    fn people(n: usize) -> Vec<Suggestion> {
        (0..n)
            .map(|i| {
                Suggestion::Person(PersonSuggestion {
                    id: format!("p{i}"),
                    name: format!("Person {i}"),
                })
            })
            .collect()
    }

    #[tokio::test]
    async fn test_failure_becomes_empty_result() {
        let result = query_source(&Broken, 7, "mi", &ctx(5)).await;
        assert!(result.failed);
        assert!(result.suggestions.is_empty());
        assert_eq!(result.sequence, 7);
        assert_eq!(result.source, SourceKind::Directory);
    }

    #[tokio::test]
    async fn test_results_truncated_to_page_size() {
        let result = query_source(&Fixed(people(8)), 1, "pe", &ctx(5)).await;
        assert!(!result.failed);
        assert_eq!(result.suggestions.len(), 5);
    }

    #[tokio::test]
    async fn test_fan_out_settles_even_when_sources_fail() {
        let sources: Vec<Arc<dyn SuggestionSource>> =
            vec![Arc::new(Broken), Arc::new(Fixed(people(2)))];
        let results = fan_out(&sources, 3, "pe", &ctx(5)).await;
        assert_eq!(results.len(), 2);
        assert!(results[0].failed);
        assert_eq!(results[1].suggestions.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_directory_result_carries_viewer_visibility() {
        let source = HiddenViewer {
            lookups: AtomicUsize::new(0),
        };
        let directory = QueryContext {
            mode: QueryMode::Directory,
            viewer: Some(Viewer {
                user_id: "u1".to_string(),
                access_token: "token".to_string(),
                discoverable: true,
            }),
            ..ctx(5)
        };

        let result = query_source(&source, 2, "", &directory).await;
        assert_eq!(result.viewer_discoverable, Some(false));

        let signed_out = QueryContext {
            viewer: None,
            ..directory.clone()
        };
        let result = query_source(&source, 3, "", &signed_out).await;
        assert_eq!(result.viewer_discoverable, None);

        let result = query_source(&source, 4, "", &ctx(5)).await;
        assert_eq!(result.viewer_discoverable, None);
        assert_eq!(source.lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_directory_mode_restricts_sources() {
        let sources: Vec<Arc<dyn SuggestionSource>> =
            vec![Arc::new(Fixed(Vec::new())), Arc::new(Broken)];
        let picked = applicable(&sources, QueryMode::Directory);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].kind(), SourceKind::Directory);
        assert_eq!(applicable(&sources, QueryMode::FreeText).len(), 2);
    }
}
