//! In-memory LRU in front of a source.
//!
//! Only successful responses are stored. A hit returns exactly what the
//! inner source returned for the same key, so ordering and staleness
//! handling upstream are unaffected. The account directory is never cached:
//! a visibility change must show up on the very next query.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use pinmap_search_core::QueryContext;
use pinmap_search_core::QueryMode;
use pinmap_search_core::SourceError;
use pinmap_search_core::SourceKind;
use pinmap_search_core::Suggestion;
use pinmap_search_core::SuggestionSource;
use tokio::sync::Mutex;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    term: String,
    mode: QueryMode,
    viewer: Option<String>,
    limit: usize,
}

impl CacheKey {
    fn new(term: &str, ctx: &QueryContext) -> Self {
        Self {
            term: term.trim().to_lowercase(),
            mode: ctx.mode,
            viewer: ctx.viewer.as_ref().map(|viewer| viewer.user_id.clone()),
            limit: ctx.limit,
        }
    }
}

pub struct CachedSource {
    inner: Arc<dyn SuggestionSource>,
    entries: Mutex<LruCache<CacheKey, Vec<Suggestion>>>,
}

impl CachedSource {
    pub fn new(inner: Arc<dyn SuggestionSource>, capacity: NonZeroUsize) -> Self {
        Self {
            inner,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Wraps `inner` unless `capacity` is zero or `inner` is the account
    /// directory.
    pub fn wrap(inner: Arc<dyn SuggestionSource>, capacity: usize) -> Arc<dyn SuggestionSource> {
        if inner.kind() == SourceKind::Directory {
            return inner;
        }
        match NonZeroUsize::new(capacity) {
            Some(capacity) => Arc::new(Self::new(inner, capacity)),
            None => inner,
        }
    }

    pub async fn cached_entries(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl SuggestionSource for CachedSource {
    fn kind(&self) -> SourceKind {
        self.inner.kind()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn search(
        &self,
        term: &str,
        ctx: &QueryContext,
    ) -> Result<Vec<Suggestion>, SourceError> {
        let key = CacheKey::new(term, ctx);
        if let Some(hit) = self.entries.lock().await.get(&key).cloned() {
            trace!(source = self.name(), term = %key.term, "cache hit");
            return Ok(hit);
        }

        let suggestions = self.inner.search(term, ctx).await?;
        self.entries.lock().await.put(key, suggestions.clone());
        Ok(suggestions)
    }

    async fn viewer_discoverable(&self, ctx: &QueryContext) -> Result<Option<bool>, SourceError> {
        self.inner.viewer_discoverable(ctx).await
    }
}
