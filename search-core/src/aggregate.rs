use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::source::SourceResult;
use crate::suggestion::SourceKind;
use crate::suggestion::Suggestion;

/// Per-source outcome of one aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStat {
    pub source: SourceKind,
    pub count: usize,
    pub failed: bool,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub sequence: u64,
    pub per_source: Vec<SourceStat>,
}

impl AggregateStats {
    pub fn failed_sources(&self) -> impl Iterator<Item = SourceKind> + '_ {
        self.per_source.iter().filter(|s| s.failed).map(|s| s.source)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub suggestions: Vec<Suggestion>,
    pub stats: AggregateStats,
    /// First backend answer about the viewer's own directory visibility.
    pub viewer_discoverable: Option<bool>,
}

/// Concatenates source results in fixed source priority.
///
/// There is no cross-source scoring: within a source the adapter's order is
/// kept, and sources are ordered by [`SourceKind`] regardless of which one
/// answered first.
pub fn merge(sequence: u64, mut results: Vec<SourceResult>) -> Aggregation {
    results.sort_by_key(|result| result.source);

    let per_source = results
        .iter()
        .map(|result| SourceStat {
            source: result.source,
            count: result.suggestions.len(),
            failed: result.failed,
            elapsed_ms: result.elapsed.as_millis() as u64,
        })
        .collect();
    let viewer_discoverable = results.iter().find_map(|result| result.viewer_discoverable);

    let suggestions: Vec<Suggestion> = results
        .into_iter()
        .flat_map(|result| result.suggestions)
        .collect();

    debug!(sequence, merged = suggestions.len(), "merged source results");

    Aggregation {
        suggestions,
        stats: AggregateStats {
            sequence,
            per_source,
        },
        viewer_discoverable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggestion::AddressSuggestion;
    use crate::suggestion::ContentSuggestion;
    use crate::suggestion::Coordinates;
    use crate::suggestion::EntitySuggestion;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn result(source: SourceKind, ids: &[&str], elapsed_ms: u64) -> SourceResult {
        let suggestions = ids
            .iter()
            .map(|id| match source {
                SourceKind::Address => Suggestion::Address(AddressSuggestion {
                    id: id.to_string(),
                    label: id.to_string(),
                    subtitle: String::new(),
                    coordinates: Coordinates::new(44.9, -93.2),
                    raw_metadata: serde_json::Value::Null,
                }),
                SourceKind::Entity => Suggestion::Entity(EntitySuggestion {
                    id: id.to_string(),
                    name: id.to_string(),
                    category: None,
                    coordinates: Coordinates::new(44.9, -93.2),
                }),
                _ => Suggestion::Content(ContentSuggestion {
                    id: id.to_string(),
                    title: id.to_string(),
                    excerpt: None,
                    source_name: None,
                    published_at: None,
                }),
            })
            .collect();
        SourceResult {
            sequence: 1,
            source,
            suggestions,
            failed: false,
            elapsed: Duration::from_millis(elapsed_ms),
            viewer_discoverable: None,
        }
    }

    fn ids(aggregation: &Aggregation) -> Vec<&str> {
        aggregation.suggestions.iter().map(Suggestion::id).collect()
    }

    #[test]
    fn test_merge_orders_by_source_priority() {
        let merged = merge(
            1,
            vec![
                result(SourceKind::Content, &["c1"], 5),
                result(SourceKind::Entity, &["e1", "e2"], 900),
                result(SourceKind::Address, &["a1"], 40),
            ],
        );
        assert_eq!(ids(&merged), vec!["a1", "e1", "e2", "c1"]);
    }

    #[test]
    fn test_merge_keeps_adapter_order_within_source() {
        let merged = merge(1, vec![result(SourceKind::Entity, &["z", "a", "m"], 1)]);
        assert_eq!(ids(&merged), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_merge_records_failures() {
        let mut failed = result(SourceKind::Address, &[], 3);
        failed.failed = true;
        let merged = merge(4, vec![failed, result(SourceKind::Content, &["c1"], 2)]);
        assert_eq!(merged.stats.sequence, 4);
        assert_eq!(
            merged.stats.failed_sources().collect::<Vec<_>>(),
            vec![SourceKind::Address]
        );
        assert_eq!(ids(&merged), vec!["c1"]);
    }

    #[test]
    fn test_merge_of_nothing_is_empty() {
        let merged = merge(2, Vec::new());
        assert!(merged.suggestions.is_empty());
        assert!(merged.stats.per_source.is_empty());
        assert_eq!(merged.viewer_discoverable, None);
    }

    #[test]
    fn test_merge_keeps_reported_viewer_visibility() {
        let mut directory = result(SourceKind::Directory, &[], 4);
        directory.viewer_discoverable = Some(false);
        let merged = merge(6, vec![result(SourceKind::Content, &[], 1), directory]);
        assert_eq!(merged.viewer_discoverable, Some(false));
    }
}
