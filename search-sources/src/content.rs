//! News and article index.

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use pinmap_search_core::ContentSuggestion;
use pinmap_search_core::QueryContext;
use pinmap_search_core::SourceError;
use pinmap_search_core::SourceKind;
use pinmap_search_core::Suggestion;
use pinmap_search_core::SuggestionSource;
use serde::Deserialize;

use crate::rest::RestClient;
use crate::rest::contains_pattern;
use crate::rest::id_string;

pub struct ContentSource {
    rest: RestClient,
    table: String,
}

impl ContentSource {
    pub fn new(rest: RestClient, table: impl Into<String>) -> Self {
        Self {
            rest,
            table: table.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArticleRow {
    #[serde(deserialize_with = "id_string")]
    id: String,
    title: String,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default)]
    source_name: Option<String>,
    #[serde(default)]
    published_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl SuggestionSource for ContentSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Content
    }

    fn name(&self) -> &str {
        "news"
    }

    async fn search(
        &self,
        term: &str,
        ctx: &QueryContext,
    ) -> Result<Vec<Suggestion>, SourceError> {
        let pattern = contains_pattern(term);
        let query = [
            ("select", "id,title,excerpt,source_name,published_at".to_string()),
            (
                "or",
                format!("(title.ilike.{pattern},excerpt.ilike.{pattern})"),
            ),
            ("order", "published_at.desc".to_string()),
            ("limit", ctx.limit.to_string()),
        ];
        let rows: Vec<ArticleRow> = self.rest.select(&self.table, &query, None).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                Suggestion::Content(ContentSuggestion {
                    id: row.id,
                    title: row.title,
                    excerpt: row.excerpt,
                    source_name: row.source_name,
                    published_at: row.published_at,
                })
            })
            .take(ctx.limit)
            .collect())
    }
}
