//! Account directory, reachable only through the `@` prefix.
//!
//! Only accounts that opted into search visibility are returned, and the
//! backend sees the viewer's own token so row-level policies apply. When a
//! lookup comes back empty the viewer's own visibility row is read as well,
//! so the caller can suggest making the profile discoverable.

use async_trait::async_trait;
use pinmap_search_core::DirectoryEntrySuggestion;
use pinmap_search_core::QueryContext;
use pinmap_search_core::SourceError;
use pinmap_search_core::SourceKind;
use pinmap_search_core::Suggestion;
use pinmap_search_core::SuggestionSource;
use serde::Deserialize;
use tracing::debug;

use crate::rest::RestClient;
use crate::rest::id_string;
use crate::rest::sanitize_term;

pub struct DirectorySource {
    rest: RestClient,
    table: String,
}

impl DirectorySource {
    pub fn new(rest: RestClient, table: impl Into<String>) -> Self {
        Self {
            rest,
            table: table.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AccountRow {
    #[serde(deserialize_with = "id_string")]
    id: String,
    username: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    tier: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VisibilityRow {
    #[serde(default)]
    search_visibility: Option<bool>,
}

#[async_trait]
impl SuggestionSource for DirectorySource {
    fn kind(&self) -> SourceKind {
        SourceKind::Directory
    }

    async fn search(
        &self,
        term: &str,
        ctx: &QueryContext,
    ) -> Result<Vec<Suggestion>, SourceError> {
        let Some(viewer) = ctx.viewer.as_ref() else {
            debug!("directory search skipped for signed-out viewer");
            return Err(SourceError::Unauthenticated);
        };

        let mut query = vec![
            ("select", "id,username,display_name,avatar_url,tier".to_string()),
            ("search_visibility", "eq.true".to_string()),
            ("order", "username.asc".to_string()),
            ("limit", ctx.limit.to_string()),
        ];
        let prefix = sanitize_term(term).to_lowercase();
        if !prefix.is_empty() {
            query.push(("username", format!("ilike.{prefix}*")));
        }

        let rows: Vec<AccountRow> = self
            .rest
            .select(&self.table, &query, Some(&viewer.access_token))
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                Suggestion::Directory(DirectoryEntrySuggestion {
                    id: row.id,
                    handle: row.username,
                    display_name: row.display_name,
                    avatar_ref: row.avatar_url,
                    tier: row.tier,
                })
            })
            .take(ctx.limit)
            .collect())
    }

    async fn viewer_discoverable(&self, ctx: &QueryContext) -> Result<Option<bool>, SourceError> {
        let Some(viewer) = ctx.viewer.as_ref() else {
            return Ok(None);
        };
        let query = [
            ("select", "search_visibility".to_string()),
            ("id", format!("eq.{}", viewer.user_id)),
            ("limit", "1".to_string()),
        ];
        let rows: Vec<VisibilityRow> = self
            .rest
            .select(&self.table, &query, Some(&viewer.access_token))
            .await?;
        let discoverable = rows.into_iter().next().and_then(|row| row.search_visibility);
        debug!(user_id = %viewer.user_id, ?discoverable, "read viewer visibility");
        Ok(discoverable)
    }
}
