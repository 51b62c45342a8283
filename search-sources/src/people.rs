//! Civic directory of public figures.

use async_trait::async_trait;
use pinmap_search_core::PersonSuggestion;
use pinmap_search_core::QueryContext;
use pinmap_search_core::SourceError;
use pinmap_search_core::SourceKind;
use pinmap_search_core::Suggestion;
use pinmap_search_core::SuggestionSource;
use serde::Deserialize;

use crate::rest::RestClient;
use crate::rest::contains_pattern;
use crate::rest::id_string;

pub struct PeopleSource {
    rest: RestClient,
    table: String,
}

impl PeopleSource {
    pub fn new(rest: RestClient, table: impl Into<String>) -> Self {
        Self {
            rest,
            table: table.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PersonRow {
    #[serde(deserialize_with = "id_string")]
    id: String,
    name: String,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
}

#[async_trait]
impl SuggestionSource for PeopleSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Person
    }

    fn name(&self) -> &str {
        "people"
    }

    async fn search(
        &self,
        term: &str,
        ctx: &QueryContext,
    ) -> Result<Vec<Suggestion>, SourceError> {
        let query = [
            ("select", "id,name,lat,lng".to_string()),
            ("name", format!("ilike.{}", contains_pattern(term))),
            ("limit", ctx.limit.to_string()),
        ];
        let rows: Vec<PersonRow> = self.rest.select(&self.table, &query, None).await?;
        Ok(rows
            .into_iter()
            .filter(|row| row.lat.is_some() && row.lng.is_some())
            .map(|row| {
                Suggestion::Person(PersonSuggestion {
                    id: row.id,
                    name: row.name,
                })
            })
            .take(ctx.limit)
            .collect())
    }
}
