//! Internal index of mapped places (venues, landmarks, businesses).

use async_trait::async_trait;
use pinmap_search_core::Coordinates;
use pinmap_search_core::EntitySuggestion;
use pinmap_search_core::QueryContext;
use pinmap_search_core::SourceError;
use pinmap_search_core::SourceKind;
use pinmap_search_core::Suggestion;
use pinmap_search_core::SuggestionSource;
use serde::Deserialize;

use crate::rest::RestClient;
use crate::rest::contains_pattern;
use crate::rest::id_string;

pub struct EntitySource {
    rest: RestClient,
    table: String,
}

impl EntitySource {
    pub fn new(rest: RestClient, table: impl Into<String>) -> Self {
        Self {
            rest,
            table: table.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EntityRow {
    #[serde(deserialize_with = "id_string")]
    id: String,
    name: String,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lng: Option<f64>,
}

#[async_trait]
impl SuggestionSource for EntitySource {
    fn kind(&self) -> SourceKind {
        SourceKind::Entity
    }

    async fn search(
        &self,
        term: &str,
        ctx: &QueryContext,
    ) -> Result<Vec<Suggestion>, SourceError> {
        let query = [
            ("select", "id,name,category,lat,lng".to_string()),
            ("name", format!("ilike.{}", contains_pattern(term))),
            ("order", "name.asc".to_string()),
            ("limit", ctx.limit.to_string()),
        ];
        let rows: Vec<EntityRow> = self.rest.select(&self.table, &query, None).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                // Unplaced rows cannot be flown to.
                let coordinates = Coordinates::from_nullable(row.lat, row.lng)?;
                Some(Suggestion::Entity(EntitySuggestion {
                    id: row.id,
                    name: row.name,
                    category: row.category,
                    coordinates,
                }))
            })
            .take(ctx.limit)
            .collect())
    }
}
