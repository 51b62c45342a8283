//! Street address suggestions from a Mapbox-style forward geocoder.

use async_trait::async_trait;
use pinmap_search_core::AddressSuggestion;
use pinmap_search_core::Coordinates;
use pinmap_search_core::QueryContext;
use pinmap_search_core::RegionBias;
use pinmap_search_core::SourceError;
use pinmap_search_core::SourceKind;
use pinmap_search_core::Suggestion;
use pinmap_search_core::SuggestionSource;
use serde::Deserialize;
use tracing::debug;

use crate::config::SourcesConfig;
use crate::rest::read_json;
use crate::rest::transport;

pub struct GeocodingSource {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    result_types: Vec<String>,
}

impl GeocodingSource {
    pub fn new(http: reqwest::Client, config: &SourcesConfig) -> Self {
        Self {
            http,
            base_url: config.geocoding_base_url.trim_end_matches('/').to_string(),
            token: config.geocoding_token.clone().filter(|t| !t.is_empty()),
            result_types: config.result_types.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    id: String,
    place_name: String,
    text: String,
    #[serde(default)]
    address: Option<String>,
    /// `[lng, lat]`
    center: [f64; 2],
    #[serde(default)]
    context: Vec<ContextEntry>,
}

#[derive(Debug, Deserialize)]
struct ContextEntry {
    text: String,
    #[serde(default)]
    short_code: Option<String>,
}

impl Feature {
    fn center(&self) -> Coordinates {
        let [lng, lat] = self.center;
        Coordinates::new(lat, lng)
    }

    /// Named in the region's context and centered inside its bbox.
    fn in_region(&self, region: &RegionBias) -> bool {
        let named = self.context.iter().any(|entry| {
            entry
                .short_code
                .as_deref()
                .is_some_and(|code| code.eq_ignore_ascii_case(&region.code))
                || entry.text.eq_ignore_ascii_case(&region.name)
        });
        named && region.contains(self.center())
    }

    fn into_suggestion(self, raw: serde_json::Value) -> Suggestion {
        let label = match &self.address {
            Some(number) => format!("{number} {}", self.text),
            None => self.text.clone(),
        };
        let subtitle = self
            .place_name
            .split_once(", ")
            .map(|(_, rest)| rest.to_string())
            .unwrap_or_default();
        let coordinates = self.center();
        Suggestion::Address(AddressSuggestion {
            id: self.id,
            label,
            subtitle,
            coordinates,
            raw_metadata: raw,
        })
    }
}

#[async_trait]
impl SuggestionSource for GeocodingSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Address
    }

    fn name(&self) -> &str {
        "geocoding"
    }

    async fn search(
        &self,
        term: &str,
        ctx: &QueryContext,
    ) -> Result<Vec<Suggestion>, SourceError> {
        let token = self
            .token
            .as_deref()
            .ok_or(SourceError::MissingCredential("geocoding access token"))?;
        let region = &ctx.region;
        let [min_lng, min_lat, max_lng, max_lat] = region.bbox;
        let url = format!(
            "{}/geocoding/v5/mapbox.places/{}.json",
            self.base_url,
            urlencoding::encode(term)
        );
        let query = [
            ("access_token", token.to_string()),
            ("country", region.country.clone()),
            ("bbox", format!("{min_lng},{min_lat},{max_lng},{max_lat}")),
            (
                "proximity",
                format!("{},{}", region.proximity.lng, region.proximity.lat),
            ),
            ("types", self.result_types.join(",")),
            ("limit", ctx.limit.to_string()),
            ("autocomplete", "true".to_string()),
        ];
        let resp = self
            .http
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(transport)?;
        let body: serde_json::Value = read_json(resp).await?;

        let raw_features = body
            .get("features")
            .and_then(serde_json::Value::as_array)
            .cloned()
            .unwrap_or_default();
        let collection: FeatureCollection =
            serde_json::from_value(body).map_err(|e| SourceError::Decode(e.to_string()))?;

        let total = collection.features.len();
        let suggestions: Vec<Suggestion> = collection
            .features
            .into_iter()
            .zip(raw_features)
            .filter(|(feature, _)| feature.in_region(region))
            .map(|(feature, raw)| feature.into_suggestion(raw))
            .take(ctx.limit)
            .collect();
        debug!(
            total,
            kept = suggestions.len(),
            region = %region.code,
            "geocoder candidates filtered by region"
        );
        Ok(suggestions)
    }
}
