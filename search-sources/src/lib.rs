/*!
# Pinmap search sources

HTTP adapters behind [`pinmap_search_core::SuggestionSource`]:

| Source                  | Backend                         | Kind        |
|-------------------------|---------------------------------|-------------|
| [`GeocodingSource`]     | Mapbox-style forward geocoder   | `address`   |
| [`EntitySource`]        | PostgREST entity table          | `entity`    |
| [`PeopleSource`]        | PostgREST civic directory table | `person`    |
| [`DirectorySource`]     | PostgREST account table         | `directory` |
| [`ContentSource`]       | PostgREST news table            | `content`   |

[`build_sources`] wires all five from a [`SourcesConfig`], sharing one
`reqwest::Client`, and puts each behind a [`CachedSource`] when caching is
enabled.
*/

mod cache;
mod config;
mod content;
mod directory;
mod entities;
mod geocoding;
mod people;
mod rest;

use std::sync::Arc;

use pinmap_search_core::SourceError;
use pinmap_search_core::SuggestionSource;
use tracing::info;

pub use cache::CachedSource;
pub use config::SourcesConfig;
pub use content::ContentSource;
pub use directory::DirectorySource;
pub use entities::EntitySource;
pub use geocoding::GeocodingSource;
pub use people::PeopleSource;
pub use rest::{RestClient, sanitize_term};

/// Builds every source in merge-priority order.
pub fn build_sources(config: &SourcesConfig) -> Result<Vec<Arc<dyn SuggestionSource>>, SourceError> {
    config.validate()?;

    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .map_err(|e| SourceError::Config(format!("failed to build HTTP client: {e}")))?;
    let rest = RestClient::new(http.clone(), config);

    let sources: Vec<Arc<dyn SuggestionSource>> = vec![
        Arc::new(GeocodingSource::new(http, config)),
        Arc::new(EntitySource::new(rest.clone(), &config.entities_table)),
        Arc::new(PeopleSource::new(rest.clone(), &config.people_table)),
        Arc::new(DirectorySource::new(rest.clone(), &config.accounts_table)),
        Arc::new(ContentSource::new(rest, &config.content_table)),
    ];

    if config.geocoding_token.is_none() {
        info!("no geocoding token configured; address suggestions are disabled");
    }

    Ok(sources
        .into_iter()
        .map(|source| CachedSource::wrap(source, config.cache_capacity))
        .collect())
}
