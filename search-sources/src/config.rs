use std::time::Duration;

use pinmap_search_core::SourceError;
use serde::Deserialize;
use serde::Serialize;

/// Endpoints and credentials for the HTTP-backed sources.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Base URL of the Mapbox-style geocoder
    #[serde(default = "default_geocoding_base_url")]
    pub geocoding_base_url: String,

    /// Geocoder access token. Without one the address source always fails.
    #[serde(default)]
    pub geocoding_token: Option<String>,

    /// Geocoder feature types to request
    #[serde(default = "default_result_types")]
    pub result_types: Vec<String>,

    /// Base URL of the PostgREST-style backend
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Public API key sent as the `apikey` header on every backend request
    #[serde(default)]
    pub backend_api_key: String,

    #[serde(default = "default_entities_table")]
    pub entities_table: String,

    #[serde(default = "default_people_table")]
    pub people_table: String,

    #[serde(default = "default_accounts_table")]
    pub accounts_table: String,

    #[serde(default = "default_content_table")]
    pub content_table: String,

    /// Per-request timeout, in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Entries kept per source in the response cache; 0 disables caching
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

fn default_geocoding_base_url() -> String {
    "https://api.mapbox.com".to_string()
}

fn default_result_types() -> Vec<String> {
    vec!["address".to_string()]
}

fn default_backend_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_entities_table() -> String {
    "entities".to_string()
}

fn default_people_table() -> String {
    "people".to_string()
}

fn default_accounts_table() -> String {
    "accounts".to_string()
}

fn default_content_table() -> String {
    "news_articles".to_string()
}

fn default_request_timeout_ms() -> u64 {
    8_000
}

fn default_cache_capacity() -> usize {
    64
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            geocoding_base_url: default_geocoding_base_url(),
            geocoding_token: None,
            result_types: default_result_types(),
            backend_url: default_backend_url(),
            backend_api_key: String::new(),
            entities_table: default_entities_table(),
            people_table: default_people_table(),
            accounts_table: default_accounts_table(),
            content_table: default_content_table(),
            request_timeout_ms: default_request_timeout_ms(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl std::fmt::Debug for SourcesConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourcesConfig")
            .field("geocoding_base_url", &self.geocoding_base_url)
            .field(
                "geocoding_token",
                &self.geocoding_token.as_ref().map(|_| "<redacted>"),
            )
            .field("result_types", &self.result_types)
            .field("backend_url", &self.backend_url)
            .field("entities_table", &self.entities_table)
            .field("people_table", &self.people_table)
            .field("accounts_table", &self.accounts_table)
            .field("content_table", &self.content_table)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("cache_capacity", &self.cache_capacity)
            .finish_non_exhaustive()
    }
}

impl SourcesConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), SourceError> {
        for (field, url) in [
            ("geocoding_base_url", &self.geocoding_base_url),
            ("backend_url", &self.backend_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(SourceError::Config(format!(
                    "{field} must be an http(s) URL, got {url:?}"
                )));
            }
        }

        for (field, table) in [
            ("entities_table", &self.entities_table),
            ("people_table", &self.people_table),
            ("accounts_table", &self.accounts_table),
            ("content_table", &self.content_table),
        ] {
            if table.is_empty() || !table.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(SourceError::Config(format!(
                    "{field} must be a plain table name, got {table:?}"
                )));
            }
        }

        if self.result_types.is_empty() {
            return Err(SourceError::Config(
                "result_types must name at least one feature type".to_string(),
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err(SourceError::Config(
                "request_timeout_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
