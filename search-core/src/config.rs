use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::error::ConfigError;
use crate::suggestion::Coordinates;

/// Geographic bias applied to location-aware sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionBias {
    /// Human-readable region name, matched against geocoder context entries.
    #[serde(default = "default_region_name")]
    pub name: String,

    /// ISO 3166-2 code of the region, e.g. `US-MN`.
    #[serde(default = "default_region_code")]
    pub code: String,

    /// ISO 3166-1 alpha-2 country filter passed to the geocoder.
    #[serde(default = "default_country")]
    pub country: String,

    /// `[min_lng, min_lat, max_lng, max_lat]`
    #[serde(default = "default_bbox")]
    pub bbox: [f64; 4],

    /// Point that nearby results are biased towards.
    #[serde(default = "default_proximity")]
    pub proximity: Coordinates,
}

fn default_region_name() -> String {
    "Minnesota".to_string()
}

fn default_region_code() -> String {
    "US-MN".to_string()
}

fn default_country() -> String {
    "us".to_string()
}

fn default_bbox() -> [f64; 4] {
    [-97.24, 43.50, -89.49, 49.38]
}

fn default_proximity() -> Coordinates {
    Coordinates {
        lat: 44.9778,
        lng: -93.265,
    }
}

impl Default for RegionBias {
    fn default() -> Self {
        Self {
            name: default_region_name(),
            code: default_region_code(),
            country: default_country(),
            bbox: default_bbox(),
            proximity: default_proximity(),
        }
    }
}

impl RegionBias {
    pub fn contains(&self, point: Coordinates) -> bool {
        let [min_lng, min_lat, max_lng, max_lat] = self.bbox;
        (min_lng..=max_lng).contains(&point.lng) && (min_lat..=max_lat).contains(&point.lat)
    }
}

/// Tuning for the search engine itself. Passed in at construction; the
/// engine never reads ambient state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Quiet interval before a free-text query is dispatched, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Minimum trimmed length (in chars) of a free-text query
    #[serde(default = "default_min_query_chars")]
    pub min_query_chars: usize,

    /// Results requested from, and kept per, source
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Leading character that switches to directory-only search
    #[serde(default = "default_directory_sigil")]
    pub directory_sigil: char,

    /// Camera zoom used when flying to a selected location
    #[serde(default = "default_fly_to_zoom")]
    pub fly_to_zoom: f64,

    /// Camera transition length, in milliseconds
    #[serde(default = "default_fly_to_duration_ms")]
    pub fly_to_duration_ms: u64,

    /// Route prefix that a directory handle is appended to
    #[serde(default = "default_profile_route_prefix")]
    pub profile_route_prefix: String,

    #[serde(default)]
    pub region: RegionBias,
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_min_query_chars() -> usize {
    2
}

fn default_page_size() -> usize {
    5
}

fn default_directory_sigil() -> char {
    '@'
}

fn default_fly_to_zoom() -> f64 {
    16.0
}

fn default_fly_to_duration_ms() -> u64 {
    1500
}

fn default_profile_route_prefix() -> String {
    "/profile/".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            min_query_chars: default_min_query_chars(),
            page_size: default_page_size(),
            directory_sigil: default_directory_sigil(),
            fly_to_zoom: default_fly_to_zoom(),
            fly_to_duration_ms: default_fly_to_duration_ms(),
            profile_route_prefix: default_profile_route_prefix(),
            region: RegionBias::default(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Zero { field: "page_size" });
        }

        if self.min_query_chars == 0 {
            return Err(ConfigError::Zero {
                field: "min_query_chars",
            });
        }

        if self.directory_sigil.is_whitespace() {
            return Err(ConfigError::WhitespaceSigil);
        }

        if !(0.0..=24.0).contains(&self.fly_to_zoom) {
            return Err(ConfigError::OutOfRange {
                field: "fly_to_zoom",
                detail: format!("expected 0..=24, got {}", self.fly_to_zoom),
            });
        }

        let [min_lng, min_lat, max_lng, max_lat] = self.region.bbox;
        if min_lng >= max_lng || min_lat >= max_lat {
            return Err(ConfigError::OutOfRange {
                field: "region.bbox",
                detail: format!(
                    "{:?} is not a [min_lng, min_lat, max_lng, max_lat] box",
                    self.region.bbox
                ),
            });
        }

        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn fly_to_duration(&self) -> Duration {
        Duration::from_millis(self.fly_to_duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config_valid() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.min_query_chars, 2);
        assert_eq!(config.page_size, 5);
        assert_eq!(config.directory_sigil, '@');
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = SearchConfig {
            page_size: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::Zero { field: "page_size" })
        );
    }

    #[test]
    fn test_whitespace_sigil_rejected() {
        let config = SearchConfig {
            directory_sigil: ' ',
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::WhitespaceSigil));
    }

    #[test]
    fn test_inverted_bbox_rejected() {
        let mut config = SearchConfig::default();
        config.region.bbox = [-89.0, 43.0, -97.0, 49.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: SearchConfig = serde_json::from_value(serde_json::json!({
            "debounce_ms": 150,
            "region": { "name": "Wisconsin", "code": "US-WI" }
        }))
        .unwrap();
        assert_eq!(config.debounce_ms, 150);
        assert_eq!(config.page_size, 5);
        assert_eq!(config.region.name, "Wisconsin");
        assert_eq!(config.region.country, "us");
    }

    #[test]
    fn test_region_contains() {
        let region = RegionBias::default();
        assert!(region.contains(Coordinates {
            lat: 44.97,
            lng: -93.26
        }));
        assert!(!region.contains(Coordinates {
            lat: 40.71,
            lng: -74.0
        }));
    }
}
