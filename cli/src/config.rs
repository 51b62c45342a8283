//! `pinmap.toml` loading and environment overrides.

use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use pinmap_search_core::SearchConfig;
use pinmap_search_core::Viewer;
use pinmap_search_sources::SourcesConfig;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "pinmap.toml";

pub const ENV_GEOCODING_TOKEN: &str = "PINMAP_GEOCODING_TOKEN";
pub const ENV_BACKEND_URL: &str = "PINMAP_BACKEND_URL";
pub const ENV_BACKEND_API_KEY: &str = "PINMAP_BACKEND_API_KEY";
pub const ENV_VIEWER_TOKEN: &str = "PINMAP_VIEWER_TOKEN";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub sources: SourcesConfig,

    /// Signed-in identity used for directory searches.
    #[serde(default)]
    pub viewer: Option<ViewerConfig>,
}

#[derive(Clone, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,

    #[serde(default)]
    pub access_token: String,

    #[serde(default = "default_discoverable")]
    pub discoverable: bool,
}

impl std::fmt::Debug for ViewerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewerConfig")
            .field("user_id", &self.user_id)
            .field("has_token", &!self.access_token.is_empty())
            .field("discoverable", &self.discoverable)
            .finish()
    }
}

fn default_user_id() -> String {
    "local".to_string()
}

fn default_discoverable() -> bool {
    true
}

impl AppConfig {
    /// Reads `path`, or `./pinmap.toml` when it exists, then applies
    /// `PINMAP_*` overrides from the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
        };
        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| var(key).filter(|value| !value.trim().is_empty());

        if let Some(token) = var(ENV_GEOCODING_TOKEN) {
            self.sources.geocoding_token = Some(token);
        }
        if let Some(url) = var(ENV_BACKEND_URL) {
            self.sources.backend_url = url;
        }
        if let Some(key) = var(ENV_BACKEND_API_KEY) {
            self.sources.backend_api_key = key;
        }
        if let Some(token) = var(ENV_VIEWER_TOKEN) {
            let viewer = self.viewer.get_or_insert_with(|| ViewerConfig {
                user_id: default_user_id(),
                access_token: String::new(),
                discoverable: default_discoverable(),
            });
            viewer.access_token = token;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.search.validate().context("invalid [search] config")?;
        self.sources.validate().context("invalid [sources] config")?;
        Ok(())
    }

    /// The signed-in viewer, if one is configured with a token.
    pub fn viewer(&self) -> Option<Viewer> {
        self.viewer
            .as_ref()
            .filter(|viewer| !viewer.access_token.is_empty())
            .map(|viewer| Viewer {
                user_id: viewer.user_id.clone(),
                access_token: viewer.access_token.clone(),
                discoverable: viewer.discoverable,
            })
    }
}
