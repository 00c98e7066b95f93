use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ReadAgainError, Result};

/// Root application configuration, loaded from `~/.config/readagain/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub core: CoreConfig,
    pub recommendations: RecommendationConfig,
    pub cache: CacheConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub data_dir: String,
    pub default_child: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub default_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub history_ttl_secs: u64,
}

/// Settings for the book catalog collaborator (Google Books volumes API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub api_key_env: String,
    pub max_results: u32,
    pub min_interval_ms: u64,
    pub max_retries: u32,
    pub cache_ttl_secs: u64,
    pub placeholder_base: String,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("readagain");

        Self {
            data_dir: data_dir.to_string_lossy().to_string(),
            default_child: "nile".to_string(),
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self { default_limit: 4 }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            history_ttl_secs: 300,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.googleapis.com/books/v1/volumes".to_string(),
            api_key_env: "GOOGLE_BOOKS_API_KEY".to_string(),
            max_results: 10,
            min_interval_ms: 100,
            max_retries: 3,
            cache_ttl_secs: 24 * 60 * 60,
            placeholder_base: "/api/placeholder".to_string(),
        }
    }
}

impl CacheConfig {
    /// `history_ttl_secs` as a chrono duration.
    pub fn history_ttl(&self) -> Result<chrono::Duration> {
        i64::try_from(self.history_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .ok_or_else(|| {
                ReadAgainError::ConfigError(format!(
                    "cache.history_ttl_secs is too large: {}",
                    self.history_ttl_secs
                ))
            })
    }
}

impl CatalogConfig {
    /// Variable consulted when `api_key_env` is unset.
    pub const FALLBACK_API_KEY_ENV: &'static str = "NEXT_PUBLIC_GOOGLE_BOOKS_API_KEY";

    /// Resolve the catalog API key from the environment.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .or_else(|_| std::env::var(Self::FALLBACK_API_KEY_ENV))
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config file path: `~/.config/readagain/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("READAGAIN_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("readagain")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the standard path.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        self.save_to(&path)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn set_data_dir(&mut self, path: PathBuf) {
        self.core.data_dir = path.to_string_lossy().to_string();
    }

    // ─── Derived paths ─────────────────────────────────────

    /// Directory holding one JSON document per child.
    pub fn history_dir(&self) -> PathBuf {
        PathBuf::from(&self.core.data_dir).join("children")
    }

    /// Directory for cached catalog responses.
    pub fn catalog_cache_dir(&self) -> PathBuf {
        PathBuf::from(&self.core.data_dir)
            .join("cache")
            .join("catalog")
    }
}
