use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use readagain_core::CatalogConfig;

use crate::covers::CoverLookup;
use crate::error::{CatalogError, Result};
use crate::http::{DiskCache, RateLimitedClient};
use crate::types::{BookSearchResult, CoverMatch, ImageLinks, IndustryIdentifier};

const USER_AGENT: &str = concat!("readagain/", env!("CARGO_PKG_VERSION"));

// ─── Wire format ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumesResponse {
    #[serde(default)]
    items: Option<Vec<Volume>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    id: String,
    #[serde(default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    authors: Option<Vec<String>>,
    published_date: Option<String>,
    description: Option<String>,
    image_links: Option<ImageLinks>,
    industry_identifiers: Option<Vec<IndustryIdentifier>>,
    page_count: Option<u32>,
    categories: Option<Vec<String>>,
    publisher: Option<String>,
}

impl From<Volume> for BookSearchResult {
    fn from(v: Volume) -> Self {
        let info = v.volume_info;
        Self {
            id: v.id,
            title: info
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Unknown Title".to_string()),
            authors: info
                .authors
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| vec!["Unknown Author".to_string()]),
            published_date: info.published_date,
            description: info.description,
            image_links: info.image_links,
            industry_identifiers: info.industry_identifiers.unwrap_or_default(),
            page_count: info.page_count,
            categories: info.categories.unwrap_or_default(),
            publisher: info.publisher,
        }
    }
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Client for the Google Books volumes API.
pub struct GoogleBooksClient {
    client: RateLimitedClient,
    cache: Option<DiskCache>,
    base_url: String,
    api_key: Option<String>,
    max_results: u32,
}

#[derive(Serialize, Deserialize)]
struct CachedSearch(Vec<BookSearchResult>);

impl GoogleBooksClient {
    /// Build from config. The key is read from the configured env var.
    pub fn from_config(config: &CatalogConfig, cache_dir: Option<PathBuf>) -> Result<Self> {
        let mut client = Self::with_params(
            &config.base_url,
            config.api_key(),
            Duration::from_millis(config.min_interval_ms),
            config.max_retries,
            cache_dir.map(|dir| DiskCache::new(dir, Duration::from_secs(config.cache_ttl_secs))),
        )?;
        client.max_results = config.max_results;
        Ok(client)
    }

    pub fn with_params(
        base_url: &str,
        api_key: Option<String>,
        min_interval: Duration,
        max_retries: u32,
        cache: Option<DiskCache>,
    ) -> Result<Self> {
        Ok(Self {
            client: RateLimitedClient::new(min_interval, max_retries, USER_AGENT)?,
            cache,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            max_results: 10,
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn default_max_results(&self) -> u32 {
        self.max_results
    }

    fn base(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| CatalogError::Parse(format!("invalid URL {}: {e}", self.base_url)))
    }

    /// Free-text search. Without an API key this logs a warning and
    /// returns no results.
    ///
    /// The query is trimmed and lowercased before it is sent, and the same
    /// form keys the cache.
    pub async fn search(&self, query: &str, max_results: u32) -> Result<Vec<BookSearchResult>> {
        let Some(key) = self.api_key.as_deref() else {
            warn!("Google Books API key not found");
            return Ok(Vec::new());
        };

        let query = normalize_query(query);
        let cache_key = format!("search:{max_results}:{query}");
        if let Some(cache) = &self.cache {
            if let Some(CachedSearch(hits)) = cache.get::<CachedSearch>(&cache_key).await {
                debug!(%query, "catalog cache hit");
                return Ok(hits);
            }
        }

        let mut url = self.base()?;
        url.query_pairs_mut()
            .append_pair("q", &query)
            .append_pair("maxResults", &max_results.to_string())
            .append_pair("key", key);

        let response: VolumesResponse = self.client.get_json(url.as_str()).await?;
        let hits: Vec<BookSearchResult> = response
            .items
            .unwrap_or_default()
            .into_iter()
            .map(BookSearchResult::from)
            .collect();

        if let Some(cache) = &self.cache {
            cache.set(&cache_key, &CachedSearch(hits.clone())).await;
        }
        Ok(hits)
    }

    /// First match for an ISBN, if any.
    pub async fn get_by_isbn(&self, isbn: &str) -> Result<Option<BookSearchResult>> {
        let hits = self.search(&format!("isbn:{isbn}"), 1).await?;
        Ok(hits.into_iter().next())
    }

    /// Look a volume up by its catalog id.
    pub async fn get_by_id(&self, volume_id: &str) -> Result<Option<BookSearchResult>> {
        let Some(key) = self.api_key.as_deref() else {
            warn!("Google Books API key not found");
            return Ok(None);
        };

        let mut url = self.base()?;
        url.path_segments_mut()
            .map_err(|_| CatalogError::Parse("invalid catalog base URL".to_string()))?
            .pop_if_empty()
            .push(volume_id);
        url.query_pairs_mut().append_pair("key", key);

        let volume: Volume = self.client.get_json(url.as_str()).await?;
        Ok(Some(volume.into()))
    }
}

fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

#[async_trait]
impl CoverLookup for GoogleBooksClient {
    async fn best_match(&self, query: &str) -> Result<Option<CoverMatch>> {
        let hits = self.search(query, 1).await?;
        Ok(hits.into_iter().next().map(|hit| CoverMatch {
            image_url: hit
                .image_links
                .as_ref()
                .and_then(ImageLinks::cover)
                .map(ToOwned::to_owned),
            catalog_id: hit.id,
        }))
    }
}
