//! HTTP client for the Discogs REST API.

use super::cache::{CacheKey, CacheKind, ResponseCache};
use super::error::{DiscogsError, TransportError};
use super::gate::{GateResponse, GateSettings, RateLimitStatus, RequestGate};
use super::models::{
    CollectionFolder, CollectionPage, CollectionValue, DiscogsUser, FoldersResponse,
    ListingsResponse, MarketplaceListing, MarketplaceStats, MasterRelease, PriceSuggestions,
    Release,
};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DISCOGS_API_BASE: &str = "https://api.discogs.com";
pub const DEFAULT_USER_AGENT: &str = concat!("vinyl-sync/", env!("CARGO_PKG_VERSION"));

/// Everything needed to build a [`DiscogsClient`].
#[derive(Debug, Clone)]
pub struct DiscogsClientConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub gate: GateSettings,
}

impl Default for DiscogsClientConfig {
    fn default() -> Self {
        Self {
            base_url: DISCOGS_API_BASE.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(30),
            gate: GateSettings::default(),
        }
    }
}

/// The remote operations the reconciliation engine depends on.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// One page of a user's collection folder.
    async fn collection_page(
        &self,
        username: &str,
        folder_id: u64,
        page: u32,
        per_page: u32,
    ) -> Result<CollectionPage, DiscogsError>;

    /// Full release detail.
    async fn release(&self, release_id: u64) -> Result<Release, DiscogsError>;

    /// Current marketplace statistics, `None` when Discogs has none.
    async fn marketplace_stats(
        &self,
        release_id: u64,
    ) -> Result<Option<MarketplaceStats>, DiscogsError>;
}

/// Discogs API client.
///
/// All requests go through a [`RequestGate`]; release/master detail and
/// price data are served from the injected cache while fresh.
pub struct DiscogsClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    username: Option<String>,
    gate: RequestGate,
    cache: Arc<dyn ResponseCache>,
}

impl DiscogsClient {
    pub fn new(config: DiscogsClientConfig, cache: Arc<dyn ResponseCache>) -> Result<Self, DiscogsError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| DiscogsError::InvalidConfig(format!("Failed to create HTTP client: {}", e)))?;

        // Ensure base_url doesn't have trailing slash
        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            http,
            base_url,
            token: None,
            username: None,
            gate: RequestGate::new(config.gate),
            cache,
        })
    }

    /// Attach a personal access token. Authenticated clients get a larger
    /// request budget.
    pub fn authenticate(&mut self, token: impl Into<String>, username: impl Into<String>) {
        self.token = Some(token.into());
        self.username = Some(username.into());
        self.gate.use_authenticated_limit();
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn rate_limit_status(&self) -> RateLimitStatus {
        self.gate.rate_limit_status()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    // =========================================================================
    // Users and collection
    // =========================================================================

    pub async fn get_user(&self, username: &str) -> Result<DiscogsUser, DiscogsError> {
        let path = format!("/users/{}", urlencoding::encode(username));
        self.get_cached(CacheKey::new(CacheKind::User, username), &path)
            .await
    }

    pub async fn get_collection_folders(
        &self,
        username: &str,
    ) -> Result<Vec<CollectionFolder>, DiscogsError> {
        let path = format!("/users/{}/collection/folders", urlencoding::encode(username));
        let response: FoldersResponse = self.get_json(&path, &[]).await?;
        Ok(response.folders)
    }

    /// One page of a folder, most recently added first.
    pub async fn get_collection_releases(
        &self,
        username: &str,
        folder_id: u64,
        page: u32,
        per_page: u32,
    ) -> Result<CollectionPage, DiscogsError> {
        let path = format!(
            "/users/{}/collection/folders/{}/releases",
            urlencoding::encode(username),
            folder_id
        );
        let query = [
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
            ("sort", "added".to_string()),
            ("sort_order", "desc".to_string()),
        ];
        self.get_json(&path, &query).await
    }

    pub async fn get_collection_value(
        &self,
        username: &str,
    ) -> Result<CollectionValue, DiscogsError> {
        let path = format!("/users/{}/collection/value", urlencoding::encode(username));
        self.get_json(&path, &[]).await
    }

    // =========================================================================
    // Database
    // =========================================================================

    pub async fn get_release(&self, release_id: u64) -> Result<Release, DiscogsError> {
        let path = format!("/releases/{}", release_id);
        self.get_cached(CacheKey::new(CacheKind::Release, release_id), &path)
            .await
    }

    pub async fn get_master(&self, master_id: u64) -> Result<MasterRelease, DiscogsError> {
        let path = format!("/masters/{}", master_id);
        self.get_cached(CacheKey::new(CacheKind::Master, master_id), &path)
            .await
    }

    // =========================================================================
    // Marketplace
    // =========================================================================

    /// Suggested prices per condition. `None` when Discogs has no suggestion
    /// for this release.
    pub async fn get_price_suggestions(
        &self,
        release_id: u64,
    ) -> Result<Option<PriceSuggestions>, DiscogsError> {
        let path = format!("/marketplace/price_suggestions/{}", release_id);
        self.get_cached_optional(
            CacheKey::new(CacheKind::PriceSuggestions, release_id),
            &path,
        )
        .await
    }

    /// Lowest asking price and listing count. `None` when Discogs has no
    /// marketplace data for this release.
    pub async fn get_marketplace_stats(
        &self,
        release_id: u64,
    ) -> Result<Option<MarketplaceStats>, DiscogsError> {
        let path = format!("/marketplace/stats/{}", release_id);
        self.get_cached_optional(
            CacheKey::new(CacheKind::MarketplaceStats, release_id),
            &path,
        )
        .await
    }

    pub async fn get_marketplace_listings(
        &self,
        release_id: u64,
    ) -> Result<Vec<MarketplaceListing>, DiscogsError> {
        let query = [("release_id", release_id.to_string())];
        let response: ListingsResponse = self.get_json("/marketplace/listings", &query).await?;
        Ok(response.listings)
    }

    // =========================================================================
    // Plumbing
    // =========================================================================

    async fn get_cached<T: DeserializeOwned>(
        &self,
        key: CacheKey,
        path: &str,
    ) -> Result<T, DiscogsError> {
        if let Some(value) = self.cache.get(&key) {
            match serde_json::from_value(value) {
                Ok(decoded) => {
                    debug!("Cache hit for {}", key);
                    return Ok(decoded);
                }
                Err(e) => debug!("Ignoring undecodable cache entry {}: {}", key, e),
            }
        }

        let value: serde_json::Value = self.get_json(path, &[]).await?;
        let decoded = decode_value(value.clone())?;
        self.cache.set(key, value);
        Ok(decoded)
    }

    async fn get_cached_optional<T: DeserializeOwned>(
        &self,
        key: CacheKey,
        path: &str,
    ) -> Result<Option<T>, DiscogsError> {
        match self.get_cached(key, path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, DiscogsError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.gate.execute(|| self.send(&url, query)).await?;
        serde_json::from_str(&response.body)
            .map_err(|e| DiscogsError::Decode(format!("{}: {}", path, e)))
    }

    async fn send(&self, url: &str, query: &[(&str, String)]) -> Result<GateResponse, TransportError> {
        let mut request = self.http.get(url).query(query);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Discogs token={}", token));
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let rate_limit = RateLimitStatus::from_headers(response.headers());
        let body = response.text().await?;

        Ok(GateResponse {
            status,
            rate_limit,
            body,
        })
    }
}

fn decode_value<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, DiscogsError> {
    serde_json::from_value(value).map_err(|e| DiscogsError::Decode(e.to_string()))
}

#[async_trait]
impl CatalogSource for DiscogsClient {
    async fn collection_page(
        &self,
        username: &str,
        folder_id: u64,
        page: u32,
        per_page: u32,
    ) -> Result<CollectionPage, DiscogsError> {
        self.get_collection_releases(username, folder_id, page, per_page)
            .await
    }

    async fn release(&self, release_id: u64) -> Result<Release, DiscogsError> {
        self.get_release(release_id).await
    }

    async fn marketplace_stats(
        &self,
        release_id: u64,
    ) -> Result<Option<MarketplaceStats>, DiscogsError> {
        self.get_marketplace_stats(release_id).await
    }
}
