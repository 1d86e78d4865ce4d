use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub snapshot_path: Option<String>,
    pub username: Option<String>,
    pub folder_id: Option<u64>,
    pub mode: Option<String>,
    pub per_page: Option<u32>,
    pub checkpoint_interval: Option<usize>,

    // Discogs API
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
    pub request_timeout_secs: Option<u64>,

    // Feature configs
    pub rate_limit: Option<RateLimitConfig>,
    pub cache: Option<CacheConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RateLimitConfig {
    pub unauthenticated_limit: Option<u32>,
    pub authenticated_limit: Option<u32>,
    pub low_water_mark: Option<u32>,
    pub window_secs: Option<u64>,
    pub min_interval_ms: Option<u64>,
    pub cooldown_secs: Option<u64>,
    pub server_backoff_ms: Option<u64>,
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CacheConfig {
    /// Release, master and user profile payloads.
    pub metadata_ttl_hours: Option<i64>,
    /// Marketplace stats and price suggestions.
    pub price_ttl_hours: Option<i64>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
