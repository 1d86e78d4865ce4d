mod file_config;

pub use file_config::{CacheConfig, FileConfig, RateLimitConfig};

use crate::discogs::{CacheTtl, DiscogsClientConfig, GateSettings, DISCOGS_API_BASE};
use crate::sync::{MergeMode, ReconcilerSettings};
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_TOKEN: &str = "DISCOGS_TOKEN";
pub const ENV_USERNAME: &str = "DISCOGS_USERNAME";
pub const ENV_FOLDER_ID: &str = "DISCOGS_FOLDER_ID";

/// Discogs caps `per_page` at this value.
const MAX_PER_PAGE: u32 = 100;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub snapshot_path: Option<PathBuf>,
    pub username: Option<String>,
    pub folder_id: Option<u64>,
    pub mode: MergeMode,
    pub per_page: u32,
    pub checkpoint_interval: usize,
    pub base_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            username: None,
            folder_id: None,
            mode: MergeMode::default(),
            per_page: 100,
            checkpoint_interval: 10,
            base_url: None,
            request_timeout_secs: 30,
        }
    }
}

/// Values taken from the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub token: Option<String>,
    pub username: Option<String>,
    pub folder_id: Option<String>,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        let read = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Self {
            token: read(ENV_TOKEN),
            username: read(ENV_USERNAME),
            folder_id: read(ENV_FOLDER_ID),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub snapshot_path: PathBuf,
    pub token: String,
    pub username: String,
    pub folder_id: u64,
    pub mode: MergeMode,

    pub client: DiscogsClientConfig,
    pub cache_ttl: CacheTtl,
    pub reconciler: ReconcilerSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments, optional TOML file config
    /// and the environment. TOML values override CLI values where present;
    /// the environment fills whatever both leave unset. The token only ever
    /// comes from the environment.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>, env: &EnvConfig) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let token = env
            .token
            .clone()
            .ok_or_else(|| anyhow::anyhow!("{} must be set", ENV_TOKEN))?;

        let username = file
            .username
            .or_else(|| cli.username.clone())
            .or_else(|| env.username.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("username must be specified via --username, config file or {}", ENV_USERNAME)
            })?;

        let snapshot_path = file
            .snapshot_path
            .map(PathBuf::from)
            .or_else(|| cli.snapshot_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("snapshot path must be specified on the command line or in config file")
            })?;
        if snapshot_path.is_dir() {
            bail!("Snapshot path is a directory: {:?}", snapshot_path);
        }

        let env_folder_id = env
            .folder_id
            .as_deref()
            .map(|v| {
                v.trim()
                    .parse::<u64>()
                    .with_context(|| format!("{} is not a folder id: {:?}", ENV_FOLDER_ID, v))
            })
            .transpose()?;
        let folder_id = file
            .folder_id
            .or(cli.folder_id)
            .or(env_folder_id)
            .unwrap_or(0);

        let mode = match file.mode {
            Some(s) => parse_mode(&s)?,
            None => cli.mode,
        };

        let per_page = file.per_page.unwrap_or(cli.per_page);
        if per_page == 0 || per_page > MAX_PER_PAGE {
            bail!("per_page must be between 1 and {}, got {}", MAX_PER_PAGE, per_page);
        }
        let checkpoint_interval = file
            .checkpoint_interval
            .unwrap_or(cli.checkpoint_interval);
        if checkpoint_interval == 0 {
            bail!("checkpoint_interval must be at least 1");
        }

        let base_url = file
            .base_url
            .or_else(|| cli.base_url.clone())
            .unwrap_or_else(|| DISCOGS_API_BASE.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            bail!("base_url must be an http(s) URL: {}", base_url);
        }

        let request_timeout_secs = file
            .request_timeout_secs
            .unwrap_or(cli.request_timeout_secs);

        // Gate settings - merge file config with defaults
        let defaults = GateSettings::default();
        let rl = file.rate_limit.unwrap_or_default();
        let gate = GateSettings {
            unauthenticated_limit: rl.unauthenticated_limit.unwrap_or(defaults.unauthenticated_limit),
            authenticated_limit: rl.authenticated_limit.unwrap_or(defaults.authenticated_limit),
            low_water_mark: rl.low_water_mark.unwrap_or(defaults.low_water_mark),
            budget_window: rl
                .window_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.budget_window),
            min_request_interval: rl
                .min_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.min_request_interval),
            rate_limit_cooldown: rl
                .cooldown_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_cooldown),
            server_error_backoff: rl
                .server_backoff_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.server_error_backoff),
            max_attempts: rl.max_attempts.unwrap_or(defaults.max_attempts),
        };
        if gate.max_attempts == 0 {
            bail!("rate_limit.max_attempts must be at least 1");
        }

        let client_defaults = DiscogsClientConfig::default();
        let client = DiscogsClientConfig {
            base_url,
            user_agent: file.user_agent.unwrap_or(client_defaults.user_agent),
            request_timeout: Duration::from_secs(request_timeout_secs),
            gate,
        };

        let ttl_defaults = CacheTtl::default();
        let cache = file.cache.unwrap_or_default();
        let cache_ttl = CacheTtl {
            metadata: ttl_hours("cache.metadata_ttl_hours", cache.metadata_ttl_hours)?
                .unwrap_or(ttl_defaults.metadata),
            prices: ttl_hours("cache.price_ttl_hours", cache.price_ttl_hours)?
                .unwrap_or(ttl_defaults.prices),
        };

        Ok(Self {
            snapshot_path,
            token,
            username,
            folder_id,
            mode,
            client,
            cache_ttl,
            reconciler: ReconcilerSettings {
                per_page,
                checkpoint_interval,
            },
        })
    }
}

fn ttl_hours(name: &str, hours: Option<i64>) -> Result<Option<chrono::TimeDelta>> {
    let Some(hours) = hours else {
        return Ok(None);
    };
    if hours <= 0 {
        bail!("{} must be positive, got {}", name, hours);
    }
    match chrono::TimeDelta::try_hours(hours) {
        Some(ttl) => Ok(Some(ttl)),
        None => bail!("{} is out of range: {}", name, hours),
    }
}

/// Parses a merge mode name. Uses clap's ValueEnum trait for parsing.
fn parse_mode(s: &str) -> Result<MergeMode> {
    MergeMode::from_str(s, true).map_err(|_| {
        anyhow::anyhow!(
            "Unknown mode {:?}, expected one of full-sync, insert-only, price-refresh-only",
            s
        )
    })
}
