use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vinyl_sync::collection::{CollectionSummary, JsonSnapshotStore};
use vinyl_sync::config::{AppConfig, CliConfig, EnvConfig, FileConfig};
use vinyl_sync::discogs::{CatalogSource, DiscogsClient, MemoryCache, SystemClock};
use vinyl_sync::sync::{
    LogProgress, MergeMode, Progress, ProgressSink, ReconcileReport, Reconciler,
};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    if path_buf.is_absolute() {
        return Ok(path_buf);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(path_buf))
}

/// Sync a local vinyl collection snapshot with a Discogs collection.
///
/// The Discogs token is read from DISCOGS_TOKEN; the username and folder may
/// also come from DISCOGS_USERNAME and DISCOGS_FOLDER_ID.
#[derive(Parser, Debug)]
#[clap(version)]
struct CliArgs {
    /// Path to the JSON collection snapshot. Created if missing.
    #[clap(value_parser = parse_path)]
    pub snapshot_path: Option<PathBuf>,

    /// What to reconcile.
    #[clap(long, value_enum, default_value_t = MergeMode::FullSync)]
    pub mode: MergeMode,

    /// Discogs username owning the collection.
    #[clap(long)]
    pub username: Option<String>,

    /// Collection folder to walk. 0 is the "All" folder.
    #[clap(long)]
    pub folder_id: Option<u64>,

    /// Path to a TOML config file. Its values override command line values.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Discogs API base URL.
    #[clap(long)]
    pub base_url: Option<String>,

    /// Releases requested per collection page (max 100).
    #[clap(long, default_value_t = 100)]
    pub per_page: u32,

    /// Save progress after this many inserted or updated records.
    #[clap(long, default_value_t = 10)]
    pub checkpoint_interval: usize,

    /// Timeout in seconds for each Discogs request.
    #[clap(long, default_value_t = 30)]
    pub request_timeout_sec: u64,

    /// Don't draw a progress bar, log progress instead.
    #[clap(long)]
    pub no_progress: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            snapshot_path: self.snapshot_path.clone(),
            username: self.username.clone(),
            folder_id: self.folder_id,
            mode: self.mode,
            per_page: self.per_page,
            checkpoint_interval: self.checkpoint_interval,
            base_url: self.base_url.clone(),
            request_timeout_secs: self.request_timeout_sec,
        }
    }
}

/// Terminal progress bar fed by the reconciler.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Result<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .context("Invalid progress bar template")?
                .progress_chars("=> "),
        );
        Ok(Self { bar })
    }
}

impl ProgressSink for BarProgress {
    fn report(&self, progress: &Progress<'_>) {
        self.bar.set_length(progress.total as u64);
        self.bar.set_position(progress.current as u64);
        self.bar.set_message(progress.label.to_string());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    info!(
        "vinyl-sync {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config, &EnvConfig::from_env())?;

    let cache = Arc::new(MemoryCache::new(config.cache_ttl.clone(), SystemClock));
    let mut client = DiscogsClient::new(config.client.clone(), cache)?;
    client.authenticate(config.token.clone(), config.username.clone());
    info!("Using Discogs API at {}", client.base_url());

    let user = client
        .get_user(&config.username)
        .await
        .with_context(|| format!("Failed to verify Discogs user {}", config.username))?;
    info!(
        "Authenticated as {} ({} releases in collection)",
        user.username, user.num_collection
    );

    if config.mode != MergeMode::PriceRefreshOnly {
        let folders = client
            .get_collection_folders(&config.username)
            .await
            .context("Failed to list collection folders")?;
        match folders.iter().find(|f| f.id == config.folder_id) {
            Some(folder) => info!(
                "Syncing folder \"{}\" ({} releases)",
                folder.name, folder.count
            ),
            None => bail!(
                "Folder {} not found for user {}",
                config.folder_id,
                config.username
            ),
        }
    }

    let client = Arc::new(client);
    let store = Arc::new(JsonSnapshotStore::new(&config.snapshot_path));
    info!("Using collection snapshot at {:?}", store.path());

    let reconciler = Reconciler::new(
        client.clone() as Arc<dyn CatalogSource>,
        store,
        Arc::new(SystemClock),
        config.reconciler.clone(),
    );

    let bar = if cli_args.no_progress {
        None
    } else {
        Some(BarProgress::new()?)
    };
    let progress: &dyn ProgressSink = match &bar {
        Some(bar) => bar,
        None => &LogProgress,
    };
    let result = reconciler
        .reconcile(&config.username, config.folder_id, config.mode, progress)
        .await;
    if let Some(bar) = &bar {
        bar.bar.finish_and_clear();
    }
    let outcome = result.context("Sync aborted, snapshot holds the last checkpoint")?;

    print_report(&outcome.report);
    print_summary(&CollectionSummary::compute(&outcome.records));

    match client.get_collection_value(&config.username).await {
        Ok(value) => println!(
            "Discogs collection value: min {}, median {}, max {}",
            value.minimum, value.median, value.maximum
        ),
        Err(e) => warn!("Could not fetch collection value: {}", e),
    }

    let rate_limit = client.rate_limit_status();
    info!(
        "Rate limit at exit: {}/{} remaining",
        rate_limit.remaining, rate_limit.limit
    );

    Ok(())
}

fn print_report(report: &ReconcileReport) {
    println!();
    println!("Sync report");
    println!("  processed: {}/{}", report.processed, report.total);
    println!("  inserted:  {}", report.inserted);
    println!("  updated:   {}", report.updated);
    println!("  unchanged: {}", report.unchanged);
    println!("  skipped:   {}", report.skipped);
    println!("  failed:    {}", report.failed);
}

fn print_summary(summary: &CollectionSummary) {
    println!();
    println!("Collection summary");
    println!("  records:        {}", summary.total_records);
    println!("  with price:     {}", summary.with_price);
    println!("  with cover art: {}", summary.with_cover_art);
    println!(
        "  distinct:       {} artists, {} labels, {} genres",
        summary.distinct_artists, summary.distinct_labels, summary.distinct_genres
    );
    println!("  total value:    {:.2}", summary.total_estimated_value);
    if let Some(average) = summary.average_estimated_value {
        println!("  average value:  {:.2}", average);
    }
    if let Some(top) = &summary.highest_valued {
        println!("  most valuable:  {} ({:.2})", top.label, top.amount);
    }
    if summary.total_invested > 0.0 {
        println!("  invested:       {:.2}", summary.total_invested);
        match summary.total_gain_loss_percentage {
            Some(pct) => println!(
                "  gain/loss:      {:+.2} ({:+.1}%)",
                summary.total_gain_loss, pct
            ),
            None => println!("  gain/loss:      {:+.2}", summary.total_gain_loss),
        }
    }
    if let Some(gainer) = &summary.biggest_gainer {
        println!("  biggest gainer: {} ({:+.2})", gainer.label, gainer.amount);
    }
    if let Some(loser) = &summary.biggest_loser {
        println!("  biggest loser:  {} ({:+.2})", loser.label, loser.amount);
    }
}
