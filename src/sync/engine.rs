//! Reconciliation of the local snapshot against a Discogs collection.
//!
//! ## Modes
//!
//! - [`MergeMode::FullSync`]: walk the remote folder, insert unseen releases
//!   and refresh metadata and prices of known ones.
//! - [`MergeMode::InsertOnly`]: walk the remote folder, insert unseen
//!   releases, leave known ones alone.
//! - [`MergeMode::PriceRefreshOnly`]: no folder walk; refresh price data of
//!   every Discogs-linked record already in the snapshot.
//!
//! User-owned fields (conditions, purchase data, storage location, tags,
//! notes) are never written for an existing record. Records without a
//! release id, or no longer in the remote folder, are kept as they are.
//! Existing records keep their position; inserts are appended in remote
//! order.

use super::progress::{Progress, ProgressSink};
use crate::collection::mapping::{clean_artist_name, new_record, PriceUpdate, ReleaseMetadata};
use crate::collection::{CollectionRecord, SnapshotIndex, SnapshotStore, StoreError};
use crate::discogs::{CatalogSource, Clock, CollectionItem, DiscogsError, Release};
use clap::ValueEnum;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeMode {
    #[default]
    FullSync,
    InsertOnly,
    PriceRefreshOnly,
}

#[derive(Debug, Clone)]
pub struct ReconcilerSettings {
    /// Page size requested from the collection listing.
    pub per_page: u32,
    /// Save the working snapshot after this many inserted or updated records.
    pub checkpoint_interval: usize,
}

impl Default for ReconcilerSettings {
    fn default() -> Self {
        Self {
            per_page: 100,
            checkpoint_interval: 10,
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// Without page data the run cannot continue.
    #[error("Failed to fetch collection page {page}: {source}")]
    Pagination {
        page: u32,
        #[source]
        source: DiscogsError,
    },

    #[error("Failed to persist snapshot: {0}")]
    Store(#[from] StoreError),
}

/// Per-run counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Items the run expected to visit.
    pub total: usize,
    pub processed: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Visited and merged, but already up to date.
    pub unchanged: usize,
    /// Deliberately not merged (already present, no release id, no price).
    pub skipped: usize,
    pub failed: usize,
}

impl ReconcileReport {
    pub fn succeeded(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }
}

#[derive(Debug)]
pub struct ReconcileOutcome {
    pub records: Vec<CollectionRecord>,
    pub report: ReconcileReport,
}

/// State of one reconciliation run.
struct Run {
    records: Vec<CollectionRecord>,
    index: SnapshotIndex,
    ids: HashSet<String>,
    report: ReconcileReport,
    changes_since_checkpoint: usize,
}

impl Run {
    fn start(records: Vec<CollectionRecord>) -> Self {
        let index = SnapshotIndex::build(&records);
        let ids = records.iter().map(|r| r.id.clone()).collect();
        Self {
            records,
            index,
            ids,
            report: ReconcileReport::default(),
            changes_since_checkpoint: 0,
        }
    }

    fn fresh_id(&mut self) -> String {
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if self.ids.insert(id.clone()) {
                return id;
            }
        }
    }

    fn insert(&mut self, release_id: u64, record: CollectionRecord) {
        self.index.insert(release_id, self.records.len());
        self.records.push(record);
        self.report.inserted += 1;
        self.changes_since_checkpoint += 1;
    }

    fn mark_updated(&mut self, changed: bool) {
        if changed {
            self.report.updated += 1;
            self.changes_since_checkpoint += 1;
        } else {
            self.report.unchanged += 1;
        }
    }

    fn checkpoint(&mut self, store: &dyn SnapshotStore, interval: usize) -> Result<(), StoreError> {
        if interval == 0 || self.changes_since_checkpoint < interval {
            return Ok(());
        }
        store.save(&self.records)?;
        info!(
            "Progress saved ({} records, {}/{} processed)",
            self.records.len(),
            self.report.processed,
            self.report.total
        );
        self.changes_since_checkpoint = 0;
        Ok(())
    }
}

/// Drives a sync between a [`CatalogSource`] and a [`SnapshotStore`].
pub struct Reconciler {
    source: Arc<dyn CatalogSource>,
    store: Arc<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    settings: ReconcilerSettings,
}

impl Reconciler {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        store: Arc<dyn SnapshotStore>,
        clock: Arc<dyn Clock>,
        settings: ReconcilerSettings,
    ) -> Self {
        Self {
            source,
            store,
            clock,
            settings,
        }
    }

    /// Run one sync and persist the result.
    ///
    /// Per-item failures are logged and counted; only a failed page fetch or
    /// a failed save aborts the run. In that case the snapshot holds the
    /// last checkpoint.
    pub async fn reconcile(
        &self,
        username: &str,
        folder_id: u64,
        mode: MergeMode,
        progress: &dyn ProgressSink,
    ) -> Result<ReconcileOutcome, SyncError> {
        let mut run = Run::start(self.store.load());
        info!(
            "Starting {:?} with {} existing records ({} linked to Discogs)",
            mode,
            run.records.len(),
            run.index.len()
        );

        match mode {
            MergeMode::PriceRefreshOnly => self.refresh_prices(&mut run, progress).await?,
            MergeMode::FullSync | MergeMode::InsertOnly => {
                self.merge_folder(&mut run, username, folder_id, mode, progress)
                    .await?
            }
        }

        self.store.save(&run.records)?;

        let report = run.report;
        info!(
            "Sync complete: {} processed, {} inserted, {} updated, {} unchanged, {} skipped, {} failed",
            report.processed,
            report.inserted,
            report.updated,
            report.unchanged,
            report.skipped,
            report.failed
        );

        Ok(ReconcileOutcome {
            records: run.records,
            report,
        })
    }

    async fn merge_folder(
        &self,
        run: &mut Run,
        username: &str,
        folder_id: u64,
        mode: MergeMode,
        progress: &dyn ProgressSink,
    ) -> Result<(), SyncError> {
        let mut page = 1u32;

        loop {
            let listing = self
                .source
                .collection_page(username, folder_id, page, self.settings.per_page)
                .await
                .map_err(|source| SyncError::Pagination { page, source })?;

            run.report.total = listing.pagination.items as usize;
            debug!(
                "Fetched page {}/{} ({} releases)",
                listing.pagination.page,
                listing.pagination.pages,
                listing.releases.len()
            );

            for item in &listing.releases {
                run.report.processed += 1;
                let label = format!(
                    "{} - {}",
                    clean_artist_name(item.primary_artist_name()),
                    item.basic_information.title
                );

                self.merge_item(run, item, mode, &label).await;
                progress.report(&Progress {
                    current: run.report.processed,
                    total: run.report.total,
                    label: &label,
                });
                run.checkpoint(self.store.as_ref(), self.settings.checkpoint_interval)?;
            }

            if !listing.pagination.has_more() || listing.releases.is_empty() {
                break;
            }
            page += 1;
        }

        Ok(())
    }

    async fn merge_item(&self, run: &mut Run, item: &CollectionItem, mode: MergeMode, label: &str) {
        let release_id = item.release_id();

        if mode == MergeMode::InsertOnly && run.index.contains(release_id) {
            debug!("Already in collection: {} ({})", label, release_id);
            run.report.skipped += 1;
            return;
        }

        let release = match self.source.release(release_id).await {
            Ok(release) => release,
            Err(e) => {
                warn!("Skipping {} (release {}): {}", label, release_id, e);
                run.report.failed += 1;
                return;
            }
        };

        let price = match self.source.marketplace_stats(release_id).await {
            Ok(stats) => stats.as_ref().and_then(PriceUpdate::from_stats),
            Err(e) => {
                warn!("No price data for {} (release {}): {}", label, release_id, e);
                None
            }
        };

        let now = self.clock.now().to_rfc3339();
        match run.index.get(release_id) {
            Some(position) => {
                let changed = refresh_record(&mut run.records[position], &release, price.as_ref(), &now);
                run.mark_updated(changed);
            }
            None => {
                let id = run.fresh_id();
                let record = new_record(id, &release, Some(item), price.as_ref(), &now);
                debug!("New record {} for {}", record.id, label);
                run.insert(release_id, record);
            }
        }
    }

    async fn refresh_prices(&self, run: &mut Run, progress: &dyn ProgressSink) -> Result<(), SyncError> {
        run.report.total = run.records.len();

        for position in 0..run.records.len() {
            run.report.processed += 1;
            let label = run.records[position].display_label();

            self.refresh_item(run, position, &label).await;
            progress.report(&Progress {
                current: run.report.processed,
                total: run.report.total,
                label: &label,
            });
            run.checkpoint(self.store.as_ref(), self.settings.checkpoint_interval)?;
        }

        Ok(())
    }

    async fn refresh_item(&self, run: &mut Run, position: usize, label: &str) {
        let Some(release_id) = run.records[position].discogs_release_id else {
            debug!("No Discogs id, skipping {}", label);
            run.report.skipped += 1;
            return;
        };

        let update = match self.source.marketplace_stats(release_id).await {
            Ok(stats) => stats.as_ref().and_then(PriceUpdate::from_stats),
            Err(e) => {
                warn!("Price refresh failed for {} (release {}): {}", label, release_id, e);
                run.report.failed += 1;
                return;
            }
        };

        let Some(update) = update else {
            debug!("No market data for {}", label);
            run.report.skipped += 1;
            return;
        };

        let now = self.clock.now().to_rfc3339();
        let record = &mut run.records[position];
        let changed = update.apply_to(record, &now);
        if changed {
            record.updated_at = now;
        }
        run.mark_updated(changed);
    }
}

/// Refresh the Discogs-owned fields of an existing record. Returns whether
/// anything changed; an unchanged record is left byte-identical.
fn refresh_record(
    record: &mut CollectionRecord,
    release: &Release,
    price: Option<&PriceUpdate>,
    now: &str,
) -> bool {
    let mut changed = ReleaseMetadata::from_release(release).apply_to(record);

    match price {
        Some(price) => changed |= price.apply_to(record, now),
        None => {
            let before = (record.gain_loss, record.gain_loss_percentage);
            record.recompute_gain_loss();
            changed |= before != (record.gain_loss, record.gain_loss_percentage);
        }
    }

    if changed {
        record.updated_at = now.to_string();
        record.last_synced_with_discogs = Some(now.to_string());
    }
    changed
}
