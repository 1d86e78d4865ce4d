//! Progress reporting hook for long-running syncs.

use tracing::info;

/// Position of the engine within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress<'a> {
    /// 1-based index of the item just handled.
    pub current: usize,
    /// Total number of items the run expects to visit.
    pub total: usize,
    /// "Artist - Title" of that item.
    pub label: &'a str,
}

/// Receives a [`Progress`] once each item has been handled, whatever its
/// outcome.
///
/// Called synchronously from the sync loop: implementations must return
/// quickly and must not panic.
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: &Progress<'_>);
}

impl<F> ProgressSink for F
where
    F: Fn(usize, usize, &str) + Send + Sync,
{
    fn report(&self, progress: &Progress<'_>) {
        self(progress.current, progress.total, progress.label)
    }
}

pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _progress: &Progress<'_>) {}
}

/// Writes each step to the log, for runs without a terminal.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn report(&self, progress: &Progress<'_>) {
        info!(
            "[{}/{}] {}",
            progress.current, progress.total, progress.label
        );
    }
}
