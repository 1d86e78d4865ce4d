mod engine;
mod progress;

pub use engine::{
    MergeMode, ReconcileOutcome, ReconcileReport, Reconciler, ReconcilerSettings, SyncError,
};
pub use progress::{LogProgress, NoProgress, Progress, ProgressSink};
