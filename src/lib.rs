//! Vinyl Sync Library
//!
//! Keeps a local JSON vinyl collection in step with a Discogs collection.
//! The modules are exposed for the binary and for integration tests.

pub mod collection;
pub mod config;
pub mod discogs;
pub mod sync;

// Re-export commonly used types for convenience
pub use collection::{CollectionRecord, JsonSnapshotStore, SnapshotStore};
pub use discogs::{CatalogSource, DiscogsClient, DiscogsClientConfig, DiscogsError};
pub use sync::{MergeMode, ReconcileReport, Reconciler, ReconcilerSettings, SyncError};
