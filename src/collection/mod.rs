//! The local vinyl collection: record model, Discogs mapping, snapshot
//! persistence and summary figures.

pub mod mapping;
mod models;
mod stats;
mod store;

pub use mapping::clean_artist_name;
pub use models::{compute_gain_loss, Artist, CollectionRecord, Condition, DEFAULT_CURRENCY};
pub use stats::{CollectionSummary, Highlight};
pub use store::{JsonSnapshotStore, SnapshotIndex, SnapshotStore, StoreError};
