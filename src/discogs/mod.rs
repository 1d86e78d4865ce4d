//! Discogs API access: request gating, response caching and the typed client.

mod cache;
mod client;
mod error;
mod gate;
mod models;

pub use cache::{
    CacheKey, CacheKind, CacheTtl, Clock, ManualClock, MemoryCache, NoOpCache, ResponseCache,
    SystemClock,
};
#[cfg(feature = "mock")]
pub use client::MockCatalogSource;
pub use client::{
    CatalogSource, DiscogsClient, DiscogsClientConfig, DEFAULT_USER_AGENT, DISCOGS_API_BASE,
};
pub use error::{DiscogsError, TransportError};
pub use gate::{GateResponse, GateSettings, RateLimitStatus, RequestGate};
pub use models::*;
