//! Common test infrastructure
//!
//! This module provides a mock Discogs API for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{test_client, MockDiscogs, RELEASE_NEU_ID};
//!
//! #[tokio::test]
//! async fn test_get_release() {
//!     let server = MockDiscogs::spawn().await;
//!     let client = test_client(&server.base_url);
//!
//!     let release = client.get_release(RELEASE_NEU_ID).await.unwrap();
//!     assert_eq!(release.title, "Neu! 75");
//! }
//! ```

mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use constants::*;
#[allow(unused_imports)]
pub use server::{MockDiscogs, RecordedRequest};

use std::sync::Arc;
use std::time::Duration;
use vinyl_sync::discogs::{
    DiscogsClient, DiscogsClientConfig, GateSettings, MemoryCache, ResponseCache,
};

/// Gate settings with the waits scaled down to milliseconds.
pub fn fast_gate() -> GateSettings {
    GateSettings {
        budget_window: Duration::from_millis(50),
        min_request_interval: Duration::ZERO,
        rate_limit_cooldown: Duration::from_millis(20),
        server_error_backoff: Duration::from_millis(5),
        ..GateSettings::default()
    }
}

/// Authenticated client pointed at the mock server, with an in-memory cache.
pub fn test_client(base_url: &str) -> DiscogsClient {
    test_client_with_cache(base_url, Arc::new(MemoryCache::with_defaults()))
}

#[allow(dead_code)]
pub fn test_client_with_cache(base_url: &str, cache: Arc<dyn ResponseCache>) -> DiscogsClient {
    let config = DiscogsClientConfig {
        base_url: base_url.to_string(),
        request_timeout: Duration::from_secs(5),
        gate: fast_gate(),
        ..Default::default()
    };
    let mut client = DiscogsClient::new(config, cache).expect("Failed to create client");
    client.authenticate(TEST_TOKEN, TEST_USER);
    client
}
