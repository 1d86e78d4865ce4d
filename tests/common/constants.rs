//! Shared constants for end-to-end tests
//!
//! When the mock Discogs data changes, update only this file and
//! `fixtures.rs`.

// ============================================================================
// Test Credentials
// ============================================================================

/// Username owning the mock collection
pub const TEST_USER: &str = "testcollector";

/// Personal access token accepted by the mock server
pub const TEST_TOKEN: &str = "test-token-123";

/// The implicit "All" folder
pub const ALL_FOLDER_ID: u64 = 0;

/// A user-created folder holding a single release
pub const SINGLES_FOLDER_ID: u64 = 7;

// ============================================================================
// Mock Catalog
// ============================================================================

/// "Neu! 75" by Neu!, listed on the marketplace
pub const RELEASE_NEU_ID: u64 = 1001;

/// "Days Are Gone" by "Haim (2)", listed on the marketplace
pub const RELEASE_HAIM_ID: u64 = 1002;

/// "Tago Mago" by Can, no marketplace data
pub const RELEASE_CAN_ID: u64 = 1003;

/// "Deluxe" by Harmonia, listed on the marketplace
pub const RELEASE_HARMONIA_ID: u64 = 1004;

/// "Zuckerzeit" by Cluster, nothing currently for sale
pub const RELEASE_CLUSTER_ID: u64 = 1005;

/// Master release of Neu! 75
pub const MASTER_NEU_ID: u64 = 51001;

/// Suggested near mint price of Neu! 75. Only Neu! 75 has suggestions.
pub const NEU_SUGGESTED_NM_PRICE: f64 = 52.0;

/// A release id the server doesn't know
pub const MISSING_RELEASE_ID: u64 = 9999;

/// Lowest marketplace price of Neu! 75
pub const NEU_LOWEST_PRICE: f64 = 45.0;

/// Lowest marketplace price of Days Are Gone
pub const HAIM_LOWEST_PRICE: f64 = 28.5;

/// Lowest marketplace price of Deluxe
pub const HARMONIA_LOWEST_PRICE: f64 = 60.0;

/// Budget the mock server reports in its rate-limit headers
pub const MOCK_RATE_LIMIT: u32 = 60;

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for server to be ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 10;
