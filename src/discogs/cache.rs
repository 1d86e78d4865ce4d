//! Response caching for Discogs lookups.
//!
//! The client stores decoded JSON payloads under a [`CacheKey`]. How long an
//! entry stays fresh depends on its [`CacheKind`]: identifying metadata
//! changes rarely, marketplace prices change daily.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Source of the current time. Injected so tests can control expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// Freshness class of a cached payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    User,
    Release,
    Master,
    PriceSuggestions,
    MarketplaceStats,
}

impl CacheKind {
    fn as_str(&self) -> &'static str {
        match self {
            CacheKind::User => "user",
            CacheKind::Release => "release",
            CacheKind::Master => "master",
            CacheKind::PriceSuggestions => "price",
            CacheKind::MarketplaceStats => "stats",
        }
    }

    pub fn is_price_data(&self) -> bool {
        matches!(
            self,
            CacheKind::PriceSuggestions | CacheKind::MarketplaceStats
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: CacheKind,
    pub id: String,
}

impl CacheKey {
    pub fn new(kind: CacheKind, id: impl ToString) -> Self {
        Self {
            kind,
            id: id.to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

/// Storage for decoded responses.
pub trait ResponseCache: Send + Sync {
    /// Fresh value for `key`, if any.
    fn get(&self, key: &CacheKey) -> Option<serde_json::Value>;

    fn set(&self, key: CacheKey, value: serde_json::Value);

    fn clear(&self);
}

/// Freshness windows per kind of data.
#[derive(Debug, Clone)]
pub struct CacheTtl {
    pub metadata: Duration,
    pub prices: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self {
            metadata: Duration::days(7),
            prices: Duration::hours(24),
        }
    }
}

impl CacheTtl {
    pub fn for_kind(&self, kind: CacheKind) -> Duration {
        if kind.is_price_data() {
            self.prices
        } else {
            self.metadata
        }
    }
}

struct CacheEntry {
    stored_at: DateTime<Utc>,
    value: serde_json::Value,
}

/// In-memory cache with per-kind TTL.
pub struct MemoryCache<C: Clock> {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: CacheTtl,
    clock: C,
}

impl MemoryCache<SystemClock> {
    pub fn with_defaults() -> Self {
        Self::new(CacheTtl::default(), SystemClock)
    }
}

impl<C: Clock> MemoryCache<C> {
    pub fn new(ttl: CacheTtl, clock: C) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: Clock> ResponseCache for MemoryCache<C> {
    fn get(&self, key: &CacheKey) -> Option<serde_json::Value> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.get(key)?;
        if self.clock.now() - entry.stored_at < self.ttl.for_kind(key.kind) {
            return Some(entry.value.clone());
        }
        entries.remove(key);
        None
    }

    fn set(&self, key: CacheKey, value: serde_json::Value) {
        let entry = CacheEntry {
            stored_at: self.clock.now(),
            value,
        };
        self.entries.lock().unwrap().insert(key, entry);
    }

    fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

/// Cache that never stores anything.
pub struct NoOpCache;

impl ResponseCache for NoOpCache {
    fn get(&self, _key: &CacheKey) -> Option<serde_json::Value> {
        None
    }

    fn set(&self, _key: CacheKey, _value: serde_json::Value) {}

    fn clear(&self) {}
}
