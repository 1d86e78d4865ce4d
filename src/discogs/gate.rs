//! Rate limiting and retry for outbound Discogs requests.
//!
//! Every request goes through a single [`RequestGate`], which serializes
//! dispatch in FIFO order, keeps requests spaced apart, idles when the
//! remaining budget reported by Discogs runs low, and retries throttled
//! (429) and server-side (5xx) failures with a bounded number of attempts.

use super::error::{DiscogsError, TransportError};
use reqwest::header::HeaderMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

pub const HEADER_RATELIMIT: &str = "x-discogs-ratelimit";
pub const HEADER_RATELIMIT_USED: &str = "x-discogs-ratelimit-used";
pub const HEADER_RATELIMIT_REMAINING: &str = "x-discogs-ratelimit-remaining";

/// Request budget as last reported by Discogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub used: u32,
    pub remaining: u32,
}

impl RateLimitStatus {
    pub fn full(limit: u32) -> Self {
        Self {
            limit,
            used: 0,
            remaining: limit,
        }
    }

    /// Parse the `X-Discogs-Ratelimit*` headers. Returns `None` unless all
    /// three are present and numeric.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let read = |name: &str| -> Option<u32> { headers.get(name)?.to_str().ok()?.trim().parse().ok() };
        Some(Self {
            limit: read(HEADER_RATELIMIT)?,
            used: read(HEADER_RATELIMIT_USED)?,
            remaining: read(HEADER_RATELIMIT_REMAINING)?,
        })
    }
}

/// A response as seen by the gate: status, budget headers and raw body.
#[derive(Debug, Clone)]
pub struct GateResponse {
    pub status: u16,
    pub rate_limit: Option<RateLimitStatus>,
    pub body: String,
}

impl GateResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Configuration for the request gate.
#[derive(Debug, Clone)]
pub struct GateSettings {
    /// Budget assumed before authenticating.
    pub unauthenticated_limit: u32,
    /// Budget assumed once a token is attached.
    pub authenticated_limit: u32,
    /// Below this many remaining requests the gate waits for the next window.
    pub low_water_mark: u32,
    /// Length of the Discogs rate-limit window.
    pub budget_window: Duration,
    /// Minimum spacing between two dispatches.
    pub min_request_interval: Duration,
    /// Base wait after a 429, multiplied by the attempt number.
    pub rate_limit_cooldown: Duration,
    /// Base wait after a 5xx or transport failure, doubled on each attempt.
    pub server_error_backoff: Duration,
    /// Total dispatches per request, including the first one.
    pub max_attempts: u32,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            unauthenticated_limit: 60,
            authenticated_limit: 240,
            low_water_mark: 5,
            budget_window: Duration::from_secs(60),
            min_request_interval: Duration::from_millis(250), // ~4 req/sec
            rate_limit_cooldown: Duration::from_secs(65),
            server_error_backoff: Duration::from_secs(1),
            max_attempts: 3,
        }
    }
}

impl GateSettings {
    /// Wait before retrying after the `attempt`-th dispatch was throttled.
    pub fn rate_limit_wait(&self, attempt: u32) -> Duration {
        self.rate_limit_cooldown * attempt
    }

    /// Wait before retrying after the `attempt`-th dispatch hit a server error.
    pub fn server_error_wait(&self, attempt: u32) -> Duration {
        self.server_error_backoff * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Serializing, budget-aware gate in front of the HTTP client.
pub struct RequestGate {
    settings: GateSettings,
    /// Held for the whole lifetime of a request (retries included). Tokio's
    /// mutex is fair, so waiters are served in FIFO order.
    queue: tokio::sync::Mutex<Option<Instant>>,
    status: Mutex<RateLimitStatus>,
}

impl RequestGate {
    pub fn new(settings: GateSettings) -> Self {
        let status = RateLimitStatus::full(settings.unauthenticated_limit);
        Self {
            settings,
            queue: tokio::sync::Mutex::new(None),
            status: Mutex::new(status),
        }
    }

    pub fn rate_limit_status(&self) -> RateLimitStatus {
        *self.status.lock().unwrap()
    }

    /// Raise the assumed budget after authenticating.
    pub fn use_authenticated_limit(&self) {
        let mut status = self.status.lock().unwrap();
        status.limit = self.settings.authenticated_limit;
        status.remaining = status.limit.saturating_sub(status.used);
    }

    /// Run `request` through the gate.
    ///
    /// `request` is invoked once per attempt. Successful responses are
    /// returned as-is; any other status ends in [`DiscogsError::Http`] once it
    /// is either non-retryable or out of attempts.
    pub async fn execute<F, Fut>(&self, mut request: F) -> Result<GateResponse, DiscogsError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<GateResponse, TransportError>>,
    {
        let mut last_dispatch = self.queue.lock().await;
        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            self.wait_for_budget().await;
            self.pace(*last_dispatch).await;

            let result = request().await;
            *last_dispatch = Some(Instant::now());

            let response = match result {
                Ok(response) => response,
                Err(err) => {
                    if attempt < max_attempts {
                        let wait = self.settings.server_error_wait(attempt);
                        warn!(
                            "Request failed ({}), retrying in {:?} (attempt {}/{})",
                            err, wait, attempt, max_attempts
                        );
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    return Err(DiscogsError::Transport(err.0));
                }
            };

            self.record_response(&response);

            if response.is_success() {
                return Ok(response);
            }

            let status = response.status;
            if status == 429 && attempt < max_attempts {
                let wait = self.settings.rate_limit_wait(attempt);
                warn!(
                    "Rate limited by Discogs, waiting {:?} before retry (attempt {}/{})",
                    wait, attempt, max_attempts
                );
                tokio::time::sleep(wait).await;
                continue;
            }
            if status >= 500 && attempt < max_attempts {
                let wait = self.settings.server_error_wait(attempt);
                warn!(
                    "Discogs returned {}, retrying in {:?} (attempt {}/{})",
                    status, wait, attempt, max_attempts
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            return Err(DiscogsError::Http {
                status,
                rate_limit_remaining: self.rate_limit_status().remaining,
            });
        }
    }

    /// Idle for one window when the budget is nearly spent.
    async fn wait_for_budget(&self) {
        let remaining = self.rate_limit_status().remaining;
        if remaining >= self.settings.low_water_mark {
            return;
        }

        info!(
            "Rate limit budget low ({} remaining), waiting {:?} for the next window",
            remaining, self.settings.budget_window
        );
        tokio::time::sleep(self.settings.budget_window).await;

        let mut status = self.status.lock().unwrap();
        *status = RateLimitStatus::full(status.limit);
    }

    async fn pace(&self, last_dispatch: Option<Instant>) {
        let Some(last) = last_dispatch else {
            return;
        };
        let elapsed = last.elapsed();
        if elapsed < self.settings.min_request_interval {
            let wait = self.settings.min_request_interval - elapsed;
            debug!("Pacing next request by {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }

    fn record_response(&self, response: &GateResponse) {
        let mut status = self.status.lock().unwrap();
        match response.rate_limit {
            Some(reported) => *status = reported,
            None => {
                status.used = status.used.saturating_add(1);
                status.remaining = status.remaining.saturating_sub(1);
            }
        }
    }
}
