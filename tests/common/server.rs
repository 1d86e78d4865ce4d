//! Mock Discogs API lifecycle management
//!
//! Each test gets an isolated server with its own copy of the mock catalog.
//! Every request is recorded, and responses carry Discogs rate-limit headers.

use super::constants::*;
use super::fixtures::{create_mock_catalog, MockCatalog};
use axum::extract::{Path, Query, Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use vinyl_sync::discogs::{CollectionItem, MarketplaceStats, Price, Release};

/// A request as seen by the mock server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub user_agent: Option<String>,
}

struct MockState {
    catalog: Mutex<MockCatalog>,
    requests: Mutex<Vec<RecordedRequest>>,
    /// Statuses returned, in order, instead of the real response.
    scripted: Mutex<VecDeque<u16>>,
    used: AtomicU32,
}

type SharedState = Arc<MockState>;

/// Mock Discogs server instance
///
/// When dropped, the server gracefully shuts down.
pub struct MockDiscogs {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    state: SharedState,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<u32>,
    per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ListingsQuery {
    release_id: Option<u64>,
}

fn not_found(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": message }))).into_response()
}

async fn record_and_script(State(state): State<SharedState>, request: Request, next: Next) -> Response {
    if request.uri().path() == "/" {
        return next.run(request).await;
    }

    let recorded = {
        let header_str = |name: header::HeaderName| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        RecordedRequest {
            path: request.uri().path().to_string(),
            query: request.uri().query().map(str::to_string),
            authorization: header_str(header::AUTHORIZATION),
            user_agent: header_str(header::USER_AGENT),
        }
    };
    state.requests.lock().unwrap().push(recorded);

    let used = state.used.fetch_add(1, Ordering::SeqCst) + 1;
    let scripted = state.scripted.lock().unwrap().pop_front();

    let mut response = match scripted {
        Some(status) => StatusCode::from_u16(status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response(),
        None => next.run(request).await,
    };

    let headers = response.headers_mut();
    headers.insert("x-discogs-ratelimit", HeaderValue::from(MOCK_RATE_LIMIT));
    headers.insert("x-discogs-ratelimit-used", HeaderValue::from(used));
    headers.insert(
        "x-discogs-ratelimit-remaining",
        HeaderValue::from(MOCK_RATE_LIMIT.saturating_sub(used)),
    );
    response
}

async fn get_user(State(state): State<SharedState>, Path(username): Path<String>) -> Response {
    let catalog = state.catalog.lock().unwrap();
    if username != catalog.user.username {
        return not_found("User does not exist or may have been deleted.");
    }
    Json(catalog.user.clone()).into_response()
}

async fn get_folders(State(state): State<SharedState>, Path(username): Path<String>) -> Response {
    let catalog = state.catalog.lock().unwrap();
    if username != catalog.user.username {
        return not_found("User does not exist or may have been deleted.");
    }
    Json(json!({ "folders": catalog.folders })).into_response()
}

async fn get_folder_releases(
    State(state): State<SharedState>,
    Path((username, folder_id)): Path<(String, u64)>,
    Query(query): Query<PageQuery>,
) -> Response {
    let catalog = state.catalog.lock().unwrap();
    if username != catalog.user.username {
        return not_found("User does not exist or may have been deleted.");
    }
    if !catalog.folders.iter().any(|f| f.id == folder_id) {
        return not_found("Folder not found.");
    }

    let ids = catalog.folder_contents(folder_id);
    let per_page = query.per_page.unwrap_or(50).max(1);
    let page = query.page.unwrap_or(1).max(1);
    let pages = (ids.len() as u32).div_ceil(per_page).max(1);
    let releases: Vec<CollectionItem> = ids
        .iter()
        .skip(((page - 1) * per_page) as usize)
        .take(per_page as usize)
        .filter_map(|id| catalog.collection_item(*id, folder_id))
        .collect();

    Json(json!({
        "pagination": {
            "page": page,
            "pages": pages,
            "per_page": per_page,
            "items": ids.len(),
            "urls": {}
        },
        "releases": releases
    }))
    .into_response()
}

async fn get_collection_value(State(state): State<SharedState>, Path(username): Path<String>) -> Response {
    let catalog = state.catalog.lock().unwrap();
    if username != catalog.user.username {
        return not_found("User does not exist or may have been deleted.");
    }
    Json(json!({
        "minimum": "$120.00",
        "median": "$180.50",
        "maximum": "$260.00"
    }))
    .into_response()
}

async fn get_release(State(state): State<SharedState>, Path(release_id): Path<u64>) -> Response {
    let catalog = state.catalog.lock().unwrap();
    match catalog.releases.get(&release_id) {
        Some(release) => Json(release.clone()).into_response(),
        None => not_found("Release not found."),
    }
}

async fn get_marketplace_stats(State(state): State<SharedState>, Path(release_id): Path<u64>) -> Response {
    let catalog = state.catalog.lock().unwrap();
    match catalog.stats.get(&release_id) {
        Some(stats) => Json(stats.clone()).into_response(),
        None => not_found("Release not found."),
    }
}

async fn get_master(State(state): State<SharedState>, Path(master_id): Path<u64>) -> Response {
    let catalog = state.catalog.lock().unwrap();
    match catalog.masters.get(&master_id) {
        Some(master) => Json(master.clone()).into_response(),
        None => not_found("Master Release not found."),
    }
}

async fn get_price_suggestions(
    State(state): State<SharedState>,
    Path(release_id): Path<u64>,
) -> Response {
    let catalog = state.catalog.lock().unwrap();
    match catalog.suggestions.get(&release_id) {
        Some(suggestions) => Json(suggestions.clone()).into_response(),
        None => not_found("No price suggestions for this release."),
    }
}

async fn get_listings(State(state): State<SharedState>, Query(query): Query<ListingsQuery>) -> Response {
    let catalog = state.catalog.lock().unwrap();
    let listings = query
        .release_id
        .and_then(|id| catalog.listings.get(&id).cloned())
        .unwrap_or_default();
    Json(json!({ "listings": listings })).into_response()
}

fn make_app(state: SharedState) -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route("/users/{username}", get(get_user))
        .route("/users/{username}/collection/folders", get(get_folders))
        .route(
            "/users/{username}/collection/folders/{folder_id}/releases",
            get(get_folder_releases),
        )
        .route("/users/{username}/collection/value", get(get_collection_value))
        .route("/releases/{release_id}", get(get_release))
        .route("/masters/{master_id}", get(get_master))
        .route("/marketplace/stats/{release_id}", get(get_marketplace_stats))
        .route(
            "/marketplace/price_suggestions/{release_id}",
            get(get_price_suggestions),
        )
        .route("/marketplace/listings", get(get_listings))
        .layer(middleware::from_fn_with_state(state.clone(), record_and_script))
        .with_state(state)
}

impl MockDiscogs {
    /// Spawns a new mock server on a random port
    ///
    /// # Panics
    ///
    /// Panics if port binding fails or the server doesn't become ready
    /// within the timeout.
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState {
            catalog: Mutex::new(create_mock_catalog()),
            requests: Mutex::new(Vec::new()),
            scripted: Mutex::new(VecDeque::new()),
            used: AtomicU32::new(0),
        });

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let app = make_app(state.clone());

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            state,
            _shutdown_tx: Some(shutdown_tx),
        };
        server.wait_for_ready().await;
        server
    }

    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }

    /// All API requests received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Number of requests received for an exact path.
    pub fn request_count(&self, path: &str) -> usize {
        self.state
            .requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .count()
    }

    /// Answer the next requests with these statuses, whatever their path.
    #[allow(dead_code)]
    pub fn fail_next(&self, statuses: &[u16]) {
        self.state.scripted.lock().unwrap().extend(statuses);
    }

    /// Change a release as Discogs contributors would.
    #[allow(dead_code)]
    pub fn update_release(&self, release_id: u64, update: impl FnOnce(&mut Release)) {
        let mut catalog = self.state.catalog.lock().unwrap();
        let release = catalog
            .releases
            .get_mut(&release_id)
            .expect("Unknown release");
        update(release);
    }

    #[allow(dead_code)]
    pub fn set_lowest_price(&self, release_id: u64, value: f64) {
        let mut catalog = self.state.catalog.lock().unwrap();
        let stats = catalog
            .stats
            .entry(release_id)
            .or_insert_with(|| MarketplaceStats {
                lowest_price: None,
                num_for_sale: Some(1),
                blocked_from_sale: false,
            });
        stats.lowest_price = Some(Price {
            value,
            currency: "USD".to_string(),
        });
    }
}

impl Drop for MockDiscogs {
    fn drop(&mut self) {
        // Send shutdown signal
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
