// ── HTTP read surface ──
//
// Thin axum layer over `DeliveryMonitor`. Every data route answers 500
// until the monitor has been installed into `AppState`.

use std::sync::{Arc, OnceLock};

use axum::extract::{Query, State};
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use parcelmon_core::{DeliveryMonitor, DeliveryQuery, DeliveryRecord, DeliveryStats, SortOrder};

use crate::error::ApiError;

const INDEX_HTML: &str = include_str!("../assets/index.html");

// ── AppState ────────────────────────────────────────────────────────

/// Shared route state. The monitor slot is filled once, after the
/// initial refresh has finished.
#[derive(Clone, Default)]
pub struct AppState {
    monitor: Arc<OnceLock<DeliveryMonitor>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_monitor(monitor: DeliveryMonitor) -> Self {
        let state = Self::new();
        state.install(monitor);
        state
    }

    /// Make `monitor` visible to the routes. Returns `false` if a monitor
    /// was already installed; the first one stays.
    pub fn install(&self, monitor: DeliveryMonitor) -> bool {
        self.monitor.set(monitor).is_ok()
    }

    pub fn monitor(&self) -> Result<&DeliveryMonitor, ApiError> {
        self.monitor.get().ok_or(ApiError::NotInitialized)
    }
}

// ── Router ──────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/deliveries", get(deliveries))
        .route("/api/stats", get(stats))
        .route("/api/update", get(update))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `state` on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

/// Run the monitor's initial refresh and periodic task, then expose it to
/// the routes.
pub async fn start_and_install(monitor: DeliveryMonitor, state: AppState) {
    let count = monitor.start().await;
    info!(
        base_url = %monitor.client().base_url(),
        count,
        interval_secs = monitor.update_interval().as_secs(),
        "delivery monitor ready"
    );
    state.install(monitor);
}

// ── Handlers ────────────────────────────────────────────────────────

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Debug, Deserialize)]
struct DeliveryParams {
    #[serde(default)]
    code: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    location: String,
    #[serde(default = "default_sort_by")]
    sort_by: String,
    #[serde(default)]
    sort_order: String,
}

fn default_sort_by() -> String {
    "code".into()
}

impl DeliveryParams {
    fn to_query(&self) -> DeliveryQuery {
        DeliveryQuery::new()
            .filter("code", self.code.as_str())
            .filter("statusText", self.status.as_str())
            .filter("location1", self.location.as_str())
            .sort_by(self.sort_by.as_str(), SortOrder::parse(&self.sort_order))
    }
}

#[derive(Debug, Serialize)]
struct DeliveriesResponse {
    deliveries: Vec<DeliveryRecord>,
    last_update: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdateResponse {
    success: bool,
    message: &'static str,
    count: usize,
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

async fn deliveries(
    State(state): State<AppState>,
    Query(params): Query<DeliveryParams>,
) -> Result<Json<DeliveriesResponse>, ApiError> {
    let monitor = state.monitor()?;
    Ok(Json(DeliveriesResponse {
        deliveries: monitor.query(&params.to_query()),
        last_update: monitor.last_update().map(rfc3339),
    }))
}

async fn stats(State(state): State<AppState>) -> Result<Json<DeliveryStats>, ApiError> {
    Ok(Json(state.monitor()?.stats()))
}

async fn update(State(state): State<AppState>) -> Result<Json<UpdateResponse>, ApiError> {
    let count = state.monitor()?.refresh().await;
    Ok(Json(UpdateResponse {
        success: true,
        message: "Deliveries updated",
        count,
    }))
}
