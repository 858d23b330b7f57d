// ── Delivery monitor ──
//
// Owns the published delivery snapshot and the background task that
// keeps it fresh. Reads never touch the network: they load the current
// snapshot pointer and compute over it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use parcelmon_api::{CarloClient, DeliveryRecord, TransportConfig};

use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::store::{DeliveryQuery, DeliveryStats, Snapshot, SnapshotStore};

// ── MonitorState ─────────────────────────────────────────────────

/// Lifecycle of the cached snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// No refresh has completed yet.
    Uninitialized,
    /// At least one refresh has published a snapshot (possibly empty).
    Ready,
}

// ── DeliveryMonitor ──────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<MonitorInner>`. [`start()`](Self::start)
/// performs the initial refresh and spawns the periodic refresh task;
/// [`query()`](Self::query) and [`stats()`](Self::stats) serve reads from
/// whatever snapshot is currently published.
#[derive(Clone)]
pub struct DeliveryMonitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    client: Arc<CarloClient>,
    store: SnapshotStore,
    update_interval: Duration,
    /// Held for the whole fetch-and-publish sequence so at most one
    /// refresh talks to the upstream at a time.
    refresh_lock: Mutex<()>,
    cancel: CancellationToken,
    task_handle: Mutex<Option<JoinHandle<()>>>,
}

impl DeliveryMonitor {
    /// Build the upstream client from configuration. Does NOT fetch --
    /// call [`start()`](Self::start) to load the first snapshot.
    pub fn new(config: MonitorConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig::default().with_timeout(config.timeout);
        let client = CarloClient::new(config.base_url, config.credentials, &transport)?;
        Ok(Self::with_client(Arc::new(client), config.update_interval))
    }

    /// Wrap an existing client.
    pub fn with_client(client: Arc<CarloClient>, update_interval: Duration) -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                client,
                store: SnapshotStore::new(),
                update_interval,
                refresh_lock: Mutex::new(()),
                cancel: CancellationToken::new(),
                task_handle: Mutex::new(None),
            }),
        }
    }

    /// The upstream client.
    pub fn client(&self) -> &Arc<CarloClient> {
        &self.inner.client
    }

    pub fn update_interval(&self) -> Duration {
        self.inner.update_interval
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Run the initial refresh, then spawn the periodic refresh task.
    ///
    /// Returns the record count of the initial snapshot. Calling this
    /// again refreshes but never spawns a second task.
    pub async fn start(&self) -> usize {
        let count = self.refresh().await;

        let period = self.inner.update_interval;
        if period.is_zero() {
            info!("periodic refresh disabled");
            return count;
        }

        let mut handle = self.inner.task_handle.lock().await;
        if handle.is_none() {
            let monitor = self.clone();
            let cancel = self.inner.cancel.child_token();
            *handle = Some(tokio::spawn(refresh_task(monitor, period, cancel)));
            info!(interval_secs = period.as_secs(), "periodic refresh started");
        }

        count
    }

    /// Stop the periodic refresh task and wait for it to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handle = self.inner.task_handle.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        debug!("delivery monitor shut down");
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Fetch the current deliveries and publish them as a new snapshot.
    ///
    /// Upstream failures arrive here as an empty list; the snapshot is
    /// still published with a fresh timestamp. Returns the record count.
    pub async fn refresh(&self) -> usize {
        let _guard = self.inner.refresh_lock.lock().await;

        let records = self.inner.client.fetch_deliveries().await;
        let count = records.len();
        self.inner.store.publish(Snapshot::new(records, Utc::now()));

        info!(count, "deliveries refreshed");
        count
    }

    // ── Reads ────────────────────────────────────────────────────

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.store.load()
    }

    pub fn state(&self) -> MonitorState {
        if self.snapshot().is_initialized() {
            MonitorState::Ready
        } else {
            MonitorState::Uninitialized
        }
    }

    /// When the current snapshot was published. `None` before the first
    /// refresh.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.snapshot().refreshed_at()
    }

    /// Filtered and sorted records from the current snapshot.
    pub fn query(&self, query: &DeliveryQuery) -> Vec<DeliveryRecord> {
        query.apply(self.snapshot().records())
    }

    /// Summary counts over the full current snapshot.
    pub fn stats(&self) -> DeliveryStats {
        DeliveryStats::from_records(self.snapshot().records())
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Refresh the snapshot every `period` until cancelled.
///
/// Ticks that fall due while a refresh is still running are skipped.
async fn refresh_task(monitor: DeliveryMonitor, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = monitor.refresh() => {}
                }
            }
        }
    }

    debug!("refresh task stopped");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use parcelmon_api::Credentials;

    use super::*;
    use crate::store::SortOrder;

    const SSCC_PATH: &str = "/api/Scannerapp/v1/SsccCurrent/0";

    async fn mount_login(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/login"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": "tok" })),
            )
            .mount(server)
            .await;
    }

    fn sample_body() -> serde_json::Value {
        json!({
            "ssccCurrent": [
                { "code": "A1", "statusText": "delivered" },
                { "code": "B2", "statusText": "late" },
                { "code": "C3", "statusText": "zugestellt" }
            ]
        })
    }

    fn monitor(server: &MockServer, update_interval: Duration) -> DeliveryMonitor {
        let mut config = MonitorConfig::new(
            server.uri().parse().unwrap(),
            Credentials::new("MABU", "secret", "1", "key"),
        );
        config.timeout = Duration::from_secs(5);
        config.update_interval = update_interval;
        DeliveryMonitor::new(config).unwrap()
    }

    fn codes(records: &[DeliveryRecord]) -> Vec<String> {
        records.iter().map(|r| r.field("code").into_owned()).collect()
    }

    async fn sscc_requests(server: &MockServer) -> usize {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == SSCC_PATH)
            .count()
    }

    #[tokio::test]
    async fn uninitialized_monitor_serves_empty_reads() {
        let server = MockServer::start().await;
        let monitor = monitor(&server, Duration::ZERO);

        assert_eq!(monitor.state(), MonitorState::Uninitialized);
        assert!(monitor.last_update().is_none());
        assert!(monitor.query(&DeliveryQuery::new()).is_empty());
        assert_eq!(monitor.stats(), DeliveryStats::default());
        assert_eq!(sscc_requests(&server).await, 0);
    }

    #[tokio::test]
    async fn empty_refresh_sets_timestamp() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path(SSCC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ssccCurrent": [] })))
            .mount(&server)
            .await;

        let monitor = monitor(&server, Duration::ZERO);
        assert_eq!(monitor.refresh().await, 0);

        assert_eq!(monitor.state(), MonitorState::Ready);
        assert!(monitor.last_update().is_some());
        assert!(monitor.query(&DeliveryQuery::new()).is_empty());
        assert_eq!(monitor.stats(), DeliveryStats::default());
    }

    #[tokio::test]
    async fn refresh_feeds_query_and_stats() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path(SSCC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .mount(&server)
            .await;

        let monitor = monitor(&server, Duration::ZERO);
        assert_eq!(monitor.start().await, 3);

        assert_eq!(
            monitor.stats(),
            DeliveryStats {
                total: 3,
                delivered: 2,
                pending: 1,
                overdue: 1,
            }
        );

        let query = DeliveryQuery::new().sort_by("code", SortOrder::Desc);
        assert_eq!(codes(&monitor.query(&query)), vec!["C3", "B2", "A1"]);
        assert_eq!(monitor.query(&query), monitor.query(&query));
    }

    #[tokio::test]
    async fn upstream_failure_publishes_empty_snapshot() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path(SSCC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(SSCC_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let monitor = monitor(&server, Duration::ZERO);
        assert_eq!(monitor.refresh().await, 3);
        let first = monitor.last_update().unwrap();

        assert_eq!(monitor.refresh().await, 0);
        assert_eq!(monitor.state(), MonitorState::Ready);
        assert!(monitor.last_update().unwrap() >= first);
        assert_eq!(monitor.stats().total, 0);
    }

    #[tokio::test]
    async fn reads_do_not_wait_for_a_running_refresh() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path(SSCC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(SSCC_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "ssccCurrent": [] }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let monitor = monitor(&server, Duration::ZERO);
        monitor.refresh().await;

        let background = monitor.clone();
        let slow = tokio::spawn(async move { background.refresh().await });
        tokio::time::sleep(Duration::from_millis(100)).await;

        // Old snapshot is still served while the slow refresh is in flight.
        assert_eq!(monitor.stats().total, 3);

        assert_eq!(slow.await.unwrap(), 0);
        assert_eq!(monitor.stats().total, 0);
    }

    #[tokio::test]
    async fn periodic_task_refreshes_until_shutdown() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path(SSCC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .mount(&server)
            .await;

        let monitor = monitor(&server, Duration::from_millis(100));
        monitor.start().await;
        tokio::time::sleep(Duration::from_millis(350)).await;

        let seen = sscc_requests(&server).await;
        assert!(seen >= 2, "expected initial + periodic refreshes, saw {seen}");

        monitor.shutdown().await;
        let after_shutdown = sscc_requests(&server).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(sscc_requests(&server).await, after_shutdown);
    }

    #[tokio::test]
    async fn zero_interval_only_refreshes_once() {
        let server = MockServer::start().await;
        mount_login(&server).await;
        Mock::given(method("GET"))
            .and(path(SSCC_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_body()))
            .expect(1)
            .mount(&server)
            .await;

        let monitor = monitor(&server, Duration::ZERO);
        monitor.start().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        monitor.shutdown().await;
    }
}
