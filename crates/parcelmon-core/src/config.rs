// ── Runtime monitor configuration ──
//
// These types describe *how* to reach the CarLo WebAPI and how often to
// poll it. They carry credential data and timing, but never touch disk.
// The binary constructs a `MonitorConfig` and hands it in.

use std::time::Duration;

use parcelmon_api::Credentials;
use url::Url;

/// Default refresh period.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Configuration for polling a single CarLo installation.
///
/// Built by `parcelmon-config`, passed to `DeliveryMonitor` -- core never
/// reads config files or the environment.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// API root, e.g. `http://wogdb:4711`.
    pub base_url: Url,
    pub credentials: Credentials,
    /// Per-request timeout for upstream calls.
    pub timeout: Duration,
    /// How often to refresh the snapshot. Zero disables the periodic task;
    /// the initial refresh still runs.
    pub update_interval: Duration,
}

impl MonitorConfig {
    pub fn new(base_url: Url, credentials: Credentials) -> Self {
        Self {
            base_url,
            credentials,
            timeout: parcelmon_api::transport::DEFAULT_TIMEOUT,
            update_interval: DEFAULT_UPDATE_INTERVAL,
        }
    }
}
