// Current-deliveries endpoint
//
// `GET /api/Scannerapp/v1/SsccCurrent/0` returns every open SSCC
// (shipment) the organization currently tracks.

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::CarloClient;
use crate::error::Error;
use crate::models::{DeliveryRecord, SsccCurrentResponse};

const SSCC_CURRENT_PATH: &str = "/api/Scannerapp/v1/SsccCurrent/0";

/// Re-logins allowed per fetch after the server rejects the token.
const MAX_REAUTH_ATTEMPTS: u32 = 1;

impl CarloClient {
    /// Fetch the current delivery list.
    ///
    /// Logs in first when no token is held. A 401 triggers exactly one
    /// re-login followed by one retried request; a second 401 is returned
    /// as [`Error::SessionExpired`].
    pub async fn try_fetch_deliveries(&self) -> Result<Vec<DeliveryRecord>, Error> {
        if !self.has_token().await {
            debug!("no access token, logging in before fetch");
            self.try_login().await?;
        }

        let mut reauth_attempts = 0;
        loop {
            match self.request_deliveries().await {
                Err(Error::SessionExpired) if reauth_attempts < MAX_REAUTH_ATTEMPTS => {
                    reauth_attempts += 1;
                    debug!(attempt = reauth_attempts, "access token rejected, logging in again");
                    self.clear_token().await;
                    self.try_login().await?;
                }
                result => return result,
            }
        }
    }

    /// Fetch the current delivery list, degrading every failure to an
    /// empty list plus a log entry.
    pub async fn fetch_deliveries(&self) -> Vec<DeliveryRecord> {
        match self.try_fetch_deliveries().await {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    error = %e,
                    transient = e.is_transient(),
                    "fetching deliveries failed, no data this cycle"
                );
                Vec::new()
            }
        }
    }

    async fn request_deliveries(&self) -> Result<Vec<DeliveryRecord>, Error> {
        let url = self.url(SSCC_CURRENT_PATH)?;
        debug!("GET {}", url);

        let resp = self
            .http()
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(AUTHORIZATION, self.bearer_header().await?)
            .header("X-API-KEY", self.api_key_header()?)
            .send()
            .await?;

        let body: SsccCurrentResponse = Self::parse_json(resp).await?;
        let records = body
            .sscc_current
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| match entry {
                Value::Object(fields) => Some(DeliveryRecord::new(fields)),
                other => {
                    debug!(entry = %other, "skipping non-object ssccCurrent entry");
                    None
                }
            })
            .collect::<Vec<_>>();

        debug!(count = records.len(), "deliveries fetched");
        Ok(records)
    }
}
