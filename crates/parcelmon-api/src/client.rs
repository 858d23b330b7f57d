// CarLo WebAPI HTTP client
//
// Wraps `reqwest::Client` with base-URL handling, bearer-token storage
// and response decoding. The login flow and the delivery endpoint are
// implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, trace};
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Async client for the CarLo WebAPI.
///
/// Owns the session state: the credentials it logs in with and the bearer
/// token the last successful login produced. The token is replaced on
/// every login and cleared when the server rejects it.
pub struct CarloClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    token: RwLock<Option<SecretString>>,
}

impl CarloClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the API root, e.g. `http://wogdb:4711`.
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, credentials))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: Credentials) -> Self {
        Self {
            http,
            base_url,
            credentials,
            token: RwLock::new(None),
        }
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    // ── Token management ─────────────────────────────────────────────

    /// Whether a bearer token from a previous login is held.
    pub async fn has_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    /// Forget the current bearer token.
    pub async fn clear_token(&self) {
        trace!("clearing access token");
        *self.token.write().await = None;
    }

    pub(crate) async fn set_token(&self, token: String) {
        debug!("storing access token");
        *self.token.write().await = Some(SecretString::from(token));
    }

    /// `Authorization` header value for the held token.
    pub(crate) async fn bearer_header(&self) -> Result<HeaderValue, Error> {
        let guard = self.token.read().await;
        let token = guard.as_ref().ok_or(Error::MissingToken)?;
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("access token is not a valid header value: {e}"),
            })?;
        value.set_sensitive(true);
        Ok(value)
    }

    /// `X-API-KEY` header value.
    pub(crate) fn api_key_header(&self) -> Result<HeaderValue, Error> {
        let mut value = HeaderValue::from_str(self.credentials.api_key.expose_secret())
            .map_err(|e| Error::Authentication {
                message: format!("invalid API key header value: {e}"),
            })?;
        value.set_sensitive(true);
        Ok(value)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build a full URL for an absolute API path, keeping any path prefix
    /// the base URL carries.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Response helpers ─────────────────────────────────────────────

    /// Map the status of an authenticated call and decode a JSON body.
    pub(crate) async fn parse_json<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::SessionExpired);
        }

        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: preview(&body).to_owned(),
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

/// First 200 bytes of a body, cut on a char boundary.
pub(crate) fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> CarloClient {
        CarloClient::with_client(
            reqwest::Client::new(),
            Url::parse(base).unwrap(),
            Credentials::new("user", "pass", "1", "key"),
        )
    }

    #[test]
    fn url_joins_without_double_slash() {
        let c = client("http://wogdb:4711/");
        assert_eq!(c.url("/login").unwrap().as_str(), "http://wogdb:4711/login");
    }

    #[test]
    fn url_keeps_base_path_prefix() {
        let c = client("http://proxy.local/carlo");
        assert_eq!(
            c.url("/api/Scannerapp/v1/SsccCurrent/0").unwrap().as_str(),
            "http://proxy.local/carlo/api/Scannerapp/v1/SsccCurrent/0"
        );
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "ä".repeat(150);
        let cut = preview(&body);
        assert!(cut.len() <= 200);
        assert!(body.starts_with(cut));
    }

    #[tokio::test]
    async fn bearer_header_requires_token() {
        let c = client("http://wogdb:4711");
        assert!(matches!(c.bearer_header().await, Err(Error::MissingToken)));

        c.set_token("abc".into()).await;
        assert!(c.has_token().await);
        let header = c.bearer_header().await.unwrap();
        assert_eq!(header.to_str().unwrap(), "Bearer abc");
        assert!(header.is_sensitive());

        c.clear_token().await;
        assert!(!c.has_token().await);
    }
}
