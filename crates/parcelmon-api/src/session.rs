// CarLo WebAPI authentication
//
// Form-encoded username/password login. The response carries a bearer
// token which the client keeps for every subsequent data request.

use secrecy::ExposeSecret;
use tracing::{debug, error};

use crate::client::{CarloClient, preview};
use crate::error::Error;
use crate::models::LoginResponse;

impl CarloClient {
    /// Authenticate and store the returned bearer token.
    ///
    /// `POST /login` with form fields `username`, `password` and
    /// `organizationNumber`. Any failure clears the held token, so a
    /// rejected login never leaves a stale token behind.
    pub async fn try_login(&self) -> Result<(), Error> {
        let result = self.request_token().await;
        match result {
            Ok(token) => {
                self.set_token(token).await;
                debug!("login successful");
                Ok(())
            }
            Err(e) => {
                self.clear_token().await;
                Err(e)
            }
        }
    }

    /// Authenticate, reducing every failure to `false` plus a log entry.
    pub async fn login(&self) -> bool {
        match self.try_login().await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "login failed");
                false
            }
        }
    }

    async fn request_token(&self) -> Result<String, Error> {
        let url = self.url("/login")?;
        let credentials = self.credentials();

        debug!(username = %credentials.username, "logging in at {}", url);

        let form = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password.expose_secret()),
            ("organizationNumber", credentials.organization_number.as_str()),
        ];

        // `.form()` sets `Content-Type: application/x-www-form-urlencoded`.
        let resp = self.http().post(url).form(&form).send().await?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {}", preview(&body)),
            });
        }

        let body = resp.text().await?;
        let parsed: LoginResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("login response: {e}"),
                body: body.clone(),
            })?;

        parsed
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or(Error::MissingToken)
    }
}
