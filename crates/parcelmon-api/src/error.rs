use thiserror::Error;

/// Top-level error type for the `parcelmon-api` crate.
///
/// Covers every failure mode of the two upstream calls (login and the
/// current-deliveries fetch). `parcelmon-core` maps these into user-facing
/// diagnostics; the non-`try_` client methods reduce them to a log entry.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (wrong credentials, unknown organization, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// No bearer token available, or the login response carried none.
    #[error("No access token available -- login required")]
    MissingToken,

    /// The bearer token was rejected with HTTP 401.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── API ─────────────────────────────────────────────────────────
    /// Unexpected HTTP status from the upstream API.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying on the
    /// next refresh cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_are_not_transient() {
        assert!(!Error::SessionExpired.is_transient());
        assert!(!Error::MissingToken.is_transient());
        assert!(
            !Error::Authentication {
                message: "nope".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Api {
            status: 503,
            message: "unavailable".into(),
        };
        assert!(err.is_transient());

        let err = Error::Api {
            status: 404,
            message: "not found".into(),
        };
        assert!(!err.is_transient());
    }
}
