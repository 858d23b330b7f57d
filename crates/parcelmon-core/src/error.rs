// ── Core error types ──
//
// The only fallible core operation is building the upstream client;
// refresh failures never surface as errors.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The HTTP client for the CarLo API could not be constructed.
    #[error("Cannot build CarLo API client: {0}")]
    Client(#[from] parcelmon_api::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_error_keeps_upstream_message() {
        let err = CoreError::from(parcelmon_api::Error::MissingToken);
        assert!(matches!(err, CoreError::Client(_)));
        assert!(err.to_string().starts_with("Cannot build CarLo API client: "));
    }
}
