//! SDK error types.
//!
//! [`SdkError`] is the single error type returned by every fallible
//! operation in the SDK.

/// Error type for all SDK operations.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Invalid or missing configuration (e.g. absent client credentials).
    #[error("configuration error: {0}")]
    Config(String),

    /// The token endpoint answered the client-credentials exchange with a
    /// non-success status.
    #[error("failed to fetch service credential ({status}): {message}")]
    UpstreamAuth {
        /// HTTP status returned by the token endpoint.
        status: u16,
        /// The upstream `error` field, or the raw body when it is not JSON.
        message: String,
    },

    /// The signing key set could not be fetched or contained no usable key.
    #[error("signing key set error: {0}")]
    Jwks(String),

    /// The session token failed signature or claim validation.
    #[error("session token verification failed: {0}")]
    SignatureVerification(#[source] jsonwebtoken::errors::Error),

    /// A session token could not be signed.
    #[error("signing error: {0}")]
    Signing(String),

    /// HTTP request failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization / deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
