//! Error types for the relay service.
//!
//! [`RelayError`] unifies all failure modes and implements
//! [`axum::response::IntoResponse`] so handlers can return
//! `Result<…, RelayError>` directly. Every error body has the shape
//! `{ "error": <summary>, "message": <detail> }`.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use platform_sdk::SdkError;
use serde_json::json;

use crate::tenant_store::StoreError;

/// Errors that can occur while handling a relay request.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The session token failed verification.
    #[error("{0}")]
    Verification(#[source] SdkError),

    /// The relay is missing configuration (client credentials).
    #[error("{0}")]
    Config(#[source] SdkError),

    /// The token or key-set endpoint failed.
    #[error("{0}")]
    Upstream(#[source] SdkError),

    /// The tenant mapping could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The request body is not valid JSON.
    #[error("invalid JSON body: {0}")]
    InvalidBody(#[source] serde_json::Error),

    /// A JSON request body was missing, mistyped or lacked required fields.
    #[error("{0}")]
    InvalidRequest(#[from] JsonRejection),

    /// The ERP endpoint would resolve outside the ERP API.
    #[error("ERP endpoint `{0}` is outside the ERP API")]
    InvalidEndpoint(String),

    /// Forwarding an ERP request failed locally (credential fetch, network,
    /// undecodable upstream body).
    #[error("{0}")]
    Relay(#[source] SdkError),
}

impl From<SdkError> for RelayError {
    fn from(e: SdkError) -> Self {
        match e {
            SdkError::SignatureVerification(_) => Self::Verification(e),
            SdkError::Config(_) => Self::Config(e),
            _ => Self::Upstream(e),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            Self::Verification(_) => (StatusCode::UNAUTHORIZED, "Invalid session token"),
            Self::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Relay is not configured"),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "Platform request failed"),
            Self::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Tenant store unavailable"),
            Self::InvalidBody(_) | Self::InvalidRequest(_) => {
                (StatusCode::BAD_REQUEST, "Invalid request body")
            }
            Self::InvalidEndpoint(_) => (StatusCode::BAD_REQUEST, "Invalid ERP endpoint"),
            Self::Relay(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch ERP info"),
        };
        let message = self.to_string();

        tracing::error!(%status, error, message = %message, "request failed");
        (status, Json(json!({ "error": error, "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sdk_errors_map_to_kinds() {
        let config = RelayError::from(SdkError::Config("missing".into()));
        assert!(matches!(config, RelayError::Config(_)));

        let upstream = RelayError::from(SdkError::UpstreamAuth {
            status: 403,
            message: "bad_client".into(),
        });
        assert!(matches!(upstream, RelayError::Upstream(_)));
        assert_eq!(upstream.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn verification_failure_is_unauthorized() {
        let err = RelayError::from(SdkError::SignatureVerification(
            jsonwebtoken::errors::ErrorKind::InvalidSignature.into(),
        ));
        assert!(matches!(err, RelayError::Verification(_)));
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn escaping_endpoint_is_a_bad_request() {
        let err = RelayError::InvalidEndpoint("../account".into());
        assert_eq!(err.to_string(), "ERP endpoint `../account` is outside the ERP API");
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn relay_failure_is_internal() {
        let err = RelayError::Relay(SdkError::Jwks("boom".into()));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
