//! Client-credentials exchange against the platform token endpoint.
//!
//! Every call performs a fresh round trip; nothing is cached and nothing is
//! retried.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::credentials::{ClientCredentials, ServiceCredential};
use crate::environment::PlatformEndpoints;
use crate::error::SdkError;

/// Successful token endpoint response. Only `access_token` is used.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

/// Error body returned by the token endpoint on failure.
#[derive(Deserialize)]
struct TokenErrorResponse {
    error: Option<String>,
}

/// Exchanges client credentials for a [`ServiceCredential`].
#[derive(Debug, Clone)]
pub struct TokenIssuerClient {
    http: reqwest::Client,
    token_url: String,
    credentials: ClientCredentials,
}

impl TokenIssuerClient {
    /// Create a client for the token endpoint of `endpoints`.
    pub fn new(
        http: reqwest::Client,
        endpoints: &PlatformEndpoints,
        credentials: ClientCredentials,
    ) -> Self {
        Self {
            http,
            token_url: endpoints.token_url(),
            credentials,
        }
    }

    /// Request a new service credential.
    ///
    /// Sends `grant_type=client_credentials` with HTTP Basic client
    /// authentication and returns the `access_token` of the response.
    ///
    /// # Errors
    ///
    /// * [`SdkError::Config`] if the client id or secret is missing.
    /// * [`SdkError::UpstreamAuth`] if the endpoint answers with a
    ///   non-success status or omits `access_token`.
    /// * [`SdkError::Http`] / [`SdkError::Serialization`] on transport or
    ///   decoding failures.
    pub async fn fetch_service_credential(&self) -> Result<ServiceCredential, SdkError> {
        let (client_id, client_secret) = self.credentials.require()?;

        debug!(token_url = %self.token_url, client_id, "requesting service credential");

        let res = self
            .http
            .post(&self.token_url)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<TokenErrorResponse>(&text)
                .ok()
                .and_then(|body| body.error)
                .unwrap_or(text);
            warn!(status = status.as_u16(), error = %message, "token endpoint rejected client credentials");
            return Err(SdkError::UpstreamAuth {
                status: status.as_u16(),
                message,
            });
        }

        let body: TokenResponse = serde_json::from_str(&text)?;
        let access_token = body.access_token.ok_or_else(|| SdkError::UpstreamAuth {
            status: status.as_u16(),
            message: "missing access_token".into(),
        })?;

        Ok(ServiceCredential::new(&access_token))
    }
}

#[cfg(test)]
mod tests {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn issuer_for(server: &MockServer, credentials: ClientCredentials) -> TokenIssuerClient {
        let endpoints = PlatformEndpoints::new(&server.base_url(), &server.base_url());
        TokenIssuerClient::new(reqwest::Client::new(), &endpoints, credentials)
    }

    #[tokio::test]
    async fn returns_access_token_on_success() {
        let server = MockServer::start_async().await;
        let basic = format!("Basic {}", STANDARD.encode("client-a:secret-a"));
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/oauth2/token")
                    .header("authorization", basic.as_str())
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body("grant_type=client_credentials");
                then.status(200)
                    .json_body(json!({ "access_token": "T", "token_type": "bearer", "expires_in": 3600 }));
            })
            .await;

        let issuer = issuer_for(&server, ClientCredentials::new("client-a", "secret-a"));
        let credential = issuer.fetch_service_credential().await.unwrap();

        assert_eq!(credential.expose(), "T");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn every_call_hits_the_endpoint() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/token");
                then.status(200).json_body(json!({ "access_token": "T" }));
            })
            .await;

        let issuer = issuer_for(&server, ClientCredentials::new("id", "secret"));
        issuer.fetch_service_credential().await.unwrap();
        issuer.fetch_service_credential().await.unwrap();

        mock.assert_calls_async(2).await;
    }

    #[tokio::test]
    async fn non_success_carries_status_and_error_field() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/token");
                then.status(403).json_body(json!({ "error": "bad_client" }));
            })
            .await;

        let issuer = issuer_for(&server, ClientCredentials::new("id", "wrong"));
        let err = issuer.fetch_service_credential().await.unwrap_err();

        assert!(matches!(err, SdkError::UpstreamAuth { status: 403, .. }));
        let message = err.to_string();
        assert!(message.contains("403"), "{message}");
        assert!(message.contains("bad_client"), "{message}");
    }

    #[tokio::test]
    async fn non_json_error_body_is_kept_verbatim() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/token");
                then.status(502).body("gateway down");
            })
            .await;

        let issuer = issuer_for(&server, ClientCredentials::new("id", "secret"));
        let err = issuer.fetch_service_credential().await.unwrap_err();

        assert_eq!(err.to_string(), "failed to fetch service credential (502): gateway down");
    }

    #[tokio::test]
    async fn missing_access_token_is_an_upstream_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/token");
                then.status(200).json_body(json!({ "token_type": "bearer" }));
            })
            .await;

        let issuer = issuer_for(&server, ClientCredentials::new("id", "secret"));
        let err = issuer.fetch_service_credential().await.unwrap_err();

        assert!(err.to_string().contains("missing access_token"));
    }

    #[tokio::test]
    async fn missing_credentials_fail_before_any_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/oauth2/token");
                then.status(200).json_body(json!({ "access_token": "T" }));
            })
            .await;

        let issuer = issuer_for(&server, ClientCredentials::from_optional(None, None));
        let err = issuer.fetch_service_credential().await.unwrap_err();

        assert!(matches!(err, SdkError::Config(_)));
        mock.assert_calls_async(0).await;
    }
}
