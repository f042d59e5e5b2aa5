//! Local stand-in for the platform auth and ERP APIs.
//!
//! Serves just enough of the platform for the relay to run end to end:
//!
//! | Route | Behaviour |
//! |---|---|
//! | `POST /oauth2/token` | Client-credentials grant with HTTP Basic auth; issues opaque tokens |
//! | `GET /account/.well-known/jwks.json` | Ed25519 key set; requires an issued bearer token |
//! | `POST /session-token` | Mints a session token for `{ userId, tenantId }` |
//! | `ANY /erp/{endpoint}` | Echoes method, endpoint, tenant header and body |

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Form, Json, Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get, post};
use axum::Router;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use platform_models::{SessionClaims, TenantId, UserId};
use platform_sdk::{SdkError, SessionSigner};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

/// Lifetime advertised for issued access tokens.
pub const ACCESS_TOKEN_TTL_SECS: u64 = 3600;

/// Default lifetime of minted session tokens.
pub const SESSION_TOKEN_TTL_SECS: u64 = 3600;

const CLIENT_CREDENTIALS_GRANT: &str = "client_credentials";

/// Errors returned by the mock endpoints, in OAuth2 error-body form.
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    /// Missing or wrong Basic client credentials.
    #[error("client authentication failed")]
    InvalidClient,

    /// A grant other than `client_credentials` was requested.
    #[error("unsupported grant type `{0}`")]
    UnsupportedGrantType(String),

    /// Missing or unknown bearer token.
    #[error("missing or unknown bearer token")]
    InvalidToken,

    /// ERP call without an `X-Tenant-ID` header.
    #[error("missing X-Tenant-ID header")]
    MissingTenant,

    /// ERP call body is not JSON.
    #[error("invalid JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// Signing a session token failed.
    #[error(transparent)]
    Signing(#[from] SdkError),

    /// The issued-token registry lock was poisoned.
    #[error("token registry unavailable")]
    Registry,
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            Self::InvalidClient => (StatusCode::UNAUTHORIZED, "invalid_client"),
            Self::UnsupportedGrantType(_) => (StatusCode::BAD_REQUEST, "unsupported_grant_type"),
            Self::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            Self::MissingTenant | Self::InvalidBody(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Self::Signing(_) | Self::Registry => (StatusCode::INTERNAL_SERVER_ERROR, "server_error"),
        };
        warn!(%status, code, message = %self, "mock platform request rejected");
        (
            status,
            Json(json!({ "error": code, "error_description": self.to_string() })),
        )
            .into_response()
    }
}

/// Mock platform state: one client registration and one signing key.
pub struct MockPlatform {
    client_id: String,
    client_secret: String,
    signer: SessionSigner,
    issued: Mutex<HashSet<String>>,
}

impl MockPlatform {
    /// Accept `client_id`/`client_secret` and sign with `signer`.
    pub fn new(client_id: &str, client_secret: &str, signer: SessionSigner) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            signer,
            issued: Mutex::new(HashSet::new()),
        }
    }

    /// The session token signer.
    pub fn signer(&self) -> &SessionSigner {
        &self.signer
    }

    /// Number of access tokens issued so far.
    pub fn issued_count(&self) -> Result<usize, MockError> {
        Ok(self.issued.lock().map_err(|_| MockError::Registry)?.len())
    }

    fn authenticate_client(&self, headers: &HeaderMap) -> Result<(), MockError> {
        let (id, secret) = basic_credentials(headers).ok_or(MockError::InvalidClient)?;
        if id == self.client_id && secret == self.client_secret {
            Ok(())
        } else {
            Err(MockError::InvalidClient)
        }
    }

    fn issue_token(&self) -> Result<String, MockError> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        self.issued
            .lock()
            .map_err(|_| MockError::Registry)?
            .insert(token.clone());
        Ok(token)
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<(), MockError> {
        let token = bearer_token(headers).ok_or(MockError::InvalidToken)?;
        let issued = self.issued.lock().map_err(|_| MockError::Registry)?;
        if issued.contains(token) {
            Ok(())
        } else {
            Err(MockError::InvalidToken)
        }
    }
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = String::from_utf8(STANDARD.decode(encoded.trim()).ok()?).ok()?;
    let (id, secret) = decoded.split_once(':')?;
    Some((id.to_string(), secret.to_string()))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// Form body of `POST /oauth2/token`.
#[derive(Deserialize)]
struct TokenRequest {
    grant_type: String,
}

/// Body of `POST /session-token`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionTokenRequest {
    user_id: UserId,
    tenant_id: TenantId,
    #[serde(default)]
    ttl_secs: Option<u64>,
}

/// Response of `POST /session-token`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionTokenResponse {
    session_token: String,
}

/// Build the mock platform routes.
pub fn router(platform: Arc<MockPlatform>) -> Router {
    Router::new()
        .route("/oauth2/token", post(token))
        .route("/account/.well-known/jwks.json", get(jwks))
        .route("/session-token", post(session_token))
        .route("/erp/", any(erp_root))
        .route("/erp/{*endpoint}", any(erp))
        .with_state(platform)
}

/// `POST /oauth2/token`: issue an opaque access token.
async fn token(
    State(platform): State<Arc<MockPlatform>>,
    headers: HeaderMap,
    Form(req): Form<TokenRequest>,
) -> Result<Json<Value>, MockError> {
    if req.grant_type != CLIENT_CREDENTIALS_GRANT {
        return Err(MockError::UnsupportedGrantType(req.grant_type));
    }
    platform.authenticate_client(&headers)?;

    let access_token = platform.issue_token()?;
    info!("access token issued");

    Ok(Json(json!({
        "access_token": access_token,
        "token_type": "Bearer",
        "expires_in": ACCESS_TOKEN_TTL_SECS,
    })))
}

/// `GET /account/.well-known/jwks.json`: public signing keys.
async fn jwks(
    State(platform): State<Arc<MockPlatform>>,
    headers: HeaderMap,
) -> Result<Json<Value>, MockError> {
    platform.authorize(&headers)?;
    Ok(Json(platform.signer.jwks()))
}

/// `POST /session-token`: mint a session token as the hosting app would.
async fn session_token(
    State(platform): State<Arc<MockPlatform>>,
    Json(req): Json<SessionTokenRequest>,
) -> Result<Json<SessionTokenResponse>, MockError> {
    let ttl = Duration::from_secs(req.ttl_secs.unwrap_or(SESSION_TOKEN_TTL_SECS));
    let claims = SessionClaims::new(req.user_id, req.tenant_id);
    let session_token = platform.signer.sign_session(&claims, ttl)?;

    info!(user_id = %claims.user_id, tenant_id = %claims.tenant_id, "session token minted");
    Ok(Json(SessionTokenResponse { session_token }))
}

async fn erp_root(
    State(platform): State<Arc<MockPlatform>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, MockError> {
    echo_erp(&platform, &method, &headers, "", &body)
}

/// `ANY /erp/{endpoint}`: echo the call back.
async fn erp(
    State(platform): State<Arc<MockPlatform>>,
    method: Method,
    headers: HeaderMap,
    Path(endpoint): Path<String>,
    body: Bytes,
) -> Result<Json<Value>, MockError> {
    echo_erp(&platform, &method, &headers, &endpoint, &body)
}

fn echo_erp(
    platform: &MockPlatform,
    method: &Method,
    headers: &HeaderMap,
    endpoint: &str,
    body: &[u8],
) -> Result<Json<Value>, MockError> {
    platform.authorize(headers)?;
    let tenant_id = headers
        .get("x-tenant-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(MockError::MissingTenant)?;

    let body: Value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(body)?
    };

    info!(%method, endpoint, tenant_id, "ERP call echoed");
    Ok(Json(json!({
        "method": method.as_str(),
        "endpoint": endpoint,
        "tenantId": tenant_id,
        "body": body,
    })))
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderName, HeaderValue};
    use axum_test::TestServer;
    use platform_sdk::{
        ClientCredentials, PlatformEndpoints, SessionVerifier, TokenIssuerClient,
    };

    use super::*;

    const CLIENT_ID: &str = "mock-client";
    const CLIENT_SECRET: &str = "mock-secret";

    fn platform() -> Arc<MockPlatform> {
        let signer = SessionSigner::from_seed("mock-key-1", [5u8; 32]).unwrap();
        Arc::new(MockPlatform::new(CLIENT_ID, CLIENT_SECRET, signer))
    }

    fn basic(id: &str, secret: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Basic {}", STANDARD.encode(format!("{id}:{secret}")))).unwrap()
    }

    async fn issue(server: &TestServer) -> String {
        let res = server
            .post("/oauth2/token")
            .add_header(AUTHORIZATION, basic(CLIENT_ID, CLIENT_SECRET))
            .form(&[("grant_type", "client_credentials")])
            .await;
        res.assert_status_ok();
        res.json::<Value>()["access_token"].as_str().unwrap().to_string()
    }

    fn bearer(token: &str) -> HeaderValue {
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
    }

    #[tokio::test]
    async fn token_requires_registered_client() {
        let state = platform();
        let server = TestServer::new(router(state.clone())).unwrap();

        let res = server
            .post("/oauth2/token")
            .add_header(AUTHORIZATION, basic(CLIENT_ID, "wrong"))
            .form(&[("grant_type", "client_credentials")])
            .await;

        res.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(res.json::<Value>()["error"], "invalid_client");
        assert_eq!(state.issued_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn token_rejects_other_grants() {
        let server = TestServer::new(router(platform())).unwrap();

        let res = server
            .post("/oauth2/token")
            .add_header(AUTHORIZATION, basic(CLIENT_ID, CLIENT_SECRET))
            .form(&[("grant_type", "password")])
            .await;

        res.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(res.json::<Value>()["error"], "unsupported_grant_type");
    }

    #[tokio::test]
    async fn each_exchange_issues_a_new_token() {
        let state = platform();
        let server = TestServer::new(router(state.clone())).unwrap();

        let first = issue(&server).await;
        let second = issue(&server).await;

        assert_ne!(first, second);
        assert_eq!(state.issued_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn jwks_requires_issued_token() {
        let state = platform();
        let server = TestServer::new(router(state.clone())).unwrap();

        server
            .get("/account/.well-known/jwks.json")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/account/.well-known/jwks.json")
            .add_header(AUTHORIZATION, bearer("made-up"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);

        let token = issue(&server).await;
        let res = server
            .get("/account/.well-known/jwks.json")
            .add_header(AUTHORIZATION, bearer(&token))
            .await;

        res.assert_status_ok();
        res.assert_json(&state.signer().jwks());
    }

    #[tokio::test]
    async fn erp_echoes_call() {
        let server = TestServer::new(router(platform())).unwrap();
        let token = issue(&server).await;

        let res = server
            .post("/erp/orders/42")
            .add_header(AUTHORIZATION, bearer(&token))
            .add_header(HeaderName::from_static("x-tenant-id"), HeaderValue::from_static("T1"))
            .json(&json!({ "foo": 1 }))
            .await;

        res.assert_status_ok();
        res.assert_json(&json!({
            "method": "POST",
            "endpoint": "orders/42",
            "tenantId": "T1",
            "body": { "foo": 1 },
        }));
    }

    #[tokio::test]
    async fn erp_requires_tenant_header() {
        let server = TestServer::new(router(platform())).unwrap();
        let token = issue(&server).await;

        let res = server
            .get("/erp/orders")
            .add_header(AUTHORIZATION, bearer(&token))
            .await;

        res.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn minted_session_token_verifies_through_sdk() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(platform())).await.unwrap();
        });

        let base = format!("http://{addr}");
        let http = reqwest::Client::new();
        let minted: Value = http
            .post(format!("{base}/session-token"))
            .json(&json!({ "userId": "u1", "tenantId": "abc" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let session_token = minted["sessionToken"].as_str().unwrap();

        let endpoints = PlatformEndpoints::new(&base, &base);
        let issuer = TokenIssuerClient::new(
            http.clone(),
            &endpoints,
            ClientCredentials::new(CLIENT_ID, CLIENT_SECRET),
        );
        let verifier = SessionVerifier::new(http, issuer, &endpoints);

        let claims = verifier.verify_and_extract(session_token).await.unwrap();
        assert_eq!(claims.user_id, UserId::new("u1"));
        assert_eq!(claims.tenant_id, TenantId::new("abc"));
    }
}
