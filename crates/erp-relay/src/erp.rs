//! ERP request forwarding.
//!
//! A relayed call is addressed by a tenant and an ERP endpoint. Both come
//! from the request path, but mutating requests may carry `_tenantId` and
//! `_endpoint` fields in their JSON body instead; those fields are stripped
//! before the body is forwarded.

use axum::Json;
use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use platform_models::TenantId;
use platform_sdk::{PlatformEndpoints, SdkError, TokenIssuerClient};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Header naming the platform tenant on ERP calls.
pub const TENANT_HEADER: &str = "X-Tenant-ID";

const TENANT_OVERRIDE: &str = "_tenantId";
const ENDPOINT_OVERRIDE: &str = "_endpoint";

/// Whether `method` forwards a request body.
pub fn carries_body(method: &Method) -> bool {
    [Method::POST, Method::PUT, Method::PATCH].contains(method)
}

/// Parse a request body for forwarding. An empty body becomes `{}`.
pub fn parse_body(bytes: &[u8]) -> Result<Value, serde_json::Error> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes)
}

/// Whether `endpoint` stays below `/erp/` once joined into the upstream URL.
///
/// Rejects `.` and `..` segments, including percent-encoded dots, as well as
/// backslashes and encoded path separators. The query and fragment are not
/// inspected.
pub fn is_contained_endpoint(endpoint: &str) -> bool {
    let path = endpoint.split(['?', '#']).next().unwrap_or_default();
    if path.contains('\\') {
        return false;
    }
    let path = path.to_ascii_lowercase();
    if path.contains("%2f") || path.contains("%5c") {
        return false;
    }
    !path.split('/').any(|segment| {
        let segment = segment.replace("%2e", ".");
        segment == "." || segment == ".."
    })
}

/// Tenant and endpoint a relayed call is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErpTarget {
    /// Tenant id as given by the caller (local or platform).
    pub tenant_id: String,
    /// ERP endpoint below `/erp/`, possibly empty.
    pub endpoint: String,
}

impl ErpTarget {
    /// Target taken from the request path.
    pub fn from_path(tenant_id: String, endpoint: Option<String>) -> Self {
        Self {
            tenant_id,
            endpoint: endpoint.unwrap_or_default(),
        }
    }

    /// Apply `_tenantId` / `_endpoint` from a JSON object body and remove
    /// them from it.
    ///
    /// Only non-empty strings override the path values; other values are
    /// dropped without effect. Non-object bodies are left untouched.
    pub fn take_overrides(&mut self, body: &mut Value) {
        let Value::Object(fields) = body else {
            return;
        };
        if let Some(tenant_id) = take_string(fields, TENANT_OVERRIDE) {
            self.tenant_id = tenant_id;
        }
        if let Some(endpoint) = take_string(fields, ENDPOINT_OVERRIDE) {
            self.endpoint = endpoint;
        }
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key)? {
        Value::String(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

/// Upstream answer to a relayed call.
#[derive(Debug)]
pub enum UpstreamReply {
    /// Success with a JSON body.
    Json {
        /// Upstream status.
        status: StatusCode,
        /// Parsed upstream body.
        body: Value,
    },
    /// Success without a body.
    Empty {
        /// Upstream status.
        status: StatusCode,
    },
    /// Non-success; status and body are passed through unchanged.
    Failure {
        /// Upstream status.
        status: StatusCode,
        /// Upstream content type, if any.
        content_type: Option<HeaderValue>,
        /// Raw upstream body.
        body: Bytes,
    },
}

impl IntoResponse for UpstreamReply {
    fn into_response(self) -> Response {
        match self {
            Self::Json { status, body } => (status, Json(body)).into_response(),
            Self::Empty { status } => status.into_response(),
            Self::Failure {
                status,
                content_type,
                body,
            } => {
                let content_type =
                    content_type.unwrap_or_else(|| HeaderValue::from_static("text/plain; charset=utf-8"));
                (status, [(CONTENT_TYPE, content_type)], body).into_response()
            }
        }
    }
}

/// Forwards requests to the platform ERP API.
#[derive(Debug, Clone)]
pub struct ErpRelay {
    http: reqwest::Client,
    issuer: TokenIssuerClient,
    endpoints: PlatformEndpoints,
}

impl ErpRelay {
    /// Create a relay for the ERP API of `endpoints`.
    pub fn new(http: reqwest::Client, issuer: TokenIssuerClient, endpoints: PlatformEndpoints) -> Self {
        Self {
            http,
            issuer,
            endpoints,
        }
    }

    /// Forward one call with a fresh service credential.
    ///
    /// A non-success upstream status is not an error: it is returned as
    /// [`UpstreamReply::Failure`] for the caller to pass through.
    pub async fn forward(
        &self,
        method: Method,
        tenant: &TenantId,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<UpstreamReply, SdkError> {
        let credential = self.issuer.fetch_service_credential().await?;
        let url = self.endpoints.erp_url(endpoint);

        debug!(%method, url = %url, tenant_id = %tenant, "forwarding ERP request");

        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(TENANT_HEADER, tenant.as_str())
            .bearer_auth(credential.expose())
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = &body {
            request = request.json(body);
        }

        let res = request.send().await?;
        let status = res.status();
        let content_type = res.headers().get(CONTENT_TYPE).cloned();
        let bytes = res.bytes().await?;

        if !status.is_success() {
            warn!(%method, endpoint, tenant_id = %tenant, status = status.as_u16(), "ERP API returned an error");
            return Ok(UpstreamReply::Failure {
                status,
                content_type,
                body: bytes,
            });
        }

        info!(%method, endpoint, tenant_id = %tenant, status = status.as_u16(), "ERP request relayed");

        if bytes.is_empty() {
            return Ok(UpstreamReply::Empty { status });
        }
        let body = serde_json::from_slice(&bytes)?;
        Ok(UpstreamReply::Json { status, body })
    }
}
