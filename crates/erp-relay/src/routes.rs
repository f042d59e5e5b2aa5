//! HTTP handlers.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, Path, State};
use axum::http::Method;
use axum::routing::{any, get, post};
use chrono::Utc;
use platform_models::{LocalTenantId, TenantId};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::app::AppState;
use crate::erp::{self, ErpTarget, UpstreamReply};
use crate::error::RelayError;
use crate::tenant_store::{self, TenantStore};

/// Greeting returned by `GET /`.
pub const GREETING: &str = "Hello from the platform ERP relay!";

/// Body of `POST /connect-tenant`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectTenantRequest {
    /// Session token handed out by the hosting application.
    session_token: String,
}

/// Build the relay routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(greeting))
        .route("/test", post(echo))
        .route("/connect-tenant", post(connect_tenant))
        .route("/erp-info/{tenant_id}", any(erp_info_for_tenant))
        .route("/erp-info/{tenant_id}/{*endpoint}", any(erp_info))
        .with_state(state)
}

/// `GET /`: liveness probe.
async fn greeting() -> &'static str {
    GREETING
}

/// `POST /test`: echo the JSON body.
async fn echo(Json(body): Json<Value>) -> Json<Value> {
    Json(body)
}

/// `POST /connect-tenant`: verify a session token and record the tenant.
async fn connect_tenant(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConnectTenantRequest>, JsonRejection>,
) -> Result<String, RelayError> {
    let Json(req) = payload?;
    let claims = state.verifier.verify_and_extract(&req.session_token).await?;

    let local = tenant_store::register(state.tenants.as_ref(), &claims.tenant_id, Utc::now())?;
    info!(
        local_tenant_id = %local,
        tenant_id = %claims.tenant_id,
        user_id = %claims.user_id,
        "tenant connected"
    );

    Ok(format!(
        "The tenant ID is {local} and the platform tenant ID is {}",
        claims.tenant_id
    ))
}

/// `ANY /erp-info/{tenant_id}`: relay with an empty endpoint.
async fn erp_info_for_tenant(
    State(state): State<Arc<AppState>>,
    method: Method,
    Path(tenant_id): Path<String>,
    body: Bytes,
) -> Result<UpstreamReply, RelayError> {
    relay(&state, method, ErpTarget::from_path(tenant_id, None), &body).await
}

/// `ANY /erp-info/{tenant_id}/{endpoint}`: relay to an ERP endpoint.
async fn erp_info(
    State(state): State<Arc<AppState>>,
    method: Method,
    Path((tenant_id, endpoint)): Path<(String, String)>,
    body: Bytes,
) -> Result<UpstreamReply, RelayError> {
    relay(&state, method, ErpTarget::from_path(tenant_id, Some(endpoint)), &body).await
}

async fn relay(
    state: &AppState,
    method: Method,
    mut target: ErpTarget,
    raw_body: &[u8],
) -> Result<UpstreamReply, RelayError> {
    let body = if erp::carries_body(&method) {
        let mut body = erp::parse_body(raw_body).map_err(RelayError::InvalidBody)?;
        target.take_overrides(&mut body);
        Some(body)
    } else {
        None
    };

    if !erp::is_contained_endpoint(&target.endpoint) {
        return Err(RelayError::InvalidEndpoint(target.endpoint));
    }

    let tenant = resolve_tenant(state.tenants.as_ref(), &target.tenant_id)?;

    state
        .relay
        .forward(method, &tenant, &target.endpoint, body)
        .await
        .map_err(RelayError::Relay)
}

/// Map a local tenant id to its platform tenant; other ids pass through.
fn resolve_tenant(store: &dyn TenantStore, tenant_id: &str) -> Result<TenantId, RelayError> {
    if let Ok(local) = tenant_id.parse::<LocalTenantId>()
        && let Some(tenant) = store.get(&local)?
    {
        debug!(local_tenant_id = %local, tenant_id = %tenant, "resolved local tenant id");
        return Ok(tenant);
    }
    Ok(TenantId::new(tenant_id))
}
