//! Application wiring: shared state and middleware.

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use platform_sdk::{SessionVerifier, TokenIssuerClient};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::RelayConfig;
use crate::erp::ErpRelay;
use crate::routes;
use crate::tenant_store::{InMemoryTenantStore, TenantStore};

/// State shared across all handlers.
pub struct AppState {
    /// Verifies session tokens on `/connect-tenant`.
    pub verifier: SessionVerifier,
    /// Forwards `/erp-info` calls.
    pub relay: ErpRelay,
    /// Local-to-platform tenant mapping.
    pub tenants: Arc<dyn TenantStore>,
}

impl AppState {
    /// Build the state from configuration with an in-memory tenant store.
    pub fn from_config(config: &RelayConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()?;
        let endpoints = config.endpoints();
        let issuer = TokenIssuerClient::new(http.clone(), &endpoints, config.credentials());

        let mut verifier = SessionVerifier::new(http.clone(), issuer.clone(), &endpoints)
            .with_key_selection(config.key_selection());
        if let Some(ttl) = config.jwks_cache_ttl() {
            info!(ttl_secs = ttl.as_secs(), "signing key set cache enabled");
            verifier = verifier.with_jwks_cache(ttl);
        }

        info!(
            auth_base = endpoints.auth_base(),
            api_base = endpoints.api_base(),
            "platform endpoints resolved"
        );

        Ok(Self {
            verifier,
            relay: ErpRelay::new(http, issuer, endpoints),
            tenants: Arc::new(InMemoryTenantStore::new()),
        })
    }
}

/// CORS policy for `origins`. Empty or containing `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Routes plus CORS and request tracing.
pub fn build_app(state: Arc<AppState>, origins: &[String]) -> Router {
    routes::router(state)
        .layer(cors_layer(origins))
        .layer(TraceLayer::new_for_http())
}
