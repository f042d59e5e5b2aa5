//! Session token verification.
//!
//! A session token is verified in four steps:
//!
//! 1. Obtain a service credential from the token endpoint.
//! 2. Fetch the platform key set with that credential.
//! 3. Pick a key according to the configured [`KeySelection`].
//! 4. Verify the EdDSA signature and the temporal claims present in the
//!    token, then decode `userId` / `tenantId`.
//!
//! By default the key set is fetched for every verification and the first
//! key is used. A [`JwksCache`] and [`KeySelection::KeyIdOrFirst`] can be
//! configured instead.

use std::time::Duration;

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use platform_models::SessionClaims;
use tracing::{debug, info, warn};

use crate::environment::PlatformEndpoints;
use crate::error::SdkError;
use crate::jwks::{JwksCache, KeySelection};
use crate::token::TokenIssuerClient;

/// Verifies platform session tokens.
#[derive(Debug)]
pub struct SessionVerifier {
    http: reqwest::Client,
    issuer: TokenIssuerClient,
    jwks_url: String,
    key_selection: KeySelection,
    cache: Option<JwksCache>,
    expected_issuer: Option<String>,
    expected_audience: Option<String>,
    leeway_secs: u64,
}

impl SessionVerifier {
    /// Create a verifier using the key set of `endpoints`.
    pub fn new(http: reqwest::Client, issuer: TokenIssuerClient, endpoints: &PlatformEndpoints) -> Self {
        Self {
            http,
            issuer,
            jwks_url: endpoints.jwks_url(),
            key_selection: KeySelection::default(),
            cache: None,
            expected_issuer: None,
            expected_audience: None,
            leeway_secs: 60,
        }
    }

    /// Change how the verification key is picked.
    #[must_use]
    pub fn with_key_selection(mut self, key_selection: KeySelection) -> Self {
        self.key_selection = key_selection;
        self
    }

    /// Reuse a fetched key set for `ttl`.
    #[must_use]
    pub fn with_jwks_cache(mut self, ttl: Duration) -> Self {
        self.cache = Some(JwksCache::new(ttl));
        self
    }

    /// Require the `iss` claim to equal `issuer`.
    #[must_use]
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.expected_issuer = Some(issuer.to_string());
        self
    }

    /// Require the `aud` claim to contain `audience`.
    #[must_use]
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.expected_audience = Some(audience.to_string());
        self
    }

    /// Clock skew tolerated for `exp` / `nbf`.
    #[must_use]
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway_secs = leeway.as_secs();
        self
    }

    /// Verify `session_token` and return its claims.
    ///
    /// # Errors
    ///
    /// * [`SdkError::SignatureVerification`] if the token is malformed, the
    ///   signature does not match the selected key, a present temporal claim
    ///   is out of range, or `userId` / `tenantId` is missing.
    /// * [`SdkError::Jwks`] if the key set cannot be fetched or is empty.
    /// * Any error of [`TokenIssuerClient::fetch_service_credential`].
    pub async fn verify_and_extract(&self, session_token: &str) -> Result<SessionClaims, SdkError> {
        let header = decode_header(session_token).map_err(SdkError::SignatureVerification)?;

        let key_set = self.key_set().await?;
        let jwk = self
            .key_selection
            .select(&key_set, header.kid.as_deref())
            .ok_or_else(|| SdkError::Jwks("key set is empty".into()))?;
        let key = DecodingKey::from_jwk(jwk)
            .map_err(|e| SdkError::Jwks(format!("unusable signing key: {e}")))?;

        let token = decode::<SessionClaims>(session_token, &key, &self.validation()).map_err(|e| {
            warn!(error = %e, "session token rejected");
            SdkError::SignatureVerification(e)
        })?;

        info!(
            tenant_id = %token.claims.tenant_id,
            user_id = %token.claims.user_id,
            "session token verified"
        );
        Ok(token.claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::EdDSA);
        // Temporal and identity claims are checked only when present.
        validation.required_spec_claims.clear();
        validation.validate_nbf = true;
        validation.leeway = self.leeway_secs;

        match &self.expected_audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        if let Some(issuer) = &self.expected_issuer {
            validation.set_issuer(&[issuer]);
        }

        validation
    }

    async fn key_set(&self) -> Result<JwkSet, SdkError> {
        if let Some(keys) = self.cache.as_ref().and_then(JwksCache::get) {
            debug!("using cached signing key set");
            return Ok(keys);
        }

        let credential = self.issuer.fetch_service_credential().await?;

        debug!(jwks_url = %self.jwks_url, "fetching signing key set");
        let res = self
            .http
            .get(&self.jwks_url)
            .bearer_auth(credential.expose())
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(SdkError::Jwks(format!("key set endpoint returned {status}: {text}")));
        }

        let keys: JwkSet = res
            .json()
            .await
            .map_err(|e| SdkError::Jwks(format!("malformed key set: {e}")))?;

        if let Some(cache) = &self.cache {
            cache.store(keys.clone());
        }
        Ok(keys)
    }
}
