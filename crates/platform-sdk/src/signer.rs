//! EdDSA session token signing.
//!
//! The platform signs session tokens with Ed25519 keys and publishes the
//! public halves as OKP JWKs. [`SessionSigner`] reproduces that side of the
//! exchange so the mock platform and tests can mint tokens the relay will
//! accept.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use ed25519_dalek::SigningKey;
use ed25519_dalek::pkcs8::EncodePrivateKey;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use platform_models::SessionClaims;
use rand::RngCore;
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::SdkError;

/// An Ed25519 key pair able to sign session tokens.
pub struct SessionSigner {
    key_id: String,
    signing_key: SigningKey,
    encoding_key: EncodingKey,
}

impl SessionSigner {
    /// Build a signer from a raw 32-byte Ed25519 seed.
    pub fn from_seed(key_id: &str, seed: [u8; 32]) -> Result<Self, SdkError> {
        let signing_key = SigningKey::from_bytes(&seed);
        let der = signing_key
            .to_pkcs8_der()
            .map_err(|e| SdkError::Signing(format!("failed to encode private key: {e}")))?;
        let encoding_key = EncodingKey::from_ed_der(der.as_bytes());

        Ok(Self {
            key_id: key_id.to_string(),
            signing_key,
            encoding_key,
        })
    }

    /// Build a signer from a freshly generated random seed.
    pub fn generate(key_id: &str) -> Result<Self, SdkError> {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        Self::from_seed(key_id, seed)
    }

    /// Key identifier placed in the token header and the JWK.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// Public key as an OKP JWK.
    pub fn public_jwk(&self) -> Value {
        let x = URL_SAFE_NO_PAD.encode(self.signing_key.verifying_key().to_bytes());
        json!({
            "kty": "OKP",
            "crv": "Ed25519",
            "alg": "EdDSA",
            "use": "sig",
            "kid": self.key_id,
            "x": x,
        })
    }

    /// A key set containing only this signer's public key.
    pub fn jwks(&self) -> Value {
        json!({ "keys": [self.public_jwk()] })
    }

    /// Sign arbitrary claims.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, SdkError> {
        let mut header = Header::new(Algorithm::EdDSA);
        header.kid = Some(self.key_id.clone());

        jsonwebtoken::encode(&header, claims, &self.encoding_key)
            .map_err(|e| SdkError::Signing(e.to_string()))
    }

    /// Sign session claims, adding `iat` and an `exp` of `ttl` from now.
    pub fn sign_session(&self, claims: &SessionClaims, ttl: Duration) -> Result<String, SdkError> {
        let now = Utc::now().timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);

        let mut claims = claims.clone();
        claims.extra.insert("iat".into(), now.into());
        claims
            .extra
            .insert("exp".into(), now.saturating_add(ttl_secs).into());

        self.sign(&claims)
    }
}
