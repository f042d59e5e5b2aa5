//! # Platform SDK
//!
//! Client-side building blocks for talking to the platform API on behalf of
//! a connected application.
//!
//! The SDK provides:
//!
//! * [`PlatformEndpoints`]: auth, key-set and ERP URLs derived from the
//!   environment selector and platform domain.
//! * [`TokenIssuerClient`]: exchanges client credentials for a
//!   [`ServiceCredential`] (no caching, one round trip per call).
//! * [`SessionVerifier`]: verifies EdDSA session tokens against the
//!   platform key set and extracts [`SessionClaims`](platform_models::SessionClaims).
//! * [`SessionSigner`]: mints session tokens; used by the mock platform and
//!   in tests.
//! * [`SdkError`]: unified error type for all SDK operations.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use platform_sdk::{
//!     ClientCredentials, PlatformEndpoints, PlatformEnvironment, SessionVerifier,
//!     TokenIssuerClient,
//! };
//!
//! # async fn run(session_token: &str) -> Result<(), platform_sdk::SdkError> {
//! let endpoints =
//!     PlatformEndpoints::from_environment(&PlatformEnvironment::Production, "jtl-cloud.com");
//! let http = reqwest::Client::new();
//! let issuer = TokenIssuerClient::new(
//!     http.clone(),
//!     &endpoints,
//!     ClientCredentials::new("client-id", "client-secret"),
//! );
//!
//! let verifier = SessionVerifier::new(http, issuer, &endpoints);
//! let claims = verifier.verify_and_extract(session_token).await?;
//! println!("tenant {} user {}", claims.tenant_id, claims.user_id);
//! # Ok(())
//! # }
//! ```

pub mod credentials;
pub mod environment;
pub mod error;
pub mod jwks;
pub mod session;
pub mod signer;
pub mod token;

pub use credentials::{ClientCredentials, ServiceCredential};
pub use environment::{PlatformEndpoints, PlatformEnvironment};
pub use error::SdkError;
pub use jwks::{JwksCache, KeySelection};
pub use session::SessionVerifier;
pub use signer::SessionSigner;
pub use token::TokenIssuerClient;
