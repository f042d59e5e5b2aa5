//! Platform environment selection and endpoint URLs.
//!
//! Every platform URL embeds an environment segment right after the service
//! label: production uses `https://auth.<domain>`, any other environment
//! `https://auth.<env>.<domain>`. The segment is resolved once at startup.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Default platform domain.
pub const DEFAULT_PLATFORM_DOMAIN: &str = "jtl-cloud.com";

/// Selector value naming the production environment.
const PRODUCTION_SELECTOR: &str = "prod";

/// Environment the relay talks to.
///
/// # Examples
///
/// ```
/// use platform_sdk::PlatformEnvironment;
///
/// assert_eq!(PlatformEnvironment::from_selector(Some("prod")).segment(), "");
/// assert_eq!(PlatformEnvironment::from_selector(Some("dev")).segment(), ".dev");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEnvironment {
    /// The production platform (no segment).
    Production,
    /// A named non-production environment (`.<name>` segment).
    Named(String),
}

impl PlatformEnvironment {
    /// Resolve the selector read from configuration.
    ///
    /// `prod` selects production; anything else, including an absent
    /// selector, becomes a named environment.
    pub fn from_selector(selector: Option<&str>) -> Self {
        match selector {
            Some(PRODUCTION_SELECTOR) => Self::Production,
            Some(name) => Self::Named(name.to_string()),
            None => Self::Named(String::new()),
        }
    }

    /// The URL segment inserted after the service label.
    pub fn segment(&self) -> String {
        match self {
            Self::Production => String::new(),
            Self::Named(name) => format!(".{name}"),
        }
    }

    /// Whether the selector was missing or empty.
    ///
    /// The resulting hosts contain an empty label and will not resolve.
    pub fn is_unnamed(&self) -> bool {
        matches!(self, Self::Named(name) if name.is_empty())
    }
}

impl fmt::Display for PlatformEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => f.write_str(PRODUCTION_SELECTOR),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for PlatformEnvironment {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_selector(Some(s)))
    }
}

/// Base URLs of the platform's auth and API hosts.
///
/// Both bases can be overridden, e.g. to point the relay at a local mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformEndpoints {
    auth_base: String,
    api_base: String,
}

impl PlatformEndpoints {
    /// Derive the endpoints for an environment and domain.
    pub fn from_environment(environment: &PlatformEnvironment, domain: &str) -> Self {
        let segment = environment.segment();
        Self {
            auth_base: format!("https://auth{segment}.{domain}"),
            api_base: format!("https://api{segment}.{domain}"),
        }
    }

    /// Use explicit base URLs.
    pub fn new(auth_base: &str, api_base: &str) -> Self {
        Self {
            auth_base: trim_base(auth_base),
            api_base: trim_base(api_base),
        }
    }

    /// Replace the auth base URL.
    #[must_use]
    pub fn with_auth_base(mut self, auth_base: &str) -> Self {
        self.auth_base = trim_base(auth_base);
        self
    }

    /// Replace the API base URL.
    #[must_use]
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = trim_base(api_base);
        self
    }

    /// Base URL of the auth host.
    pub fn auth_base(&self) -> &str {
        &self.auth_base
    }

    /// Base URL of the API host.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// OAuth2 token endpoint.
    pub fn token_url(&self) -> String {
        format!("{}/oauth2/token", self.auth_base)
    }

    /// Well-known signing key set.
    pub fn jwks_url(&self) -> String {
        format!("{}/account/.well-known/jwks.json", self.api_base)
    }

    /// ERP API URL for `endpoint` (may be empty).
    pub fn erp_url(&self, endpoint: &str) -> String {
        format!("{}/erp/{}", self.api_base, endpoint.trim_start_matches('/'))
    }
}

fn trim_base(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}
