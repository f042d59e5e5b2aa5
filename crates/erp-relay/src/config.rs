//! Relay configuration.
//!
//! Values come from command-line flags, falling back to environment
//! variables. A `.env` file in the working directory is loaded first.

use std::time::Duration;

use clap::Parser;
use platform_sdk::environment::DEFAULT_PLATFORM_DOMAIN;
use platform_sdk::{ClientCredentials, KeySelection, PlatformEndpoints, PlatformEnvironment};

/// Default listen port of the relay.
pub const DEFAULT_PORT: u16 = 50143;

/// Relay settings.
#[derive(Clone, Debug, Parser)]
#[command(name = "erp-relay", about = "Relays tenant-scoped ERP requests to the platform API")]
pub struct RelayConfig {
    /// OAuth client id used for the client-credentials exchange.
    #[arg(long, env = "CLIENT_ID")]
    pub client_id: Option<String>,

    /// OAuth client secret used for the client-credentials exchange.
    #[arg(long, env = "CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Platform environment: `prod`, or the name of a staging environment.
    #[arg(long, env = "API_ENVIRONMENT")]
    pub api_environment: Option<String>,

    /// Platform domain the auth and API hosts live under.
    #[arg(long, env = "PLATFORM_DOMAIN", default_value = DEFAULT_PLATFORM_DOMAIN)]
    pub platform_domain: String,

    /// Override the auth host base URL (e.g. a local mock platform).
    #[arg(long, env = "PLATFORM_AUTH_URL")]
    pub auth_base_url: Option<String>,

    /// Override the API host base URL (e.g. a local mock platform).
    #[arg(long, env = "PLATFORM_API_URL")]
    pub api_base_url: Option<String>,

    /// HTTP listen port.
    #[arg(long, env = "RELAY_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// CORS origins allowed to call the relay. Empty or `*` allows any.
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Timeout in seconds for every outbound platform call.
    #[arg(long, env = "RELAY_HTTP_TIMEOUT_SECS", default_value_t = 30)]
    pub http_timeout_secs: u64,

    /// Cache the signing key set for this many seconds. Unset: always refetch.
    #[arg(long, env = "JWKS_CACHE_TTL_SECS")]
    pub jwks_cache_ttl_secs: Option<u64>,

    /// Select the signing key by the token's `kid` instead of taking the first key.
    #[arg(long, env = "JWKS_MATCH_KEY_ID")]
    pub match_key_id: bool,
}

impl RelayConfig {
    /// Load `.env`, then parse flags and environment.
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    /// The environment selected by `API_ENVIRONMENT`.
    pub fn environment(&self) -> PlatformEnvironment {
        PlatformEnvironment::from_selector(self.api_environment.as_deref())
    }

    /// Platform URLs, with any configured overrides applied.
    pub fn endpoints(&self) -> PlatformEndpoints {
        let mut endpoints = PlatformEndpoints::from_environment(&self.environment(), &self.platform_domain);
        if let Some(auth) = &self.auth_base_url {
            endpoints = endpoints.with_auth_base(auth);
        }
        if let Some(api) = &self.api_base_url {
            endpoints = endpoints.with_api_base(api);
        }
        endpoints
    }

    /// Client credentials as configured (possibly incomplete).
    pub fn credentials(&self) -> ClientCredentials {
        ClientCredentials::from_optional(self.client_id.clone(), self.client_secret.clone())
    }

    /// Outbound request timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Key-set cache lifetime, if caching is enabled.
    pub fn jwks_cache_ttl(&self) -> Option<Duration> {
        self.jwks_cache_ttl_secs.map(Duration::from_secs)
    }

    /// How the session verifier picks its key.
    pub fn key_selection(&self) -> KeySelection {
        if self.match_key_id {
            KeySelection::KeyIdOrFirst
        } else {
            KeySelection::First
        }
    }
}

#[cfg(test)]
impl RelayConfig {
    /// Configuration with every setting spelled out, independent of the
    /// process environment.
    pub(crate) fn fixture() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_environment: Some("prod".into()),
            platform_domain: DEFAULT_PLATFORM_DOMAIN.into(),
            auth_base_url: None,
            api_base_url: None,
            port: DEFAULT_PORT,
            allowed_origins: Vec::new(),
            http_timeout_secs: 30,
            jwks_cache_ttl_secs: None,
            match_key_id: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn parse(args: &[&str]) -> RelayConfig {
        let mut argv = vec!["erp-relay"];
        argv.extend_from_slice(args);
        RelayConfig::try_parse_from(argv).unwrap()
    }

    fn default_of(id: &str) -> String {
        let command = RelayConfig::command();
        let arg = command
            .get_arguments()
            .find(|arg| arg.get_id() == id)
            .unwrap();
        arg.get_default_values()[0].to_string_lossy().into_owned()
    }

    #[test]
    fn production_environment_has_no_segment() {
        let cfg = RelayConfig {
            platform_domain: "example.com".into(),
            ..RelayConfig::fixture()
        };
        assert_eq!(cfg.endpoints().token_url(), "https://auth.example.com/oauth2/token");
    }

    #[test]
    fn named_environment_and_overrides() {
        let cfg = RelayConfig {
            api_environment: Some("dev".into()),
            api_base_url: Some("http://127.0.0.1:4000/".into()),
            ..RelayConfig::fixture()
        };
        let endpoints = cfg.endpoints();
        assert_eq!(endpoints.token_url(), "https://auth.dev.jtl-cloud.com/oauth2/token");
        assert_eq!(endpoints.erp_url("orders"), "http://127.0.0.1:4000/erp/orders");
    }

    #[test]
    fn declared_defaults() {
        assert_eq!(default_of("port"), DEFAULT_PORT.to_string());
        assert_eq!(default_of("http_timeout_secs"), "30");
        assert_eq!(default_of("platform_domain"), DEFAULT_PLATFORM_DOMAIN);
        assert_eq!(RelayConfig::fixture().http_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn flags_are_parsed() {
        let cfg = parse(&[
            "--api-environment",
            "qa",
            "--port",
            "8080",
            "--http-timeout-secs",
            "5",
            "--match-key-id",
            "--jwks-cache-ttl-secs",
            "120",
        ]);
        assert_eq!(cfg.environment(), PlatformEnvironment::Named("qa".into()));
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.http_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.key_selection(), KeySelection::KeyIdOrFirst);
        assert_eq!(cfg.jwks_cache_ttl(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn key_policy_defaults_to_first_key_without_cache() {
        let cfg = RelayConfig::fixture();
        assert_eq!(cfg.key_selection(), KeySelection::First);
        assert_eq!(cfg.jwks_cache_ttl(), None);
    }

    #[test]
    fn allowed_origins_are_comma_separated() {
        let cfg = parse(&["--allowed-origins", "http://localhost:50142,https://app.example"]);
        assert_eq!(cfg.allowed_origins, vec!["http://localhost:50142", "https://app.example"]);
    }

    #[test]
    fn credentials_are_checked_lazily() {
        let cfg = RelayConfig {
            client_id: Some("id".into()),
            ..RelayConfig::fixture()
        };
        assert!(!cfg.credentials().is_complete());
        let cfg = RelayConfig {
            client_id: Some("id".into()),
            client_secret: Some("secret".into()),
            ..RelayConfig::fixture()
        };
        assert!(cfg.credentials().is_complete());
    }
}
