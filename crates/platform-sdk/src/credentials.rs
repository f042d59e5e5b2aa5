//! Client credentials and the service credential obtained with them.

use std::fmt;

use crate::error::SdkError;

/// OAuth client id/secret pair read from process configuration.
///
/// Either half may be absent; the pair is only checked when a token is
/// requested.
#[derive(Clone, Default)]
pub struct ClientCredentials {
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl ClientCredentials {
    /// A complete id/secret pair.
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        Self {
            client_id: Some(client_id.to_string()),
            client_secret: Some(client_secret.to_string()),
        }
    }

    /// A pair as read from configuration, possibly incomplete.
    pub fn from_optional(client_id: Option<String>, client_secret: Option<String>) -> Self {
        Self {
            client_id,
            client_secret,
        }
    }

    /// Whether both the id and the secret are present and non-empty.
    pub fn is_complete(&self) -> bool {
        self.require().is_ok()
    }

    /// Borrow the id and secret, or fail with a configuration error.
    pub(crate) fn require(&self) -> Result<(&str, &str), SdkError> {
        match (non_empty(&self.client_id), non_empty(&self.client_secret)) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(SdkError::Config(
                "CLIENT_ID and CLIENT_SECRET must be defined".into(),
            )),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Bearer token authorizing relay-to-platform calls.
///
/// Obtained per call from the token endpoint; its expiry is tracked by the
/// issuer only.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceCredential(String);

impl ServiceCredential {
    /// Wrap an access token.
    pub fn new(token: &str) -> Self {
        Self(token.to_string())
    }

    /// The raw token. Callers must avoid logging it.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ServiceCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServiceCredential").field(&"<redacted>").finish()
    }
}
