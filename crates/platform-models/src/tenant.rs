//! Tenant and user identifiers.
//!
//! The platform identifies a customer installation by its [`TenantId`].
//! The relay keeps its own [`LocalTenantId`] for each connected tenant and
//! maps it to the platform id after a successful connect handshake.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

// ---------------------------------------------------------------------------
// TenantId
// ---------------------------------------------------------------------------

/// Tenant identifier asserted by the platform.
///
/// # Examples
///
/// ```
/// use platform_models::TenantId;
///
/// let id = TenantId::new("abc");
/// assert_eq!(id.to_string(), "abc");
///
/// let id2: TenantId = "abc".into();
/// assert_eq!(id, id2);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Create a new `TenantId` from a string slice.
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// Return the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TenantId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl FromStr for TenantId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// User identifier asserted by the platform.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a new `UserId` from a string slice.
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// Return the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// LocalTenantId
// ---------------------------------------------------------------------------

/// Relay-side tenant identifier.
///
/// Generated from the wall clock at connect time: the decimal number of
/// milliseconds since the Unix epoch.
///
/// # Examples
///
/// ```
/// use platform_models::LocalTenantId;
///
/// let id: LocalTenantId = "1700000000000".parse().unwrap();
/// assert_eq!(id.next().to_string(), "1700000000001");
/// assert!("tenant-a".parse::<LocalTenantId>().is_err());
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(into = "String", try_from = "String")]
pub struct LocalTenantId(i64);

impl LocalTenantId {
    /// Derive an identifier from a point in time.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(at.timestamp_millis())
    }

    /// The identifier one millisecond later.
    ///
    /// Used to step past an identifier that is already taken.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for LocalTenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LocalTenantId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ModelError::InvalidLocalTenantId {
                value: s.to_string(),
                reason: "expected decimal milliseconds since the Unix epoch".to_string(),
            });
        }
        s.parse::<i64>()
            .map(Self)
            .map_err(|e| ModelError::InvalidLocalTenantId {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl From<LocalTenantId> for String {
    fn from(id: LocalTenantId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for LocalTenantId {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn tenant_id_display_and_equality() {
        let a = TenantId::new("abc");
        let b: TenantId = "abc".into();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "abc");
        assert_eq!(TenantId::from(String::from("abc")), a);
    }

    #[test]
    fn local_tenant_id_uses_epoch_millis() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let id = LocalTenantId::from_datetime(at);
        assert_eq!(id.to_string(), "1700000000123");
        assert_eq!(id.next().to_string(), "1700000000124");
    }

    #[test]
    fn local_tenant_id_rejects_non_digits() {
        for bad in ["", "-5", "12a", "T1", " 12"] {
            let err = bad.parse::<LocalTenantId>().unwrap_err();
            assert!(matches!(err, ModelError::InvalidLocalTenantId { .. }), "{bad}");
        }
    }

    #[test]
    fn local_tenant_id_rejects_overflow() {
        assert!("99999999999999999999999".parse::<LocalTenantId>().is_err());
    }

    #[test]
    fn local_tenant_id_serializes_as_string() {
        let id: LocalTenantId = "42".parse().unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"42\"");
        let back: LocalTenantId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(back, id);
    }
}
