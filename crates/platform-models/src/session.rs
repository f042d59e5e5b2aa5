//! Claims carried by a platform session token.
//!
//! The platform signs a compact JWS for the hosting application's current
//! user. Besides the standard temporal claims it asserts the user and the
//! tenant the user is acting for.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tenant::{TenantId, UserId};

/// Verified payload of a session token.
///
/// Standard and vendor-specific claims other than `userId` and `tenantId`
/// are kept in [`extra`](Self::extra).
///
/// # Examples
///
/// ```
/// use platform_models::SessionClaims;
///
/// let claims: SessionClaims =
///     serde_json::from_str(r#"{"userId":"u1","tenantId":"abc","exp":1}"#).unwrap();
/// assert_eq!(claims.tenant_id.as_str(), "abc");
/// assert_eq!(claims.extra["exp"], 1);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    /// User the session belongs to.
    pub user_id: UserId,
    /// Platform tenant the user is acting for.
    pub tenant_id: TenantId,
    /// Remaining claims (`exp`, `iat`, `iss`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SessionClaims {
    /// Build claims for a user and tenant without extra claims.
    pub fn new(user_id: UserId, tenant_id: TenantId) -> Self {
        Self {
            user_id,
            tenant_id,
            extra: Map::new(),
        }
    }
}
