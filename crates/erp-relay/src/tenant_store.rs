//! Tenant mapping storage.
//!
//! The relay records which platform tenant each of its local tenant ids
//! belongs to. [`TenantStore`] is the seam for swapping the in-memory table
//! for a persistent backend.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use platform_models::{LocalTenantId, TenantId};
use tracing::debug;

/// Errors raised by a tenant store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or is in an unusable state.
    #[error("tenant store unavailable: {0}")]
    Unavailable(String),
}

/// Local-to-platform tenant mapping.
///
/// Implementations never overwrite an existing key.
pub trait TenantStore: Send + Sync {
    /// Look up the platform tenant for a local id.
    fn get(&self, local: &LocalTenantId) -> Result<Option<TenantId>, StoreError>;

    /// Insert a mapping. Returns `false` without modifying the store if
    /// `local` is already taken.
    fn put(&self, local: LocalTenantId, tenant: TenantId) -> Result<bool, StoreError>;
}

/// Register `tenant` under a fresh local id derived from `now`.
///
/// If the millisecond is already taken the id is stepped forward until a
/// free one is found.
pub fn register(
    store: &dyn TenantStore,
    tenant: &TenantId,
    now: DateTime<Utc>,
) -> Result<LocalTenantId, StoreError> {
    let mut candidate = LocalTenantId::from_datetime(now);
    while !store.put(candidate, tenant.clone())? {
        debug!(local_tenant_id = %candidate, "local tenant id taken, stepping forward");
        candidate = candidate.next();
    }
    Ok(candidate)
}

/// Process-lifetime tenant mapping guarded by a mutex.
#[derive(Debug, Default)]
pub struct InMemoryTenantStore {
    entries: Mutex<HashMap<LocalTenantId, TenantId>>,
}

impl InMemoryTenantStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded mappings.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    /// Whether no mapping has been recorded.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<LocalTenantId, TenantId>>, StoreError> {
        self.entries
            .lock()
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}

impl TenantStore for InMemoryTenantStore {
    fn get(&self, local: &LocalTenantId) -> Result<Option<TenantId>, StoreError> {
        Ok(self.lock()?.get(local).cloned())
    }

    fn put(&self, local: LocalTenantId, tenant: TenantId) -> Result<bool, StoreError> {
        let mut entries = self.lock()?;
        if entries.contains_key(&local) {
            return Ok(false);
        }
        entries.insert(local, tenant);
        Ok(true)
    }
}
