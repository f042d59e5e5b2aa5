//! Signing key selection and the optional key-set cache.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{Jwk, JwkSet};

/// How a verification key is picked from the platform key set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeySelection {
    /// Always use the first key in the set.
    #[default]
    First,
    /// Use the key whose `kid` matches the token header, falling back to the
    /// first key when the header has no `kid` or nothing matches.
    KeyIdOrFirst,
}

impl KeySelection {
    /// Pick a key from `set` for a token carrying `kid` in its header.
    pub fn select<'a>(self, set: &'a JwkSet, kid: Option<&str>) -> Option<&'a Jwk> {
        match (self, kid) {
            (Self::KeyIdOrFirst, Some(kid)) => set
                .keys
                .iter()
                .find(|key| key.common.key_id.as_deref() == Some(kid))
                .or_else(|| set.keys.first()),
            _ => set.keys.first(),
        }
    }
}

#[derive(Debug)]
struct CachedKeySet {
    keys: JwkSet,
    fetched_at: Instant,
}

/// Single-entry key-set cache with a fixed time-to-live.
#[derive(Debug)]
pub struct JwksCache {
    ttl: Duration,
    slot: Mutex<Option<CachedKeySet>>,
}

impl JwksCache {
    /// Create an empty cache whose entries expire after `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// The cached key set, if one was stored less than `ttl` ago.
    pub fn get(&self) -> Option<JwkSet> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| cached.keys.clone())
    }

    /// Replace the cached key set.
    pub fn store(&self, keys: JwkSet) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(CachedKeySet {
            keys,
            fetched_at: Instant::now(),
        });
    }
}
