//! Opt-in session pooling.
//!
//! By default every payment attempt logs in again. When
//! `session_pool_ttl_secs` is configured, a [`SessionCache`] keeps each
//! merchant's session for that long so consecutive attempts can skip the
//! login call. Entries are keyed by the whole credential, so a changed API
//! key logs in again.
//!
//! # Thread Safety
//!
//! Entries live behind a `Mutex`. A poisoned lock is treated as an empty
//! cache: lookups miss and writes are dropped, which only costs an extra
//! login.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};

use crate::auth::Session;
use crate::config::ProcessorConfig;
use crate::protocol::Credential;

/// Cache key: username, application and a digest of the API key.
type CacheKey = (String, u32, [u8; 32]);

#[derive(Clone)]
struct CachedSession {
    session: Session,
    expires_at: Instant,
}

/// Sessions shared between payment attempts.
pub struct SessionCache {
    ttl: Duration,
    entries: Mutex<HashMap<CacheKey, CachedSession>>,
}

fn key(credential: &Credential) -> CacheKey {
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&Sha256::digest(credential.password.as_bytes()));
    (credential.username.clone(), credential.application_id, digest)
}

impl SessionCache {
    /// Cache keeping sessions for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cache for `config`, or `None` when pooling is disabled.
    pub fn from_config(config: &ProcessorConfig) -> Option<Self> {
        config
            .session_pool_ttl_secs
            .map(|secs| Self::new(Duration::from_secs(secs)))
    }

    /// Time-to-live of new entries.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live session for `credential`, evicting it if it has expired.
    pub fn get(&self, credential: &Credential) -> Option<Session> {
        let mut entries = self.entries.lock().ok()?;
        let key = key(credential);

        let expired = entries
            .get(&key)
            .map(|entry| Instant::now() >= entry.expires_at)?;

        if expired {
            entries.remove(&key);
            #[cfg(feature = "tracing")]
            tracing::debug!(username = %credential.username, "session cache entry expired");
            return None;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(username = %credential.username, "session cache hit");
        entries.get(&key).map(|entry| entry.session.clone())
    }

    /// Store `session` for `credential`.
    pub fn insert(&self, credential: &Credential, session: Session) {
        let Ok(mut entries) = self.entries.lock() else {
            #[cfg(feature = "tracing")]
            tracing::warn!("session cache lock poisoned; not caching session");
            return;
        };
        let Some(expires_at) = Instant::now().checked_add(self.ttl) else {
            #[cfg(feature = "tracing")]
            tracing::warn!(ttl = ?self.ttl, "session cache ttl out of range; not caching session");
            return;
        };
        entries.insert(key(credential), CachedSession { session, expires_at });
    }

    /// Drop the session for `credential`.
    pub fn invalidate(&self, credential: &Credential) {
        if let Ok(mut entries) = self.entries.lock() {
            if entries.remove(&key(credential)).is_some() {
                #[cfg(feature = "tracing")]
                tracing::debug!(username = %credential.username, "session cache entry invalidated");
            }
        }
    }

    /// Drop every session.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Number of stored entries, expired ones included.
    ///
    /// Returns 0 if the lock is poisoned.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}
