//! In-process cache of the last loaded or saved index.

use super::model::Index;
use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};
use std::sync::Arc;

/// Hex SHA-256 of the serialized index bytes.
#[must_use]
pub fn digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

#[derive(Debug, Clone)]
struct Slot {
    index: Arc<Index>,
    digest: String,
    validated_at: DateTime<Utc>,
}

/// A single cached index snapshot with a time-to-live.
///
/// Within the TTL the snapshot is trusted without touching disk. After that
/// the caller re-reads the file and compares digests; a match renews the
/// slot via [`IndexCache::touch`].
#[derive(Debug, Clone)]
pub struct IndexCache {
    ttl: Duration,
    slot: Option<Slot>,
}

impl IndexCache {
    /// An empty cache.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, slot: None }
    }

    /// The cached index, if it was validated less than a TTL ago.
    #[must_use]
    pub fn fresh(&self, now: DateTime<Utc>) -> Option<Arc<Index>> {
        self.slot
            .as_ref()
            .filter(|slot| now - slot.validated_at < self.ttl)
            .map(|slot| Arc::clone(&slot.index))
    }

    /// The cached index, if its bytes hashed to `digest`.
    #[must_use]
    pub fn matching(&self, digest: &str) -> Option<Arc<Index>> {
        self.slot
            .as_ref()
            .filter(|slot| slot.digest == digest)
            .map(|slot| Arc::clone(&slot.index))
    }

    /// Replaces the cached snapshot.
    pub fn store(&mut self, index: Arc<Index>, digest: String, now: DateTime<Utc>) {
        self.slot = Some(Slot {
            index,
            digest,
            validated_at: now,
        });
    }

    /// Restarts the TTL of the current snapshot.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if let Some(slot) = &mut self.slot {
            slot.validated_at = now;
        }
    }

    /// Drops the cached snapshot.
    pub fn invalidate(&mut self) {
        self.slot = None;
    }
}
