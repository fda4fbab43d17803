use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::RwLock;
use std::time::{Duration, Instant};

struct CacheEntry {
    identity: String,
    inserted_at: Instant,
}

/// Address → last-known identity map with a time-to-live window, used to
/// short-circuit repeated resolution of the same device. Entries older than
/// the TTL are treated as absent. Safe to share across concurrent
/// resolution calls.
pub struct IdentityCache {
    ttl: Duration,
    entries: RwLock<HashMap<IpAddr, CacheEntry>>,
}

impl IdentityCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Look up a still-fresh identity for the address
    pub fn get(&self, addr: IpAddr) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(&addr)
            .filter(|entry| entry.inserted_at.elapsed() < self.ttl)
            .map(|entry| entry.identity.clone())
    }

    pub fn insert(&self, addr: IpAddr, identity: String) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            addr,
            CacheEntry {
                identity,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Drop entries past their TTL so the map does not grow unbounded
    pub fn purge_expired(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
    }
}
