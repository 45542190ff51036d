//! Contents cache
//!
//! Path-keyed cache of the last-known remote representation. Reads populate
//! through the remote store; sync operations patch records in place after a
//! confirmed write. The remote's read path may lag its write path, so
//! refetching immediately after a write could resurrect stale data; the
//! patch path therefore never touches the network.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::sync::Cache;
use tracing::{debug, trace};

use crate::github::{Contents, ContentsApi, GithubError};

/// Cache address: one remote object on one branch.
///
/// Equality is exact; no case folding or normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    /// Repository-relative path
    pub path: String,
    /// Branch the object lives on
    pub branch: String,
}

impl Address {
    pub fn new(path: impl Into<String>, branch: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            branch: branch.into(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.branch, self.path)
    }
}

/// Address-keyed cache with read-through population and optimistic patching
///
/// Records live for the whole session; there is no TTL and no background
/// refresh. Only the sync operations call [`ContentsCache::patch`].
pub struct ContentsCache {
    /// Cached records by address
    records: Cache<Address, Contents>,
    /// Remote store used to populate misses
    api: Arc<dyn ContentsApi>,
    /// Cache hit counter
    hits: AtomicU64,
    /// Cache miss counter
    misses: AtomicU64,
}

impl ContentsCache {
    /// Create a cache that populates misses through `api`
    pub fn new(api: Arc<dyn ContentsApi>) -> Self {
        let records = Cache::builder().name("contents_cache").build();

        Self {
            records,
            api,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Read a record, fetching from the remote store when absent.
    ///
    /// Updates hit/miss counters. A record patched in while the fetch was
    /// in flight wins over the fetched value.
    pub async fn read(&self, address: &Address) -> Result<Contents, GithubError> {
        if let Some(record) = self.records.get(address) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(address = %address, "Cache HIT");
            return Ok(record);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(address = %address, "Cache MISS, fetching");

        let fetched = self
            .api
            .contents(&address.path, Some(&address.branch))
            .await?;

        // A confirmed write can patch this address while the fetch is in
        // flight. The patched record is authoritative, so the fetched value
        // fills only a vacant slot and never replaces an existing record.
        let record = self.records.entry_by_ref(address).or_insert(fetched);
        Ok(record.into_value())
    }

    /// Apply an optimistic patch after a confirmed remote write.
    ///
    /// The updater receives the current record (None when the address was
    /// never cached) and returns the replacement; returning None leaves the
    /// cache untouched. No network call is issued either way.
    pub fn patch<F>(&self, address: &Address, updater: F)
    where
        F: FnOnce(Option<Contents>) -> Option<Contents>,
    {
        match updater(self.records.get(address)) {
            Some(next) => {
                self.records.insert(address.clone(), next);
                debug!(address = %address, "Patched cache record");
            }
            None => {
                trace!(address = %address, "Patch left address uncached");
            }
        }
    }

    /// Get cache statistics
    ///
    /// Returns (hits, misses, hit_rate)
    pub fn stats(&self) -> (u64, u64, f64) {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        (hits, misses, hit_rate)
    }

    /// Log current cache metrics
    pub fn log_metrics(&self) {
        let (hits, misses, hit_rate) = self.stats();
        debug!(
            hits = hits,
            misses = misses,
            hit_rate = format!("{:.1}%", hit_rate),
            records = self.records.entry_count(),
            "Cache metrics"
        );
    }
}
