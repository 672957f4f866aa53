//! Keyed query cache with request deduplication.
//!
//! ```text
//! NewsQueries ──subscribe(key, loader)──▶ QueryClient ──spawn──▶ loader ──▶ Fetcher
//!      ▲                                      │
//!      └──────── watch::Receiver<state> ◀─────┘
//! ```
//!
//! - One entry per [`CacheKey`]; at most one loader in flight per entry.
//! - Every fetch takes a sequence number. A result is applied only if no
//!   later-issued fetch for the same key has already resolved.
//! - Entries nobody subscribes to are evicted after `gc_time`, and the cache
//!   never grows past `max_entries` unused entries.
//!
//! # Usage
//!
//! ```rust,ignore
//! let client = QueryClient::new(QueryConfig::default());
//! let mut sub = client.subscribe(cache_key!["categories", "full"], move || {
//!     let api = api.clone();
//!     async move { api.categories().await }
//! });
//! let state = sub.settled().await;
//! ```

mod client;
mod key;
mod state;
mod subscription;

use std::time::Duration;

use serde::Deserialize;

pub use client::QueryClient;
pub use key::{CacheKey, KeyPart};
pub use state::{QueryState, QueryStatus};
pub use subscription::Subscription;

/// Cache freshness and eviction settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Seconds a successful result counts as fresh. `None` keeps it fresh for
    /// the life of the entry; refreshes are then manual only.
    pub stale_time_secs: Option<u64>,

    /// Seconds an entry with no subscribers survives before eviction
    /// (default: 300). Zero evicts as soon as the last subscriber leaves.
    pub gc_time_secs: u64,

    /// Maximum number of entries (default: 256). Unused entries are evicted
    /// least-recently-released first; live entries are never evicted.
    pub max_entries: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            stale_time_secs: None,
            gc_time_secs: 300,
            max_entries: 256,
        }
    }
}

impl QueryConfig {
    pub fn stale_time(&self) -> Option<Duration> {
        self.stale_time_secs.map(Duration::from_secs)
    }

    pub fn gc_time(&self) -> Duration {
        Duration::from_secs(self.gc_time_secs)
    }
}
