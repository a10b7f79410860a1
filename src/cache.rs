use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::debug;

use crate::config::CacheConfig;
use crate::form::FormSummary;
use crate::historical_dataset::{MatchSource, MatchTable};

/// Caller-owned map whose entries expire `ttl` after insertion.
#[derive(Debug, Clone)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, (Instant, V)>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &K, now: Instant) -> Option<&V> {
        let (stamp, value) = self.entries.get(key)?;
        (now.saturating_duration_since(*stamp) < self.ttl).then_some(value)
    }

    pub fn insert(&mut self, key: K, value: V) {
        self.insert_at(key, value, Instant::now());
    }

    pub fn insert_at(&mut self, key: K, value: V, at: Instant) {
        self.entries.insert(key, (at, value));
    }

    /// Returns the fresh entry or stores what `fetch` produces. Failures are
    /// not cached.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        fetch: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(hit) = self.get(&key) {
            return Ok(hit.clone());
        }
        let value = fetch()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    pub fn invalidate(&mut self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops expired entries and returns how many went.
    pub fn purge_expired(&mut self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, (stamp, _)| now.saturating_duration_since(*stamp) < ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Team form keyed by team name. Clear it whenever the table changes.
pub type FormCache = TtlCache<String, FormSummary>;

pub fn form_cache(cfg: &CacheConfig) -> FormCache {
    FormCache::new(cfg.form_ttl())
}

/// Tables per league group, reloaded from `source` once stale.
pub struct DatasetCache<S> {
    source: S,
    tables: TtlCache<String, MatchTable>,
}

impl<S: MatchSource> DatasetCache<S> {
    pub fn new(source: S, cfg: &CacheConfig) -> Self {
        Self {
            source,
            tables: TtlCache::new(cfg.dataset_ttl()),
        }
    }

    pub fn load(&mut self, group_id: &str) -> Result<MatchTable> {
        let source = &self.source;
        self.tables
            .get_or_try_insert_with(group_id.to_string(), || {
                debug!(group_id, "loading match table");
                source.load_matches(group_id)
            })
    }

    pub fn invalidate(&mut self, group_id: &str) -> bool {
        self.tables.invalidate(&group_id.to_string())
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
