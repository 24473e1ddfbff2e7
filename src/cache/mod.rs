// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Render cache keyed by content fingerprint
//!
//! Keys are always [`Fingerprint`]s computed from the request content, never
//! the identity of the model object that produced the source. The cache also
//! tracks renders in flight so identical requests never run twice at once.

mod disk;
mod entry;
mod flight;

pub use disk::{DiskMeta, DiskStore};
pub use entry::CacheEntry;
pub use flight::Flight;

use crate::error::RenderError;
use crate::request::{CorrelationToken, Fingerprint, RenderResult};
use anyhow::Result;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Eviction and persistence settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CachePolicy {
    /// Upper bound on stored entries; least recently used go first
    pub max_entries: usize,
    /// Entries unused for longer than this are dropped
    #[serde(with = "crate::utils::duration::opt_secs", skip_serializing_if = "Option::is_none")]
    pub max_idle: Option<Duration>,
    /// Browser renders still unanswered after this long are dropped. Pending
    /// entries do not count toward `max_entries`.
    #[serde(with = "crate::utils::duration::opt_secs", skip_serializing_if = "Option::is_none")]
    pub pending_timeout: Option<Duration>,
    /// Keep failed results so they are not retried until invalidated
    pub cache_failures: bool,
    /// Directory for the persistent tier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            max_entries: 128,
            max_idle: Some(Duration::from_secs(60 * 60)),
            pending_timeout: Some(Duration::from_secs(10 * 60)),
            cache_failures: true,
            dir: None,
        }
    }
}

/// Cache counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub pending: usize,
    pub in_flight: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f32 / total as f32) * 100.0
        }
    }
}

#[derive(Debug)]
enum Slot {
    Ready(CacheEntry),
    InFlight(Arc<Flight>),
}

/// Result of [`RenderCache::claim`]
pub enum Claim<'a> {
    /// Already stored
    Cached(RenderResult),
    /// Someone else is rendering this fingerprint; wait on the flight
    Wait(Arc<Flight>),
    /// The caller must render and then call [`FlightGuard::complete`]
    Owner(FlightGuard<'a>),
}

/// Thread-safe render cache
pub struct RenderCache {
    slots: DashMap<Fingerprint, Slot>,
    policy: CachePolicy,
    disk: Option<DiskStore>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl RenderCache {
    /// Memory-only cache
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            slots: DashMap::new(),
            policy,
            disk: None,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Cache with the persistent tier enabled if the policy names a directory
    pub fn open(policy: CachePolicy) -> Result<Self> {
        let disk = match &policy.dir {
            Some(dir) => Some(DiskStore::open(dir)?),
            None => None,
        };
        let mut cache = Self::new(policy);
        cache.disk = disk;
        Ok(cache)
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Look up a result, refreshing its last-used time on a hit.
    /// A render in flight counts as a miss.
    pub fn get(&self, fp: &Fingerprint) -> Result<Option<RenderResult>, RenderError> {
        if let Some(mut slot) = self.slots.get_mut(fp) {
            if let Slot::Ready(entry) = &mut *slot {
                if !entry.verify() {
                    return Err(corruption(fp));
                }
                entry.touch();
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Some(entry.result.clone()));
            }
            drop(slot);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return Ok(None);
        }

        match self.load_from_disk(fp)? {
            Some(result) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(result))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    /// Look up a result without touching timestamps or counters
    pub fn peek(&self, fp: &Fingerprint) -> Option<RenderResult> {
        match self.slots.get(fp).as_deref() {
            Some(Slot::Ready(entry)) => Some(entry.result.clone()),
            _ => None,
        }
    }

    /// Time since the stored entry was created
    pub fn age(&self, fp: &Fingerprint) -> Option<Duration> {
        match self.slots.get(fp).as_deref() {
            Some(Slot::Ready(entry)) => Some(entry.created_at.elapsed()),
            _ => None,
        }
    }

    /// Store a result, replacing whatever was there
    pub fn put(&self, fp: &Fingerprint, result: RenderResult) {
        self.persist(fp, &result);
        self.slots
            .insert(fp.clone(), Slot::Ready(CacheEntry::new(fp.clone(), result)));
        self.evict();
    }

    /// Drop a stored result. Renders in flight are left alone.
    pub fn invalidate(&self, fp: &Fingerprint) -> bool {
        if let Some(disk) = &self.disk {
            disk.remove(fp);
        }
        self.slots
            .remove_if(fp, |_, slot| matches!(slot, Slot::Ready(_)))
            .is_some()
    }

    /// Drop every stored result
    pub fn clear_all(&self) {
        self.slots.retain(|_, slot| matches!(slot, Slot::InFlight(_)));
        if let Some(disk) = &self.disk {
            if let Err(e) = disk.clear() {
                tracing::warn!(error = %e, "failed to clear persistent cache");
            }
        }
    }

    /// Atomically check the cache and, on a miss, reserve the fingerprint
    /// for the caller.
    pub fn claim(&self, fp: &Fingerprint) -> Result<Claim<'_>, RenderError> {
        if !self.slots.contains_key(fp) {
            self.load_from_disk(fp)?;
        }

        match self.slots.entry(fp.clone()) {
            Entry::Occupied(mut occupied) => match occupied.get_mut() {
                Slot::Ready(entry) => {
                    if !entry.verify() {
                        return Err(corruption(fp));
                    }
                    entry.touch();
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    Ok(Claim::Cached(entry.result.clone()))
                }
                Slot::InFlight(flight) => Ok(Claim::Wait(flight.clone())),
            },
            Entry::Vacant(vacant) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                let flight = Arc::new(Flight::new());
                vacant.insert(Slot::InFlight(flight.clone()));
                Ok(Claim::Owner(FlightGuard {
                    cache: self,
                    fingerprint: fp.clone(),
                    flight,
                    completed: false,
                }))
            }
        }
    }

    /// Replace a pending entry with its resolution. Fails with
    /// `StaleCorrelation` unless the entry is still pending on `token`.
    pub fn resolve(
        &self,
        fp: &Fingerprint,
        token: &CorrelationToken,
        result: RenderResult,
    ) -> Result<(), RenderError> {
        let stale = || RenderError::StaleCorrelation {
            token: token.encode(),
        };

        match self.slots.entry(fp.clone()) {
            Entry::Occupied(mut occupied) => {
                let matches = matches!(
                    occupied.get(),
                    Slot::Ready(entry) if entry.result.token() == Some(token)
                );
                if !matches {
                    return Err(stale());
                }
                if result.is_failure() && !self.policy.cache_failures {
                    occupied.remove();
                } else {
                    occupied.insert(Slot::Ready(CacheEntry::new(fp.clone(), result.clone())));
                }
            }
            Entry::Vacant(_) => return Err(stale()),
        }

        self.persist(fp, &result);
        self.evict();
        Ok(())
    }

    /// Apply the idle and size limits to both tiers.
    ///
    /// Renders in flight are never evicted. Pending browser renders only
    /// expire through `pending_timeout`.
    pub fn evict(&self) -> usize {
        let mut doomed = Vec::new();

        self.slots.retain(|fp, slot| {
            let keep = match slot {
                Slot::InFlight(_) => true,
                Slot::Ready(entry) if entry.result.is_pending() => self
                    .policy
                    .pending_timeout
                    .map_or(true, |limit| entry.created_at.elapsed() <= limit),
                Slot::Ready(entry) => self
                    .policy
                    .max_idle
                    .map_or(true, |limit| entry.last_used_at.elapsed() <= limit),
            };
            if !keep {
                doomed.push(fp.clone());
            }
            keep
        });

        let mut stored: Vec<_> = self
            .slots
            .iter()
            .filter_map(|item| match item.value() {
                Slot::Ready(entry) if !entry.result.is_pending() => {
                    Some((entry.last_used_at, item.key().clone()))
                }
                _ => None,
            })
            .collect();
        if stored.len() > self.policy.max_entries {
            stored.sort();
            let excess = stored.len() - self.policy.max_entries;
            for (_, fp) in stored.into_iter().take(excess) {
                let removed = self.slots.remove_if(&fp, |_, slot| {
                    matches!(slot, Slot::Ready(entry) if !entry.result.is_pending())
                });
                if removed.is_some() {
                    doomed.push(fp);
                }
            }
        }

        let mut evicted = doomed.len();
        if let Some(disk) = &self.disk {
            for fp in &doomed {
                disk.remove(fp);
            }
            evicted += self.prune_disk(disk);
        }

        if evicted > 0 {
            self.evictions.fetch_add(evicted as u64, Ordering::Relaxed);
            tracing::debug!(evicted, remaining = self.slots.len(), "evicted cache entries");
        }
        evicted
    }

    /// Drop persisted entries that are not held in memory once they are idle
    /// or push the persistent tier past `max_entries`
    fn prune_disk(&self, disk: &DiskStore) -> usize {
        let stored = match disk.entries() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list persistent cache");
                return 0;
            }
        };
        let total = stored.len();
        let now = SystemTime::now();

        let mut removed = 0;
        let mut candidates = Vec::new();
        for (fp, used) in stored {
            if self.slots.contains_key(&fp) {
                continue;
            }
            let idle = now.duration_since(used).unwrap_or_default();
            if self.policy.max_idle.is_some_and(|limit| idle > limit) {
                disk.remove(&fp);
                removed += 1;
            } else {
                candidates.push((used, fp));
            }
        }

        let excess = (total - removed).saturating_sub(self.policy.max_entries);
        if excess > 0 {
            candidates.sort();
            for (_, fp) in candidates.into_iter().take(excess) {
                disk.remove(&fp);
                removed += 1;
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|item| matches!(item.value(), Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let mut stats = CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            ..CacheStats::default()
        };
        for item in self.slots.iter() {
            match item.value() {
                Slot::Ready(entry) if entry.result.is_pending() => stats.pending += 1,
                Slot::Ready(_) => stats.entries += 1,
                Slot::InFlight(_) => stats.in_flight += 1,
            }
        }
        stats
    }

    fn load_from_disk(&self, fp: &Fingerprint) -> Result<Option<RenderResult>, RenderError> {
        let Some(disk) = &self.disk else {
            return Ok(None);
        };
        match disk.load(fp) {
            Ok(Some(result)) => {
                if let Entry::Vacant(vacant) = self.slots.entry(fp.clone()) {
                    vacant.insert(Slot::Ready(CacheEntry::new(fp.clone(), result.clone())));
                }
                self.evict();
                Ok(Some(result))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                tracing::warn!(fingerprint = fp.short(), error = %e, "persistent cache entry unreadable");
                Err(corruption(fp))
            }
        }
    }

    fn persist(&self, fp: &Fingerprint, result: &RenderResult) {
        if let Some(disk) = &self.disk {
            if let Err(e) = disk.save(fp, result) {
                tracing::warn!(fingerprint = fp.short(), error = %e, "failed to persist render");
            }
        }
    }
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new(CachePolicy::default())
    }
}

fn corruption(fp: &Fingerprint) -> RenderError {
    RenderError::CacheCorruption {
        fingerprint: fp.to_string(),
    }
}

/// Exclusive right to render one fingerprint.
///
/// Dropping the guard without completing releases the reservation and wakes
/// any waiters so one of them can take over.
pub struct FlightGuard<'a> {
    cache: &'a RenderCache,
    fingerprint: Fingerprint,
    flight: Arc<Flight>,
    completed: bool,
}

impl FlightGuard<'_> {
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Publish the result to the cache and to everyone waiting on it
    pub fn complete(mut self, result: RenderResult) -> RenderResult {
        let store = !result.is_failure() || self.cache.policy.cache_failures;
        if store {
            self.cache.persist(&self.fingerprint, &result);
            self.cache.slots.insert(
                self.fingerprint.clone(),
                Slot::Ready(CacheEntry::new(self.fingerprint.clone(), result.clone())),
            );
        } else {
            self.release_slot();
        }
        self.flight.finish(Some(result.clone()));
        self.completed = true;
        self.cache.evict();
        result
    }

    fn release_slot(&self) {
        let flight = &self.flight;
        self.cache.slots.remove_if(&self.fingerprint, |_, slot| {
            matches!(slot, Slot::InFlight(f) if Arc::ptr_eq(f, flight))
        });
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.completed {
            self.release_slot();
            self.flight.finish(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineKind;
    use crate::request::RenderRequest;
    use std::thread;

    fn fp(source: &str) -> Fingerprint {
        RenderRequest::new(source).fingerprint()
    }

    fn success(bytes: &[u8]) -> RenderResult {
        RenderResult::success(bytes.to_vec(), EngineKind::Local, Duration::from_millis(1))
    }

    #[test]
    fn test_put_then_get() {
        let cache = RenderCache::default();
        let key = fp("cube(1);");
        assert_eq!(cache.get(&key).unwrap(), None);
        cache.put(&key, success(b"X"));
        assert_eq!(cache.get(&key).unwrap(), Some(success(b"X")));
        cache.put(&key, success(b"Y"));
        assert_eq!(cache.get(&key).unwrap(), Some(success(b"Y")));
        assert!(cache.invalidate(&key));
        assert_eq!(cache.get(&key).unwrap(), None);
    }

    #[test]
    fn test_peek_has_no_side_effects() {
        let cache = RenderCache::default();
        let key = fp("cube(1);");
        cache.put(&key, success(b"X"));
        assert!(cache.peek(&key).is_some());
        assert_eq!(cache.stats().hits, 0);
        assert_eq!(cache.stats().misses, 0);
    }

    #[test]
    fn test_clear_all() {
        let cache = RenderCache::default();
        cache.put(&fp("a"), success(b"a"));
        cache.put(&fp("b"), success(b"b"));
        assert_eq!(cache.len(), 2);
        cache.clear_all();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_max_entries_bound() {
        let cache = RenderCache::new(CachePolicy {
            max_entries: 2,
            ..CachePolicy::default()
        });
        cache.put(&fp("a"), success(b"a"));
        thread::sleep(Duration::from_millis(2));
        cache.put(&fp("b"), success(b"b"));
        thread::sleep(Duration::from_millis(2));
        cache.get(&fp("a")).unwrap();
        thread::sleep(Duration::from_millis(2));
        cache.put(&fp("c"), success(b"c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.peek(&fp("a")).is_some());
        assert!(cache.peek(&fp("b")).is_none());
        assert!(cache.peek(&fp("c")).is_some());
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_idle_eviction() {
        let cache = RenderCache::new(CachePolicy {
            max_idle: Some(Duration::from_millis(20)),
            ..CachePolicy::default()
        });
        cache.put(&fp("a"), success(b"a"));
        thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.evict(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_claim_is_exclusive() {
        let cache = RenderCache::default();
        let key = fp("cube(1);");
        let Claim::Owner(guard) = cache.claim(&key).unwrap() else {
            panic!("first claim should own the render");
        };
        assert!(matches!(cache.claim(&key).unwrap(), Claim::Wait(_)));
        assert_eq!(cache.stats().in_flight, 1);

        guard.complete(success(b"X"));
        match cache.claim(&key).unwrap() {
            Claim::Cached(result) => assert_eq!(result, success(b"X")),
            _ => panic!("expected cached result"),
        };
    }

    #[test]
    fn test_abandoned_claim_released() {
        let cache = RenderCache::default();
        let key = fp("cube(1);");
        let flight = {
            let Claim::Owner(_guard) = cache.claim(&key).unwrap() else {
                panic!("expected owner");
            };
            let Claim::Wait(flight) = cache.claim(&key).unwrap() else {
                panic!("expected wait");
            };
            flight
        };
        assert_eq!(flight.wait(), None);
        assert!(matches!(cache.claim(&key).unwrap(), Claim::Owner(_)));
    }

    #[test]
    fn test_failures_not_stored_when_disabled() {
        let cache = RenderCache::new(CachePolicy {
            cache_failures: false,
            ..CachePolicy::default()
        });
        let key = fp("cube(1);");
        let Claim::Owner(guard) = cache.claim(&key).unwrap() else {
            panic!("expected owner");
        };
        guard.complete(RenderResult::Failure(RenderError::AllEnginesUnavailable {
            attempts: vec![],
        }));
        assert_eq!(cache.get(&key).unwrap(), None);
        assert_eq!(cache.stats().in_flight, 0);
    }

    #[test]
    fn test_resolve_requires_matching_pending() {
        let cache = RenderCache::default();
        let key = fp("cube(1);");
        let token = CorrelationToken::for_fingerprint(&key);

        assert!(matches!(
            cache.resolve(&key, &token, success(b"X")),
            Err(RenderError::StaleCorrelation { .. })
        ));

        cache.put(&key, RenderResult::Pending(token.clone()));
        assert_eq!(cache.stats().pending, 1);
        cache.resolve(&key, &token, success(b"X")).unwrap();
        assert_eq!(cache.get(&key).unwrap(), Some(success(b"X")));

        // Already resolved
        assert!(cache.resolve(&key, &token, success(b"Z")).is_err());
    }

    #[test]
    fn test_disk_tier_survives_new_cache() {
        let dir = tempfile::TempDir::new().unwrap();
        let policy = CachePolicy {
            dir: Some(dir.path().to_path_buf()),
            ..CachePolicy::default()
        };
        let key = fp("cube(1);");
        RenderCache::open(policy.clone()).unwrap().put(&key, success(b"X"));

        let reopened = RenderCache::open(policy).unwrap();
        assert_eq!(reopened.get(&key).unwrap().unwrap().bytes(), Some(&b"X"[..]));
    }

    fn disk_policy(dir: &tempfile::TempDir, max_entries: usize) -> CachePolicy {
        CachePolicy {
            max_entries,
            dir: Some(dir.path().to_path_buf()),
            ..CachePolicy::default()
        }
    }

    fn file_count(dir: &tempfile::TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[test]
    fn test_disk_tier_respects_max_entries() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = RenderCache::open(disk_policy(&dir, 2)).unwrap();
        for i in 0..10 {
            cache.put(&fp(&format!("cube({});", i)), success(b"solid"));
            thread::sleep(Duration::from_millis(2));
        }

        assert_eq!(cache.len(), 2);
        // One .bin and one .json per surviving entry
        assert_eq!(file_count(&dir), 4);
        assert_eq!(cache.stats().evictions, 8);
        assert_eq!(cache.get(&fp("cube(0);")).unwrap(), None);
        assert!(cache.get(&fp("cube(9);")).unwrap().is_some());
    }

    #[test]
    fn test_failure_hides_older_persisted_success() {
        let dir = tempfile::TempDir::new().unwrap();
        let cache = RenderCache::open(disk_policy(&dir, 1)).unwrap();
        let key = fp("cube(1);");
        cache.put(&key, success(b"OLD"));
        cache.put(
            &key,
            RenderResult::Failure(RenderError::AllEnginesUnavailable { attempts: vec![] }),
        );
        thread::sleep(Duration::from_millis(2));
        // Pushes the failure out of memory
        cache.put(&fp("cube(2);"), success(b"NEW"));

        assert!(cache.peek(&key).is_none());
        assert_eq!(cache.get(&key).unwrap(), None);
    }

    #[test]
    fn test_leftover_disk_entries_are_pruned() {
        let dir = tempfile::TempDir::new().unwrap();
        let previous = RenderCache::open(disk_policy(&dir, 2)).unwrap();
        previous.put(&fp("a"), success(b"a"));
        thread::sleep(Duration::from_millis(20));
        previous.put(&fp("b"), success(b"b"));
        drop(previous);

        let cache = RenderCache::open(disk_policy(&dir, 2)).unwrap();
        cache.put(&fp("c"), success(b"c"));
        assert_eq!(file_count(&dir), 4);
        assert_eq!(cache.peek(&fp("a")), None);
        assert_eq!(cache.get(&fp("a")).unwrap(), None);
        assert!(cache.get(&fp("b")).unwrap().is_some());
    }

    #[test]
    fn test_idle_disk_entries_are_pruned() {
        let dir = tempfile::TempDir::new().unwrap();
        let policy = CachePolicy {
            max_idle: Some(Duration::from_millis(50)),
            ..disk_policy(&dir, 16)
        };
        RenderCache::open(policy.clone())
            .unwrap()
            .put(&fp("a"), success(b"a"));
        thread::sleep(Duration::from_millis(100));

        let cache = RenderCache::open(policy).unwrap();
        cache.put(&fp("b"), success(b"b"));
        assert_eq!(file_count(&dir), 2);
        assert_eq!(cache.get(&fp("a")).unwrap(), None);
    }

    #[test]
    fn test_pending_not_evicted_by_size() {
        let cache = RenderCache::new(CachePolicy {
            max_entries: 1,
            ..CachePolicy::default()
        });
        let key = fp("cube(1);");
        let token = CorrelationToken::for_fingerprint(&key);
        cache.put(&key, RenderResult::Pending(token.clone()));
        cache.put(&fp("cube(2);"), success(b"2"));
        thread::sleep(Duration::from_millis(2));
        cache.put(&fp("cube(3);"), success(b"3"));

        assert!(cache.peek(&key).unwrap().is_pending());
        assert_eq!(cache.stats().entries, 1);
        cache.resolve(&key, &token, success(b"1")).unwrap();
        assert_eq!(cache.peek(&key), Some(success(b"1")));
    }

    #[test]
    fn test_pending_expires_after_timeout() {
        let cache = RenderCache::new(CachePolicy {
            pending_timeout: Some(Duration::from_millis(20)),
            ..CachePolicy::default()
        });
        let key = fp("cube(1);");
        let token = CorrelationToken::for_fingerprint(&key);
        cache.put(&key, RenderResult::Pending(token.clone()));
        thread::sleep(Duration::from_millis(40));

        assert_eq!(cache.evict(), 1);
        assert!(matches!(
            cache.resolve(&key, &token, success(b"1")),
            Err(RenderError::StaleCorrelation { .. })
        ));
    }
}
