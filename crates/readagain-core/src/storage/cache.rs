use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::clock::Clock;
use crate::error::Result;
use crate::models::{BookReadingHistory, ChildProfile, ReadingSession};
use crate::storage::HistoryStore;

struct Cached<T> {
    value: T,
    stored_at: DateTime<Utc>,
}

/// Time-bounded read cache in front of another [`HistoryStore`].
///
/// Histories and profiles are cached per child. Writes go straight to the
/// inner store and drop that child's entries.
///
/// Every invalidation bumps a generation. A load that started before an
/// invalidation is returned to its caller but never stored.
pub struct HistoryCache<S, C> {
    inner: S,
    clock: C,
    ttl: Duration,
    history: Mutex<HashMap<String, Cached<Vec<BookReadingHistory>>>>,
    profiles: Mutex<HashMap<String, Cached<Option<ChildProfile>>>>,
    generations: Mutex<HashMap<String, u64>>,
    epoch: AtomicU64,
}

impl<S: HistoryStore, C: Clock> HistoryCache<S, C> {
    pub fn new(inner: S, clock: C, ttl: Duration) -> Self {
        Self {
            inner,
            clock,
            ttl,
            history: Mutex::new(HashMap::new()),
            profiles: Mutex::new(HashMap::new()),
            generations: Mutex::new(HashMap::new()),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Forget everything cached for one child.
    pub fn invalidate(&self, child_id: &str) {
        *lock(&self.generations)
            .entry(child_id.to_string())
            .or_default() += 1;
        lock(&self.history).remove(child_id);
        lock(&self.profiles).remove(child_id);
    }

    pub fn invalidate_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        lock(&self.history).clear();
        lock(&self.profiles).clear();
    }

    fn generation(&self, child_id: &str) -> (u64, u64) {
        let child = lock(&self.generations).get(child_id).copied().unwrap_or(0);
        (self.epoch.load(Ordering::SeqCst), child)
    }

    fn is_fresh(&self, stored_at: DateTime<Utc>) -> bool {
        self.clock.now() - stored_at < self.ttl
    }

    fn cached<T: Clone>(
        &self,
        map: &Mutex<HashMap<String, Cached<T>>>,
        child_id: &str,
        load: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        if let Some(entry) = lock(map).get(child_id) {
            if self.is_fresh(entry.stored_at) {
                debug!(child_id, "history cache hit");
                return Ok(entry.value.clone());
            }
        }

        debug!(child_id, "history cache miss");
        let before = self.generation(child_id);
        let value = load()?;

        // Held across the check so a concurrent invalidation either lands
        // first and is seen, or runs after and removes this entry.
        let mut entries = lock(map);
        if self.generation(child_id) == before {
            entries.insert(
                child_id.to_string(),
                Cached {
                    value: value.clone(),
                    stored_at: self.clock.now(),
                },
            );
        } else {
            debug!(child_id, "invalidated during load, not caching");
        }
        Ok(value)
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

impl<S: HistoryStore, C: Clock> HistoryStore for HistoryCache<S, C> {
    fn fetch_history(&self, child_id: &str) -> Result<Vec<BookReadingHistory>> {
        self.cached(&self.history, child_id, || self.inner.fetch_history(child_id))
    }

    fn fetch_profile(&self, child_id: &str) -> Result<Option<ChildProfile>> {
        self.cached(&self.profiles, child_id, || self.inner.fetch_profile(child_id))
    }

    fn fetch_sessions(&self, child_id: &str) -> Result<Vec<ReadingSession>> {
        self.inner.fetch_sessions(child_id)
    }

    fn list_children(&self) -> Result<Vec<ChildProfile>> {
        self.inner.list_children()
    }

    fn save_profile(&self, profile: &ChildProfile) -> Result<()> {
        let out = self.inner.save_profile(profile);
        self.invalidate(&profile.id);
        out
    }

    fn save_history(&self, record: &BookReadingHistory) -> Result<()> {
        let out = self.inner.save_history(record);
        self.invalidate(&record.child_id);
        out
    }

    fn record_session(&self, session: &ReadingSession) -> Result<BookReadingHistory> {
        let out = self.inner.record_session(session);
        self.invalidate(&session.child_id);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::fixtures;
    use crate::storage::InMemoryHistoryStore;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn setup() -> (
        Arc<InMemoryHistoryStore>,
        Arc<FixedClock>,
        HistoryCache<Arc<InMemoryHistoryStore>, Arc<FixedClock>>,
    ) {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let store = Arc::new(InMemoryHistoryStore::with_sample_data(now));
        let clock = Arc::new(FixedClock::new(now));
        let cache = HistoryCache::new(store.clone(), clock.clone(), Duration::minutes(5));
        (store, clock, cache)
    }

    fn bump(store: &InMemoryHistoryStore) {
        let mut record = store.fetch_history("nile").unwrap().remove(0);
        record.read_count += 100;
        store.save_history(&record).unwrap();
    }

    #[test]
    fn test_serves_stale_until_ttl() {
        let (store, clock, cache) = setup();
        let first = cache.fetch_history("nile").unwrap();

        // change behind the cache's back
        bump(&store);
        assert_eq!(cache.fetch_history("nile").unwrap(), first);

        clock.advance(Duration::minutes(5));
        let refreshed = cache.fetch_history("nile").unwrap();
        assert_eq!(refreshed[0].read_count, first[0].read_count + 100);
    }

    #[test]
    fn test_explicit_invalidation() {
        let (store, _clock, cache) = setup();
        let first = cache.fetch_history("nile").unwrap();
        bump(&store);

        cache.invalidate("nile");
        assert_ne!(cache.fetch_history("nile").unwrap(), first);
    }

    #[test]
    fn test_writes_through_cache_invalidate() {
        let (_store, _clock, cache) = setup();
        let _ = cache.fetch_history("nile").unwrap();

        let mut profile = fixtures::sample_profile();
        profile.reading_level = 4;
        cache.save_profile(&profile).unwrap();
        assert_eq!(cache.fetch_profile("nile").unwrap().unwrap().reading_level, 4);

        let session = ReadingSession {
            child_id: "nile".into(),
            book_id: "1".into(),
            read_at: cache.clock.now(),
            minutes: 5,
            completion_rate: 1.0,
            engagement_rating: 5,
            book: None,
        };
        let updated = cache.record_session(&session).unwrap();
        let history = cache.fetch_history("nile").unwrap();
        assert_eq!(history[0].read_count, updated.read_count);
    }

    #[test]
    fn test_load_racing_invalidation_is_not_cached() {
        let (store, _clock, cache) = setup();
        let stale = cache
            .cached(&cache.history, "nile", || {
                let loaded = store.fetch_history("nile");
                bump(&store);
                cache.invalidate("nile");
                loaded
            })
            .unwrap();

        let fresh = cache.fetch_history("nile").unwrap();
        assert_eq!(fresh[0].read_count, stale[0].read_count + 100);
    }

    #[test]
    fn test_load_racing_invalidate_all_is_not_cached() {
        let (store, _clock, cache) = setup();
        let stale = cache
            .cached(&cache.history, "nile", || {
                let loaded = store.fetch_history("nile");
                bump(&store);
                cache.invalidate_all();
                loaded
            })
            .unwrap();

        assert_ne!(cache.fetch_history("nile").unwrap(), stale);
    }

    #[test]
    fn test_invalidate_all() {
        let (store, _clock, cache) = setup();
        let first = cache.fetch_history("nile").unwrap();
        bump(&store);
        cache.invalidate_all();
        assert_ne!(cache.fetch_history("nile").unwrap(), first);
    }
}
