//! TTL cache of well contexts keyed by `(consumer, well)`

use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use super::WellContext;
use crate::types::WellId;

/// Time source for expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset_ms: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset_ms: AtomicU64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap_or(u64::MAX);
        self.offset_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}

struct CacheEntry {
    context: Arc<WellContext>,
    stored_at: Instant,
}

type CacheKey = (String, WellId);

/// Memoized well contexts.
///
/// Concurrent misses for one key may both compute; the later insert wins.
/// Entries are never served past `ttl`.
pub struct ContextCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ContextCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// Fresh cached context, if any
    pub fn get(&self, consumer: &str, well_id: WellId) -> Option<Arc<WellContext>> {
        let now = self.clock.now();
        let entry = self.entries.get(&(consumer.to_string(), well_id))?;
        (now.saturating_duration_since(entry.stored_at) < self.ttl)
            .then(|| Arc::clone(&entry.context))
    }

    pub fn insert(
        &self,
        consumer: &str,
        well_id: WellId,
        context: WellContext,
    ) -> Arc<WellContext> {
        let context = Arc::new(context);
        self.entries.insert(
            (consumer.to_string(), well_id),
            CacheEntry {
                context: Arc::clone(&context),
                stored_at: self.clock.now(),
            },
        );
        context
    }

    /// Cached context when fresh, otherwise `compute` and store its result.
    ///
    /// Every miss also sweeps expired entries, so keys of consumers that never
    /// return do not accumulate. A failed computation stores nothing.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        consumer: &str,
        well_id: WellId,
        compute: F,
    ) -> Result<Arc<WellContext>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<WellContext, E>>,
    {
        if let Some(hit) = self.get(consumer, well_id) {
            debug!(consumer, well_id, "Context cache hit");
            return Ok(hit);
        }
        debug!(consumer, well_id, "Context cache miss");
        let purged = self.purge_expired();
        if purged > 0 {
            debug!(purged, "Expired contexts purged");
        }
        let context = compute().await?;
        Ok(self.insert(consumer, well_id, context))
    }

    pub fn invalidate(&self, consumer: &str, well_id: WellId) -> bool {
        self.entries.remove(&(consumer.to_string(), well_id)).is_some()
    }

    /// Drop every consumer's entry for `well_id`. Returns how many were removed.
    pub fn invalidate_well(&self, well_id: WellId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(_, id), _| *id != well_id);
        before.saturating_sub(self.entries.len())
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.stored_at) < ttl);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CurveStats, DepthRange};
    use std::sync::atomic::AtomicUsize;

    fn context(name: &str) -> WellContext {
        WellContext {
            owner_id: 1,
            well: crate::types::WellSummary {
                id: 1,
                well_name: name.to_string(),
                field: None,
                company: None,
                location: None,
                country: None,
                start_depth: 0.0,
                stop_depth: 1.0,
                step: 1.0,
                created_at: chrono::Utc::now(),
            },
            curves: Vec::new(),
            statistics: [("GR".to_string(), CurveStats::empty())].into_iter().collect(),
            sample: Vec::new(),
            total_rows: 0,
            range: DepthRange::ALL,
        }
    }

    fn setup() -> (Arc<ManualClock>, ContextCache) {
        let clock = Arc::new(ManualClock::new());
        let cache = ContextCache::with_clock(Duration::from_secs(300), clock.clone());
        (clock, cache)
    }

    #[tokio::test]
    async fn test_hit_within_ttl_skips_compute() {
        let (clock, cache) = setup();
        let calls = AtomicUsize::new(0);
        let compute = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, std::convert::Infallible>(context("A"))
        };

        cache.get_or_compute("s1", 1, compute).await.unwrap();
        clock.advance(Duration::from_secs(299));
        let hit = cache.get_or_compute("s1", 1, compute).await.unwrap();
        assert_eq!(hit.well.well_name, "A");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expiry_recomputes() {
        let (clock, cache) = setup();
        cache.insert("s1", 1, context("old"));
        clock.advance(Duration::from_secs(300));
        assert!(cache.get("s1", 1).is_none());

        let fresh = cache
            .get_or_compute("s1", 1, || async { Ok::<_, String>(context("new")) })
            .await
            .unwrap();
        assert_eq!(fresh.well.well_name, "new");
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_compute_not_cached() {
        let (_clock, cache) = setup();
        let err = cache
            .get_or_compute("s1", 1, || async { Err::<WellContext, _>("boom") })
            .await
            .unwrap_err();
        assert_eq!(err, "boom");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_keys_are_per_consumer() {
        let (_clock, cache) = setup();
        cache.insert("s1", 1, context("A"));
        cache.insert("s2", 1, context("A"));
        cache.insert("s1", 2, context("B"));

        assert!(cache.get("s3", 1).is_none());
        assert!(cache.invalidate("s1", 2));
        assert!(!cache.invalidate("s1", 2));
        assert_eq!(cache.invalidate_well(1), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let (clock, cache) = setup();
        cache.insert("s1", 1, context("A"));
        clock.advance(Duration::from_secs(200));
        cache.insert("s1", 2, context("B"));
        clock.advance(Duration::from_secs(150));
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.get("s1", 1).is_none());
        assert!(cache.get("s1", 2).is_some());
    }

    #[tokio::test]
    async fn test_miss_sweeps_abandoned_consumers() {
        let (clock, cache) = setup();
        cache.insert("conn-1", 1, context("A"));
        cache.insert("conn-2", 7, context("B"));
        clock.advance(Duration::from_secs(301));

        cache
            .get_or_compute("conn-3", 1, || async { Ok::<_, String>(context("C")) })
            .await
            .unwrap();
        assert_eq!(cache.len(), 1);
        assert!(cache.get("conn-3", 1).is_some());
        assert!(!cache.invalidate("conn-1", 1));
        assert!(!cache.invalidate("conn-2", 7));
    }
}
