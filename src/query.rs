//! Query/cache layer: memoised per-city yearly average temperatures.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use log::{debug, info};
use lru::LruCache;
use parking_lot::Mutex;

use crate::reload::ReloadObserver;
use crate::store::StoreHandle;

/// Year -> average temperature mapping served to callers.
pub type YearlyAverages = BTreeMap<i32, f64>;

/// Normalise a city name the way the aggregate is keyed.
pub fn normalize_city(city: &str) -> String {
    city.trim().to_lowercase()
}

struct CacheInner {
    entries: LruCache<String, Arc<YearlyAverages>>,
    /// Bumped on every invalidation. A compute that began under an
    /// older generation must not install its result, otherwise a slow
    /// reader could re-insert pre-reload averages after the cache was
    /// cleared.
    generation: u64,
}

/// Facade over the committed aggregate with a wholesale-invalidated
/// memo table.
///
/// Unknown or unpopulated cities yield an empty mapping, never an
/// error. Concurrent misses for the same city may compute redundantly,
/// but every computed value derives from a single coherent store
/// snapshot.
pub struct TemperatureService {
    store: Arc<StoreHandle>,
    cache: Mutex<CacheInner>,
}

impl TemperatureService {
    /// Create the service over the visible store slot with a memo table
    /// of `cache_capacity` cities.
    pub fn new(store: Arc<StoreHandle>, cache_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            store,
            cache: Mutex::new(CacheInner {
                entries: LruCache::new(capacity),
                generation: 0,
            }),
        }
    }

    /// Yearly average temperatures for `city`.
    ///
    /// On a hit the memoised mapping is returned without touching the
    /// store; on a miss the averages are computed from a snapshot of
    /// the current aggregate and memoised until the next reload
    /// commits.
    pub fn get_yearly_averages(&self, city: &str) -> Arc<YearlyAverages> {
        let key = normalize_city(city);

        let generation = {
            let mut cache = self.cache.lock();
            if let Some(hit) = cache.entries.get(&key) {
                return Arc::clone(hit);
            }
            cache.generation
        };

        let averages = Arc::new(self.compute(&key));
        debug!("computed {} yearly averages for city {:?}", averages.len(), key);

        let mut cache = self.cache.lock();
        if cache.generation == generation {
            cache.entries.put(key, Arc::clone(&averages));
        }
        averages
    }

    fn compute(&self, city: &str) -> YearlyAverages {
        let store = self.store.current();
        let Some(snapshot) = store.snapshot(city) else {
            return YearlyAverages::new();
        };
        snapshot
            .iter()
            .filter_map(|(&year, aggregate)| aggregate.average().map(|avg| (year, avg)))
            .collect()
    }

    /// Drop every memoised entry as one unit. Called after a reload
    /// swap commits; a failed reload leaves the cache untouched.
    pub fn invalidate_all(&self) {
        let mut cache = self.cache.lock();
        cache.entries.clear();
        cache.generation += 1;
        info!("query cache invalidated (generation {})", cache.generation);
    }
}

impl ReloadObserver for TemperatureService {
    fn on_reload_completed(&self, success: bool) {
        if success {
            self.invalidate_all();
        } else {
            debug!("reload failed; keeping memoised averages");
        }
    }
}
