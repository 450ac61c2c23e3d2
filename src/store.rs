//! Aggregate store: concurrency-safe city -> year -> (sum, count)
//! mapping, plus the visible slot a reload swaps a new store into.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::models::{CityAggregates, YearAggregate};

/// The sole shared mutable dataset of the service.
///
/// Locking is per city: the outer map is read-locked on the hot path
/// and only write-locked the first time a city appears, so merges for
/// unrelated cities never contend on one lock. Readers obtain copies
/// through [`snapshot`](Self::snapshot), never live references.
#[derive(Debug, Default)]
pub struct AggregateStore {
    cities: RwLock<HashMap<String, Arc<Mutex<CityAggregates>>>>,
}

impl AggregateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn city_entry(&self, city: &str) -> Arc<Mutex<CityAggregates>> {
        if let Some(entry) = self.cities.read().get(city) {
            return Arc::clone(entry);
        }
        let mut cities = self.cities.write();
        Arc::clone(cities.entry(city.to_string()).or_default())
    }

    /// Add `delta` into the (city, year) entry, creating it if absent.
    /// Safe under arbitrary concurrent callers.
    pub fn merge(&self, city: &str, year: i32, delta: YearAggregate) {
        let entry = self.city_entry(city);
        let mut years = entry.lock();
        years.entry(year).or_default().merge(delta);
    }

    /// Merge a chunk-local partial aggregate for one city in a single
    /// short critical section.
    pub fn merge_city(&self, city: &str, partial: &CityAggregates) {
        let entry = self.city_entry(city);
        let mut years = entry.lock();
        for (&year, delta) in partial {
            years.entry(year).or_default().merge(*delta);
        }
    }

    /// Immutable copy of one city's year map, or `None` for an unknown
    /// city.
    pub fn snapshot(&self, city: &str) -> Option<CityAggregates> {
        let entry = self.cities.read().get(city).map(Arc::clone)?;
        let years = entry.lock();
        Some(years.clone())
    }

    /// Number of distinct cities currently aggregated.
    pub fn city_count(&self) -> usize {
        self.cities.read().len()
    }

    /// Drop all state. Never called concurrently with `merge`; only the
    /// reload path and tests use it.
    pub fn clear(&self) {
        self.cities.write().clear();
    }
}

/// Visible slot holding the committed aggregate.
///
/// Readers clone the inner `Arc` under a short read lock and then work
/// against that fixed store; a reload builds a fresh store off to the
/// side and swaps it in atomically once ingestion succeeds. A reader
/// therefore always observes either the entire old or the entire new
/// aggregate.
#[derive(Debug, Default)]
pub struct StoreHandle {
    slot: RwLock<Arc<AggregateStore>>,
}

impl StoreHandle {
    /// Create a handle over an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently committed store.
    pub fn current(&self) -> Arc<AggregateStore> {
        Arc::clone(&self.slot.read())
    }

    /// Commit a fully built store, making it visible to all subsequent
    /// readers. In-flight readers keep the store they already hold.
    pub fn swap(&self, store: Arc<AggregateStore>) {
        *self.slot.write() = store;
    }
}
