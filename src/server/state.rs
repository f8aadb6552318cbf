//! Shared server state: the engine plus a bounded memo cache for cluster
//! results, keyed on (canonical item set, zoom, config), so an unchanged
//! viewport does not repeat the O(n²) pass.

use crate::cluster::{ClusterConfig, ClusterableItem, Partition};
use crate::engine::GeoEngine;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

pub struct AppState {
    pub engine: GeoEngine,
    pub cache: Mutex<ComputeCache>,
}

const CACHE_CAPACITY: usize = 128;

/// Bounded insertion-order cache of cluster partitions.
pub struct ComputeCache {
    entries: HashMap<u64, Partition>,
    order: VecDeque<u64>,
    capacity: usize,
}

impl ComputeCache {
    pub fn new() -> Self {
        Self::with_capacity(CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    /// Stable key for a clustering request. Item order does not matter:
    /// the key is computed over the canonically sorted set, matching the
    /// engine's own order canonicalization.
    pub fn key(items: &[ClusterableItem], zoom: u8, config: &ClusterConfig) -> u64 {
        let mut members: Vec<(&str, u64, u64)> = items
            .iter()
            .map(|i| {
                (
                    i.id.as_str(),
                    i.position.map(|p| p.lat.to_bits()).unwrap_or(u64::MAX),
                    i.position.map(|p| p.lng.to_bits()).unwrap_or(u64::MAX),
                )
            })
            .collect();
        members.sort_unstable();

        let mut h = DefaultHasher::new();
        members.hash(&mut h);
        zoom.hash(&mut h);
        config.max_cluster_radius_px.to_bits().hash(&mut h);
        config.min_cluster_size.hash(&mut h);
        h.finish()
    }

    pub fn get(&self, key: u64) -> Option<Partition> {
        self.entries.get(&key).cloned()
    }

    pub fn put(&mut self, key: u64, value: Partition) {
        if self.entries.contains_key(&key) {
            return;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key);
        self.entries.insert(key, value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ComputeCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;

    fn item(id: &str, lat: f64, lng: f64) -> ClusterableItem {
        ClusterableItem {
            id: id.to_string(),
            position: Some(GeoPoint::new(lat, lng).unwrap()),
            payload: None,
        }
    }

    #[test]
    fn test_key_ignores_input_order() {
        let config = ClusterConfig::default();
        let a = vec![item("a", 40.0, -74.0), item("b", 41.0, -75.0)];
        let b = vec![item("b", 41.0, -75.0), item("a", 40.0, -74.0)];
        assert_eq!(ComputeCache::key(&a, 12, &config), ComputeCache::key(&b, 12, &config));
    }

    #[test]
    fn test_key_varies_with_zoom_and_config() {
        let config = ClusterConfig::default();
        let items = vec![item("a", 40.0, -74.0)];
        assert_ne!(
            ComputeCache::key(&items, 12, &config),
            ComputeCache::key(&items, 13, &config)
        );
        let wider = ClusterConfig { max_cluster_radius_px: 80.0, min_cluster_size: 2 };
        assert_ne!(
            ComputeCache::key(&items, 12, &config),
            ComputeCache::key(&items, 12, &wider)
        );
    }

    #[test]
    fn test_put_get_roundtrip() {
        let mut cache = ComputeCache::new();
        cache.put(7, Partition::default());
        assert!(cache.get(7).is_some());
        assert!(cache.get(8).is_none());
    }

    #[test]
    fn test_eviction_drops_oldest() {
        let mut cache = ComputeCache::with_capacity(2);
        cache.put(1, Partition::default());
        cache.put(2, Partition::default());
        cache.put(3, Partition::default());
        assert_eq!(cache.len(), 2);
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_some());
        assert!(cache.get(3).is_some());
    }
}
