//! Zoom-adaptive proximity clustering for map markers.
//!
//! Partitions geo-tagged items into clusters and singles. The effective
//! grouping radius is a step function of the map zoom level: coarser
//! grouping zoomed out, finer grouping zoomed in. Geographic distance is
//! mapped to screen pixels through the Web Mercator scale factor before
//! comparison against that radius.
//!
//! The pairwise scan is O(n²) per call. Fine for viewport-sized inputs
//! (tens to low hundreds of items); a grid-bucketed pass would be the next
//! step if that assumption breaks.

use crate::geo::{haversine_meters, meters_per_pixel, GeoError, GeoPoint};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An item that may participate in clustering. Items without a position are
/// dropped before grouping, never an error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterableItem {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<GeoPoint>,
    /// Opaque reference to the application record behind this marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

/// A group of nearby items, represented by its centroid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    /// Arithmetic mean of member coordinates. Always inside the members'
    /// bounding box.
    pub centroid: GeoPoint,
    /// Member item ids, in canonical processing order.
    pub member_ids: Vec<String>,
    pub size: usize,
}

/// The result of one clustering pass. Every positioned input item lands in
/// exactly one cluster or in `singles`: no loss, no duplication.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Partition {
    pub clusters: Vec<Cluster>,
    pub singles: Vec<ClusterableItem>,
}

/// Clustering configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Base grouping radius in screen pixels, before zoom scaling.
    pub max_cluster_radius_px: f64,
    /// Groups smaller than this are emitted as singles.
    pub min_cluster_size: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self { max_cluster_radius_px: 50.0, min_cluster_size: 2 }
    }
}

/// The clustering engine. Construction validates the configuration; after
/// that no operation can fail.
pub struct ClusterEngine {
    config: ClusterConfig,
}

impl ClusterEngine {
    pub fn new(config: ClusterConfig) -> Result<Self, GeoError> {
        if !config.max_cluster_radius_px.is_finite() || config.max_cluster_radius_px < 0.0 {
            return Err(GeoError::InvalidRadius(config.max_cluster_radius_px));
        }
        if config.min_cluster_size == 0 {
            return Err(GeoError::InvalidClusterSize);
        }
        Ok(Self { config })
    }

    pub fn with_defaults() -> Self {
        Self { config: ClusterConfig::default() }
    }

    pub fn config(&self) -> ClusterConfig {
        self.config
    }

    /// Effective grouping radius in pixels at a zoom level.
    ///
    /// Non-increasing as zoom grows: wide grouping on a city-scale view,
    /// half the base radius once individual blocks are visible.
    pub fn effective_radius_px(&self, zoom: u8) -> f64 {
        let factor = if zoom < 12 {
            2.0
        } else if zoom < 14 {
            1.5
        } else if zoom < 16 {
            1.0
        } else {
            0.5
        };
        self.config.max_cluster_radius_px * factor
    }

    /// Partition items into clusters and singles at a zoom level.
    ///
    /// Items are first canonicalized by `(lat, lng, id)` so the output does
    /// not depend on caller iteration order, then grouped greedily: each
    /// not-yet-assigned item seeds a group of every remaining item within
    /// the effective pixel radius of it.
    pub fn partition(&self, items: &[ClusterableItem], zoom: u8) -> Partition {
        let mut positioned: Vec<(GeoPoint, &ClusterableItem)> = items
            .iter()
            .filter_map(|item| item.position.map(|p| (p, item)))
            .collect();

        positioned.sort_by(|a, b| {
            a.0.lat
                .partial_cmp(&b.0.lat)
                .unwrap_or(Ordering::Equal)
                .then(a.0.lng.partial_cmp(&b.0.lng).unwrap_or(Ordering::Equal))
                .then(a.1.id.cmp(&b.1.id))
        });

        let radius_px = self.effective_radius_px(zoom);
        let n = positioned.len();
        let mut assigned = vec![false; n];
        let mut partition = Partition::default();

        for i in 0..n {
            if assigned[i] {
                continue;
            }
            assigned[i] = true;
            let (seed, _) = positioned[i];
            let mpp = meters_per_pixel(seed.lat, zoom);

            let mut group = vec![i];
            for j in (i + 1)..n {
                if assigned[j] {
                    continue;
                }
                let screen_px = haversine_meters(seed, positioned[j].0) / mpp;
                if screen_px < radius_px {
                    assigned[j] = true;
                    group.push(j);
                }
            }

            if group.len() >= self.config.min_cluster_size {
                let centroid = centroid_of(group.iter().map(|&k| positioned[k].0));
                partition.clusters.push(Cluster {
                    id: format!("c{}", partition.clusters.len()),
                    centroid,
                    member_ids: group.iter().map(|&k| positioned[k].1.id.clone()).collect(),
                    size: group.len(),
                });
            } else {
                partition
                    .singles
                    .extend(group.iter().map(|&k| positioned[k].1.clone()));
            }
        }

        partition
    }
}

fn centroid_of(points: impl Iterator<Item = GeoPoint>) -> GeoPoint {
    let mut lat = 0.0;
    let mut lng = 0.0;
    let mut count = 0usize;
    for p in points {
        lat += p.lat;
        lng += p.lng;
        count += 1;
    }
    // Callers only reach here with at least one member
    GeoPoint { lat: lat / count as f64, lng: lng / count as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn item(id: &str, lat: f64, lng: f64) -> ClusterableItem {
        ClusterableItem {
            id: id.to_string(),
            position: Some(GeoPoint::new(lat, lng).unwrap()),
            payload: None,
        }
    }

    fn item_no_position(id: &str) -> ClusterableItem {
        ClusterableItem { id: id.to_string(), position: None, payload: None }
    }

    fn all_ids(p: &Partition) -> Vec<String> {
        p.clusters
            .iter()
            .flat_map(|c| c.member_ids.iter().cloned())
            .chain(p.singles.iter().map(|s| s.id.clone()))
            .collect()
    }

    #[test]
    fn test_config_validation() {
        assert!(ClusterEngine::new(ClusterConfig {
            max_cluster_radius_px: -1.0,
            min_cluster_size: 2
        })
        .is_err());
        assert!(ClusterEngine::new(ClusterConfig {
            max_cluster_radius_px: f64::NAN,
            min_cluster_size: 2
        })
        .is_err());
        assert!(ClusterEngine::new(ClusterConfig {
            max_cluster_radius_px: 50.0,
            min_cluster_size: 0
        })
        .is_err());
        assert!(ClusterEngine::new(ClusterConfig::default()).is_ok());
    }

    #[test]
    fn test_effective_radius_steps() {
        let engine = ClusterEngine::with_defaults();
        assert_eq!(engine.effective_radius_px(8), 100.0);
        assert_eq!(engine.effective_radius_px(11), 100.0);
        assert_eq!(engine.effective_radius_px(12), 75.0);
        assert_eq!(engine.effective_radius_px(13), 75.0);
        assert_eq!(engine.effective_radius_px(14), 50.0);
        assert_eq!(engine.effective_radius_px(15), 50.0);
        assert_eq!(engine.effective_radius_px(16), 25.0);
        assert_eq!(engine.effective_radius_px(20), 25.0);
    }

    #[test]
    fn test_effective_radius_non_increasing() {
        let engine = ClusterEngine::with_defaults();
        for zoom in 0..20u8 {
            assert!(engine.effective_radius_px(zoom) >= engine.effective_radius_px(zoom + 1));
        }
    }

    #[test]
    fn test_empty_input() {
        let engine = ClusterEngine::with_defaults();
        let p = engine.partition(&[], 12);
        assert!(p.clusters.is_empty());
        assert!(p.singles.is_empty());
    }

    #[test]
    fn test_items_without_position_dropped_silently() {
        let engine = ClusterEngine::with_defaults();
        let items = vec![item("a", 40.0, -74.0), item_no_position("ghost"), item("b", 40.0005, -74.0)];
        let p = engine.partition(&items, 10);
        let ids = all_ids(&p);
        assert!(!ids.contains(&"ghost".to_string()));
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_concrete_scenario_111m_pair() {
        // Two items ~111 m apart (0.001° latitude delta), default 50px radius:
        // clustered at zoom 10, two singles at zoom 18.
        let engine = ClusterEngine::with_defaults();
        let items = vec![item("a", 40.0, -74.0), item("b", 40.001, -74.0)];

        let low = engine.partition(&items, 10);
        assert_eq!(low.clusters.len(), 1);
        assert_eq!(low.clusters[0].size, 2);
        assert!(low.singles.is_empty());

        let high = engine.partition(&items, 18);
        assert!(high.clusters.is_empty());
        assert_eq!(high.singles.len(), 2);
    }

    #[test]
    fn test_zoom_monotonicity_no_remerge() {
        let engine = ClusterEngine::with_defaults();
        let items = vec![item("a", 40.0, -74.0), item("b", 40.001, -74.0)];

        let mut split_seen = false;
        for zoom in 0..=20u8 {
            let p = engine.partition(&items, zoom);
            let together = p.clusters.len() == 1;
            if !together {
                split_seen = true;
            }
            // Once the pair splits, increasing zoom never re-merges it
            if split_seen {
                assert!(!together, "pair re-merged at zoom {}", zoom);
            }
        }
        assert!(split_seen);
    }

    #[test]
    fn test_partition_completeness_no_loss_no_duplication() {
        let engine = ClusterEngine::with_defaults();
        let items = vec![
            item("a", 40.0, -74.0),
            item("b", 40.0004, -74.0),
            item("c", 41.0, -74.0),
            item("d", 41.0003, -74.0),
            item("e", 35.0, -90.0),
            item_no_position("f"),
        ];
        let p = engine.partition(&items, 10);

        let ids = all_ids(&p);
        let unique: BTreeSet<&String> = ids.iter().collect();
        assert_eq!(ids.len(), unique.len(), "duplicated item");
        assert_eq!(
            unique.into_iter().cloned().collect::<BTreeSet<_>>(),
            ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect()
        );
        assert_eq!(p.clusters.len(), 2);
        assert_eq!(p.singles.len(), 1);
        assert_eq!(p.singles[0].id, "e");
    }

    #[test]
    fn test_centroid_inside_bounding_box() {
        let engine = ClusterEngine::with_defaults();
        let items = vec![
            item("a", 40.0, -74.0),
            item("b", 40.0006, -74.0004),
            item("c", 40.0003, -74.0008),
        ];
        let p = engine.partition(&items, 10);
        assert_eq!(p.clusters.len(), 1);
        let c = &p.clusters[0];

        let lats: Vec<f64> = items.iter().map(|i| i.position.unwrap().lat).collect();
        let lngs: Vec<f64> = items.iter().map(|i| i.position.unwrap().lng).collect();
        let (min_lat, max_lat) = (lats.iter().cloned().fold(f64::MAX, f64::min), lats.iter().cloned().fold(f64::MIN, f64::max));
        let (min_lng, max_lng) = (lngs.iter().cloned().fold(f64::MAX, f64::min), lngs.iter().cloned().fold(f64::MIN, f64::max));

        assert!(c.centroid.lat >= min_lat && c.centroid.lat <= max_lat);
        assert!(c.centroid.lng >= min_lng && c.centroid.lng <= max_lng);
    }

    #[test]
    fn test_centroid_is_mean() {
        let engine = ClusterEngine::with_defaults();
        let items = vec![item("a", 40.0, -74.0), item("b", 40.001, -74.002)];
        let p = engine.partition(&items, 10);
        let c = &p.clusters[0];
        assert!((c.centroid.lat - 40.0005).abs() < 1e-9);
        assert!((c.centroid.lng - (-74.001)).abs() < 1e-9);
    }

    #[test]
    fn test_order_independence() {
        let engine = ClusterEngine::with_defaults();
        let forward = vec![
            item("a", 40.0, -74.0),
            item("b", 40.0004, -74.0),
            item("c", 40.0008, -74.0),
            item("d", 41.5, -74.0),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let p1 = engine.partition(&forward, 10);
        let p2 = engine.partition(&reversed, 10);

        let members1: Vec<Vec<String>> = p1.clusters.iter().map(|c| c.member_ids.clone()).collect();
        let members2: Vec<Vec<String>> = p2.clusters.iter().map(|c| c.member_ids.clone()).collect();
        assert_eq!(members1, members2);
        assert_eq!(
            p1.singles.iter().map(|s| &s.id).collect::<Vec<_>>(),
            p2.singles.iter().map(|s| &s.id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_idempotence() {
        let engine = ClusterEngine::with_defaults();
        let items = vec![
            item("a", 40.0, -74.0),
            item("b", 40.0004, -74.0),
            item("c", 41.0, -75.0),
        ];
        let p1 = engine.partition(&items, 11);
        let p2 = engine.partition(&items, 11);
        assert_eq!(
            p1.clusters.iter().map(|c| (&c.id, &c.member_ids)).collect::<Vec<_>>(),
            p2.clusters.iter().map(|c| (&c.id, &c.member_ids)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_zero_radius_yields_all_singles() {
        let engine = ClusterEngine::new(ClusterConfig {
            max_cluster_radius_px: 0.0,
            min_cluster_size: 2,
        })
        .unwrap();
        let items = vec![item("a", 40.0, -74.0), item("b", 40.0, -74.0)];
        let p = engine.partition(&items, 10);
        assert!(p.clusters.is_empty());
        assert_eq!(p.singles.len(), 2);
    }

    #[test]
    fn test_min_cluster_size_three() {
        let engine = ClusterEngine::new(ClusterConfig {
            max_cluster_radius_px: 50.0,
            min_cluster_size: 3,
        })
        .unwrap();
        // A pair stays singles; a trio clusters
        let pair = vec![item("a", 40.0, -74.0), item("b", 40.0004, -74.0)];
        let p = engine.partition(&pair, 10);
        assert!(p.clusters.is_empty());
        assert_eq!(p.singles.len(), 2);

        let trio = vec![
            item("a", 40.0, -74.0),
            item("b", 40.0004, -74.0),
            item("c", 40.0002, -74.0003),
        ];
        let p = engine.partition(&trio, 10);
        assert_eq!(p.clusters.len(), 1);
        assert_eq!(p.clusters[0].size, 3);
    }

    #[test]
    fn test_cluster_ids_deterministic() {
        let engine = ClusterEngine::with_defaults();
        let items = vec![
            item("s1", 35.0, -90.0),
            item("s2", 35.0004, -90.0),
            item("n1", 45.0, -93.0),
            item("n2", 45.0004, -93.0),
        ];
        let p = engine.partition(&items, 10);
        let ids: Vec<&str> = p.clusters.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c0", "c1"]);
        // Canonical order sorts by latitude, so the southern pair is c0
        assert!(p.clusters[0].member_ids.contains(&"s1".to_string()));
    }

    #[test]
    fn test_payload_survives_into_singles() {
        let engine = ClusterEngine::with_defaults();
        let items = vec![ClusterableItem {
            id: "a".into(),
            position: Some(GeoPoint::new(40.0, -74.0).unwrap()),
            payload: Some("post:123".into()),
        }];
        let p = engine.partition(&items, 10);
        assert_eq!(p.singles[0].payload.as_deref(), Some("post:123"));
    }
}
