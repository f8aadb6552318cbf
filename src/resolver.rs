//! Nearest-city resolution over the city catalog.
//!
//! Every query is a linear scan over the catalog (dozens of entries, built
//! once, never mutated). The resolver is deliberately infallible: a point
//! in the middle of an ocean still gets a
//! nearest city, just a distant one. There is no "not found" path.

use crate::catalog::{City, CityCatalog};
use crate::geo::{haversine_miles, GeoPoint};

/// Population at or above which a city is treated as a major metro.
pub const METRO_POPULATION: u64 = 1_000_000;

/// Major metros never get a search radius below this, in miles.
const METRO_RADIUS_FLOOR_MI: f64 = 35.0;

/// How far past the nearest city's own radius the search radius stretches
/// for points outside it.
const REMOTE_EXPANSION: f64 = 1.25;

/// Optional constraints for filtered resolution.
#[derive(Debug, Clone, Default)]
pub struct ResolveFilter {
    /// Only consider cities within this many miles.
    pub max_distance_mi: Option<f64>,
    /// Only consider cities with at least this population.
    pub min_population: Option<u64>,
}

impl ResolveFilter {
    fn admits(&self, city: &City, distance: f64) -> bool {
        if let Some(max) = self.max_distance_mi {
            if distance > max {
                return false;
            }
        }
        if let Some(min) = self.min_population {
            if city.population < min {
                return false;
            }
        }
        true
    }
}

/// Nearest-neighbor search over a borrowed city catalog.
pub struct NearestCityResolver<'a> {
    catalog: &'a CityCatalog,
}

impl<'a> NearestCityResolver<'a> {
    pub fn new(catalog: &'a CityCatalog) -> Self {
        Self { catalog }
    }

    /// The catalog city nearest to `point`, with the distance in miles.
    pub fn nearest(&self, point: GeoPoint) -> (&'a City, f64) {
        self.catalog
            .iter()
            .map(|c| (c, haversine_miles(point, c.center)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).expect("distances are finite"))
            .expect("city catalog is non-empty by construction")
    }

    /// Nearest city satisfying the filter constraints.
    ///
    /// Candidates are filtered by `max_distance_mi` and `min_population`
    /// before ranking by distance. When no city satisfies the constraints,
    /// this falls back to the unfiltered nearest city, preserving the
    /// always-succeeds contract.
    pub fn nearest_filtered(&self, point: GeoPoint, filter: &ResolveFilter) -> (&'a City, f64) {
        self.catalog
            .iter()
            .map(|c| (c, haversine_miles(point, c.center)))
            .filter(|(c, d)| filter.admits(c, *d))
            .min_by(|a, b| a.1.partial_cmp(&b.1).expect("distances are finite"))
            .unwrap_or_else(|| self.nearest(point))
    }

    /// True iff any catalog city lies within `max_mi` of `point`.
    pub fn is_within_radius(&self, point: GeoPoint, max_mi: f64) -> bool {
        self.catalog
            .iter()
            .any(|c| haversine_miles(point, c.center) <= max_mi)
    }

    /// Recommended search radius around `point`, in miles.
    ///
    /// Starts from the nearest city's configured radius, stretches to 1.25×
    /// the distance for points outside that radius, and is floored at 35 mi
    /// when the nearest city is a million-plus metro.
    pub fn optimal_search_radius(&self, point: GeoPoint) -> f64 {
        let (city, distance) = self.nearest(point);
        let mut radius = city.default_radius_mi;
        if distance > radius {
            radius = distance * REMOTE_EXPANSION;
        }
        if city.population >= METRO_POPULATION {
            radius = radius.max(METRO_RADIUS_FLOOR_MI);
        }
        radius
    }

    /// All cities within `max_mi` of `point`, nearest first.
    pub fn cities_within_radius(&self, point: GeoPoint, max_mi: f64) -> Vec<(&'a City, f64)> {
        let mut hits: Vec<(&City, f64)> = self
            .catalog
            .iter()
            .map(|c| (c, haversine_miles(point, c.center)))
            .filter(|(_, d)| *d <= max_mi)
            .collect();
        hits.sort_by(|a, b| a.1.partial_cmp(&b.1).expect("distances are finite"));
        hits
    }

    /// Cities with population >= `min_population`, descending by population.
    pub fn major_metros(&self, min_population: u64) -> Vec<&'a City> {
        // Catalog iteration order is already descending by population.
        self.catalog
            .iter()
            .filter(|c| c.population >= min_population)
            .collect()
    }
}
