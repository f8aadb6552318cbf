//! The GeoEngine, primary public API.
//!
//! Owns the two catalogs and the cluster engine, and exposes the external
//! contract consumed by the map rendering layer: resolve a point to a city
//! and market, test radius containment, and partition markers for display.
//!
//! Every operation is a pure computation over immutable state (`&self`
//! everywhere, no interior mutability), so one engine can be shared across
//! threads without locks.

use crate::catalog::{City, CityCatalog, MarketCatalog};
use crate::cluster::{ClusterConfig, ClusterEngine, ClusterableItem, Partition};
use crate::geo::{GeoError, GeoPoint};
use crate::market::{MarketInfo, MarketMapper};
use crate::resolver::{NearestCityResolver, ResolveFilter};
use serde::Serialize;

/// A nearest-city answer with everything the overlay layer needs in one shot.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedCity {
    pub city: City,
    /// Distance from the query point to the city center, in miles.
    pub distance_mi: f64,
    /// Recommended search radius around the query point, in miles.
    pub optimal_radius_mi: f64,
    pub market: MarketInfo,
}

/// The resolution and clustering engine.
pub struct GeoEngine {
    cities: CityCatalog,
    markets: MarketCatalog,
    cluster: ClusterEngine,
}

impl GeoEngine {
    /// Engine over the built-in catalogs with default cluster settings.
    pub fn new() -> Self {
        Self::with_catalogs(CityCatalog::builtin(), MarketCatalog::builtin())
    }

    pub fn with_catalogs(cities: CityCatalog, markets: MarketCatalog) -> Self {
        Self { cities, markets, cluster: ClusterEngine::with_defaults() }
    }

    /// Replace the cluster configuration.
    pub fn with_cluster_config(mut self, config: ClusterConfig) -> Result<Self, GeoError> {
        self.cluster = ClusterEngine::new(config)?;
        Ok(self)
    }

    pub fn city_catalog(&self) -> &CityCatalog {
        &self.cities
    }

    pub fn market_catalog(&self) -> &MarketCatalog {
        &self.markets
    }

    /// Nearest city to a point, with distance, search radius, and market.
    /// Never fails: remote points resolve to a distant city.
    pub fn resolve_nearest_city(&self, point: GeoPoint) -> ResolvedCity {
        let resolver = NearestCityResolver::new(&self.cities);
        let (city, distance_mi) = resolver.nearest(point);
        self.resolved(point, city, distance_mi)
    }

    /// Nearest city under optional constraints (filter-then-fallback).
    pub fn resolve_nearest_city_filtered(
        &self,
        point: GeoPoint,
        filter: &ResolveFilter,
    ) -> ResolvedCity {
        let resolver = NearestCityResolver::new(&self.cities);
        let (city, distance_mi) = resolver.nearest_filtered(point, filter);
        self.resolved(point, city, distance_mi)
    }

    fn resolved(&self, point: GeoPoint, city: &City, distance_mi: f64) -> ResolvedCity {
        let resolver = NearestCityResolver::new(&self.cities);
        ResolvedCity {
            market: MarketMapper::new(&self.markets).market_info(city),
            optimal_radius_mi: resolver.optimal_search_radius(point),
            distance_mi,
            city: city.clone(),
        }
    }

    /// True iff any catalog city lies within `max_mi` of the point.
    pub fn is_within_event_radius(&self, point: GeoPoint, max_mi: f64) -> bool {
        NearestCityResolver::new(&self.cities).is_within_radius(point, max_mi)
    }

    /// Recommended search radius for a point, in miles.
    pub fn optimal_search_radius(&self, point: GeoPoint) -> f64 {
        NearestCityResolver::new(&self.cities).optimal_search_radius(point)
    }

    /// Market suggestion for a city (three-tier fallback).
    pub fn market_info(&self, city: &City) -> MarketInfo {
        MarketMapper::new(&self.markets).market_info(city)
    }

    /// Market suggestion for a catalog city id. None for unknown ids.
    pub fn market_info_for_city_id(&self, city_id: &str) -> Option<MarketInfo> {
        self.cities.get(city_id).map(|c| self.market_info(c))
    }

    /// Partition items with the engine's configured cluster settings.
    pub fn cluster_points(&self, items: &[ClusterableItem], zoom: u8) -> Partition {
        self.cluster.partition(items, zoom)
    }

    /// Partition items with per-request cluster settings.
    pub fn cluster_points_with(
        &self,
        items: &[ClusterableItem],
        zoom: u8,
        config: ClusterConfig,
    ) -> Result<Partition, GeoError> {
        Ok(ClusterEngine::new(config)?.partition(items, zoom))
    }

    /// Cities within `max_mi` of a point, nearest first.
    pub fn cities_within_radius(&self, point: GeoPoint, max_mi: f64) -> Vec<(&City, f64)> {
        NearestCityResolver::new(&self.cities).cities_within_radius(point, max_mi)
    }

    /// Cities at or above a population threshold, descending by population.
    pub fn major_metros(&self, min_population: u64) -> Vec<&City> {
        NearestCityResolver::new(&self.cities).major_metros(min_population)
    }
}

impl Default for GeoEngine {
    fn default() -> Self {
        Self::new()
    }
}
