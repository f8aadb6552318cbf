//! City-to-market resolution.
//!
//! Markets scope third-party event lookups. Resolution walks three tiers:
//! direct city assignment, the city's own embedded market id, then a plain
//! geographic nearest-market scan. With a non-empty market catalog some
//! suggestion always comes back; with an empty one the answer is an explicit
//! "no market". Both are terminal states, neither is an error.

use crate::catalog::{City, MarketCatalog};
use crate::geo::GeoPoint;
use serde::Serialize;

/// A resolved market suggestion. All fields may be absent.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MarketInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_name: Option<String>,
    /// DMA-style regional code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_id: Option<u16>,
}

impl MarketInfo {
    /// The explicit "no market" result.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        self.market_id.is_none()
    }
}

/// Maps cities (and raw points) to promotional markets.
pub struct MarketMapper<'a> {
    catalog: &'a MarketCatalog,
}

impl<'a> MarketMapper<'a> {
    pub fn new(catalog: &'a MarketCatalog) -> Self {
        Self { catalog }
    }

    /// Resolve a city to its market.
    ///
    /// Tier 1: the catalog's direct city assignment. Tier 2: the city's own
    /// embedded `market_id` (resolved against the catalog for name and region;
    /// kept as a bare id if the catalog no longer lists it). Tier 3: nearest
    /// market to the city's center.
    pub fn market_info(&self, city: &City) -> MarketInfo {
        if let Some(market) = self.catalog.market_for_city(&city.id) {
            return MarketInfo {
                market_id: Some(market.id.clone()),
                market_name: Some(market.name.clone()),
                region_id: market.dma_code,
            };
        }

        if let Some(ref embedded) = city.market_id {
            return match self.catalog.get(embedded) {
                Some(market) => MarketInfo {
                    market_id: Some(market.id.clone()),
                    market_name: Some(market.name.clone()),
                    region_id: market.dma_code,
                },
                // Assignment survives even when the market record is gone
                None => MarketInfo {
                    market_id: Some(embedded.clone()),
                    market_name: None,
                    region_id: None,
                },
            };
        }

        match self.catalog.nearest_to_city(city) {
            Some((market, _)) => MarketInfo {
                market_id: Some(market.id.clone()),
                market_name: Some(market.name.clone()),
                region_id: market.dma_code,
            },
            None => MarketInfo::none(),
        }
    }

    /// Nearest market to an arbitrary point. None only on an empty catalog.
    pub fn nearest_market(&self, point: GeoPoint) -> Option<(&'a crate::catalog::Market, f64)> {
        self.catalog.nearest(point)
    }
}
