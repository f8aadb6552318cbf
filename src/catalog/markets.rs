//! Built-in promotional market dataset and catalog.
//!
//! Markets are provider-defined regions used to scope event lookups. Unlike
//! the city catalog, an empty market catalog is a valid state. The product
//! can run with no active markets, and the mapper reports "no market".

use crate::catalog::cities::City;
use crate::geo::{haversine_miles, GeoPoint};
use serde::Serialize;

struct MarketRecord {
    id: &'static str,
    name: &'static str,
    lat: f64,
    lng: f64,
    radius_mi: f64,
    dma: Option<u16>,
}

const BUILTIN_MARKETS: &[MarketRecord] = &[
    MarketRecord { id: "new-york", name: "New York", lat: 40.7128, lng: -74.0060, radius_mi: 60.0, dma: Some(501) },
    MarketRecord { id: "los-angeles", name: "Los Angeles", lat: 34.0522, lng: -118.2437, radius_mi: 60.0, dma: Some(803) },
    MarketRecord { id: "chicago", name: "Chicago", lat: 41.8781, lng: -87.6298, radius_mi: 55.0, dma: Some(602) },
    MarketRecord { id: "philadelphia", name: "Philadelphia", lat: 39.9526, lng: -75.1652, radius_mi: 50.0, dma: Some(504) },
    MarketRecord { id: "dallas-ft-worth", name: "Dallas-Ft. Worth", lat: 32.7767, lng: -96.7970, radius_mi: 55.0, dma: Some(623) },
    MarketRecord { id: "bay-area", name: "San Francisco Bay Area", lat: 37.7749, lng: -122.4194, radius_mi: 50.0, dma: Some(807) },
    MarketRecord { id: "washington-dc", name: "Washington, D.C.", lat: 38.9072, lng: -77.0369, radius_mi: 50.0, dma: Some(511) },
    MarketRecord { id: "houston", name: "Houston", lat: 29.7604, lng: -95.3698, radius_mi: 55.0, dma: Some(618) },
    MarketRecord { id: "boston", name: "Boston", lat: 42.3601, lng: -71.0589, radius_mi: 45.0, dma: Some(506) },
    MarketRecord { id: "atlanta", name: "Atlanta", lat: 33.7490, lng: -84.3880, radius_mi: 50.0, dma: Some(524) },
    MarketRecord { id: "phoenix", name: "Phoenix", lat: 33.4484, lng: -112.0740, radius_mi: 45.0, dma: Some(753) },
    MarketRecord { id: "seattle-tacoma", name: "Seattle-Tacoma", lat: 47.6062, lng: -122.3321, radius_mi: 45.0, dma: Some(819) },
    MarketRecord { id: "tampa-st-pete", name: "Tampa-St. Petersburg", lat: 27.9506, lng: -82.4572, radius_mi: 45.0, dma: Some(539) },
    MarketRecord { id: "minneapolis-st-paul", name: "Minneapolis-St. Paul", lat: 44.9778, lng: -93.2650, radius_mi: 45.0, dma: Some(613) },
    MarketRecord { id: "detroit", name: "Detroit", lat: 42.3314, lng: -83.0458, radius_mi: 45.0, dma: Some(505) },
    MarketRecord { id: "miami-ft-lauderdale", name: "Miami-Ft. Lauderdale", lat: 25.7617, lng: -80.1918, radius_mi: 50.0, dma: Some(528) },
    MarketRecord { id: "denver", name: "Denver", lat: 39.7392, lng: -104.9903, radius_mi: 45.0, dma: Some(751) },
    MarketRecord { id: "san-juan", name: "San Juan", lat: 18.4655, lng: -66.1057, radius_mi: 40.0, dma: None },
];

/// Direct city-to-market assignments, checked before any fallback.
const CITY_MARKETS: &[(&str, &str)] = &[
    ("nyc", "new-york"),
    ("los-angeles", "los-angeles"),
    ("chicago", "chicago"),
    ("philadelphia", "philadelphia"),
    ("dallas", "dallas-ft-worth"),
    ("fort-worth", "dallas-ft-worth"),
    ("san-francisco", "bay-area"),
    ("san-jose", "bay-area"),
    ("washington", "washington-dc"),
    ("houston", "houston"),
    ("boston", "boston"),
    ("atlanta", "atlanta"),
    ("phoenix", "phoenix"),
    ("seattle", "seattle-tacoma"),
    ("tampa", "tampa-st-pete"),
    ("minneapolis", "minneapolis-st-paul"),
    ("detroit", "detroit"),
    ("miami", "miami-ft-lauderdale"),
    ("denver", "denver"),
];

/// A promotional market region.
#[derive(Debug, Clone, Serialize)]
pub struct Market {
    pub id: String,
    pub name: String,
    pub center: GeoPoint,
    pub radius_mi: f64,
    /// DMA-style secondary regional code, where one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dma_code: Option<u16>,
}

impl MarketRecord {
    fn to_market(&self) -> Market {
        Market {
            id: self.id.to_string(),
            name: self.name.to_string(),
            center: GeoPoint { lat: self.lat, lng: self.lng },
            radius_mi: self.radius_mi,
            dma_code: self.dma,
        }
    }
}

/// The immutable market catalog. May be empty; callers get a "no market"
/// answer rather than an error in that case.
pub struct MarketCatalog {
    markets: Vec<Market>,
    city_assignments: Vec<(String, String)>,
}

impl MarketCatalog {
    pub fn builtin() -> Self {
        Self {
            markets: BUILTIN_MARKETS.iter().map(MarketRecord::to_market).collect(),
            city_assignments: CITY_MARKETS
                .iter()
                .map(|&(c, m)| (c.to_string(), m.to_string()))
                .collect(),
        }
    }

    /// A catalog with no markets at all.
    pub fn empty() -> Self {
        Self { markets: Vec::new(), city_assignments: Vec::new() }
    }

    pub fn get(&self, id: &str) -> Option<&Market> {
        self.markets.iter().find(|m| m.id == id)
    }

    /// The market directly assigned to a city id, if any.
    pub fn market_for_city(&self, city_id: &str) -> Option<&Market> {
        self.city_assignments
            .iter()
            .find(|(c, _)| c == city_id)
            .and_then(|(_, m)| self.get(m))
    }

    /// Linear nearest-market scan. None only when the catalog is empty.
    pub fn nearest(&self, point: GeoPoint) -> Option<(&Market, f64)> {
        self.markets
            .iter()
            .map(|m| (m, haversine_miles(point, m.center)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).expect("distances are finite"))
    }

    /// Nearest market to a city's center.
    pub fn nearest_to_city(&self, city: &City) -> Option<(&Market, f64)> {
        self.nearest(city.center)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Market> {
        self.markets.iter()
    }

    pub fn len(&self) -> usize {
        self.markets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markets.is_empty()
    }
}
