//! Built-in city reference dataset and the catalog wrapper around it.
//!
//! The dataset is a compile-time table of US population centers. The catalog
//! is built once at startup, sorted descending by population (the canonical
//! ordering for major-metro queries), and never mutated afterwards.

use crate::geo::{GeoError, GeoPoint};
use serde::{Deserialize, Serialize};

struct CityRecord {
    id: &'static str,
    name: &'static str,
    lat: f64,
    lng: f64,
    radius_mi: f64,
    population: u64,
    tz: &'static str,
    state: &'static str,
    market: Option<&'static str>,
}

const BUILTIN_CITIES: &[CityRecord] = &[
    CityRecord {
        id: "nyc", name: "New York", lat: 40.7128, lng: -74.0060,
        radius_mi: 50.0, population: 8_336_817, tz: "America/New_York",
        state: "NY", market: None,
    },
    CityRecord {
        id: "los-angeles", name: "Los Angeles", lat: 34.0522, lng: -118.2437,
        radius_mi: 50.0, population: 3_979_576, tz: "America/Los_Angeles",
        state: "CA", market: None,
    },
    CityRecord {
        id: "chicago", name: "Chicago", lat: 41.8781, lng: -87.6298,
        radius_mi: 45.0, population: 2_693_976, tz: "America/Chicago",
        state: "IL", market: None,
    },
    CityRecord {
        id: "houston", name: "Houston", lat: 29.7604, lng: -95.3698,
        radius_mi: 45.0, population: 2_320_268, tz: "America/Chicago",
        state: "TX", market: None,
    },
    CityRecord {
        id: "phoenix", name: "Phoenix", lat: 33.4484, lng: -112.0740,
        radius_mi: 40.0, population: 1_680_992, tz: "America/Phoenix",
        state: "AZ", market: None,
    },
    CityRecord {
        id: "philadelphia", name: "Philadelphia", lat: 39.9526, lng: -75.1652,
        radius_mi: 40.0, population: 1_584_064, tz: "America/New_York",
        state: "PA", market: None,
    },
    CityRecord {
        id: "san-antonio", name: "San Antonio", lat: 29.4241, lng: -98.4936,
        radius_mi: 35.0, population: 1_547_253, tz: "America/Chicago",
        state: "TX", market: None,
    },
    CityRecord {
        id: "san-diego", name: "San Diego", lat: 32.7157, lng: -117.1611,
        radius_mi: 35.0, population: 1_423_851, tz: "America/Los_Angeles",
        state: "CA", market: Some("los-angeles"),
    },
    CityRecord {
        id: "dallas", name: "Dallas", lat: 32.7767, lng: -96.7970,
        radius_mi: 40.0, population: 1_343_573, tz: "America/Chicago",
        state: "TX", market: None,
    },
    CityRecord {
        id: "san-jose", name: "San Jose", lat: 37.3382, lng: -121.8863,
        radius_mi: 30.0, population: 1_021_795, tz: "America/Los_Angeles",
        state: "CA", market: None,
    },
    CityRecord {
        id: "austin", name: "Austin", lat: 30.2672, lng: -97.7431,
        radius_mi: 30.0, population: 978_908, tz: "America/Chicago",
        state: "TX", market: None,
    },
    CityRecord {
        id: "jacksonville", name: "Jacksonville", lat: 30.3322, lng: -81.6557,
        radius_mi: 30.0, population: 911_507, tz: "America/New_York",
        state: "FL", market: None,
    },
    CityRecord {
        id: "fort-worth", name: "Fort Worth", lat: 32.7555, lng: -97.3308,
        radius_mi: 30.0, population: 909_585, tz: "America/Chicago",
        state: "TX", market: None,
    },
    CityRecord {
        id: "columbus", name: "Columbus", lat: 39.9612, lng: -82.9988,
        radius_mi: 30.0, population: 898_553, tz: "America/New_York",
        state: "OH", market: None,
    },
    CityRecord {
        id: "charlotte", name: "Charlotte", lat: 35.2271, lng: -80.8431,
        radius_mi: 30.0, population: 885_708, tz: "America/New_York",
        state: "NC", market: None,
    },
    CityRecord {
        id: "san-francisco", name: "San Francisco", lat: 37.7749, lng: -122.4194,
        radius_mi: 35.0, population: 881_549, tz: "America/Los_Angeles",
        state: "CA", market: None,
    },
    CityRecord {
        id: "indianapolis", name: "Indianapolis", lat: 39.7684, lng: -86.1581,
        radius_mi: 30.0, population: 876_384, tz: "America/Indiana/Indianapolis",
        state: "IN", market: None,
    },
    CityRecord {
        id: "seattle", name: "Seattle", lat: 47.6062, lng: -122.3321,
        radius_mi: 35.0, population: 753_675, tz: "America/Los_Angeles",
        state: "WA", market: None,
    },
    CityRecord {
        id: "denver", name: "Denver", lat: 39.7392, lng: -104.9903,
        radius_mi: 35.0, population: 727_211, tz: "America/Denver",
        state: "CO", market: None,
    },
    CityRecord {
        id: "washington", name: "Washington", lat: 38.9072, lng: -77.0369,
        radius_mi: 40.0, population: 705_749, tz: "America/New_York",
        state: "DC", market: None,
    },
    CityRecord {
        id: "boston", name: "Boston", lat: 42.3601, lng: -71.0589,
        radius_mi: 35.0, population: 692_600, tz: "America/New_York",
        state: "MA", market: None,
    },
    CityRecord {
        id: "el-paso", name: "El Paso", lat: 31.7619, lng: -106.4850,
        radius_mi: 25.0, population: 681_728, tz: "America/Denver",
        state: "TX", market: None,
    },
    CityRecord {
        id: "nashville", name: "Nashville", lat: 36.1627, lng: -86.7816,
        radius_mi: 30.0, population: 670_820, tz: "America/Chicago",
        state: "TN", market: None,
    },
    CityRecord {
        id: "detroit", name: "Detroit", lat: 42.3314, lng: -83.0458,
        radius_mi: 35.0, population: 670_031, tz: "America/Detroit",
        state: "MI", market: None,
    },
    CityRecord {
        id: "oklahoma-city", name: "Oklahoma City", lat: 35.4676, lng: -97.5164,
        radius_mi: 25.0, population: 655_057, tz: "America/Chicago",
        state: "OK", market: None,
    },
    CityRecord {
        id: "portland", name: "Portland", lat: 45.5152, lng: -122.6784,
        radius_mi: 30.0, population: 654_741, tz: "America/Los_Angeles",
        state: "OR", market: None,
    },
    CityRecord {
        id: "las-vegas", name: "Las Vegas", lat: 36.1699, lng: -115.1398,
        radius_mi: 30.0, population: 651_319, tz: "America/Los_Angeles",
        state: "NV", market: None,
    },
    CityRecord {
        id: "memphis", name: "Memphis", lat: 35.1495, lng: -90.0490,
        radius_mi: 25.0, population: 651_073, tz: "America/Chicago",
        state: "TN", market: None,
    },
    CityRecord {
        id: "louisville", name: "Louisville", lat: 38.2527, lng: -85.7585,
        radius_mi: 25.0, population: 617_638, tz: "America/Kentucky/Louisville",
        state: "KY", market: None,
    },
    CityRecord {
        id: "baltimore", name: "Baltimore", lat: 39.2904, lng: -76.6122,
        radius_mi: 30.0, population: 593_490, tz: "America/New_York",
        state: "MD", market: Some("washington-dc"),
    },
    CityRecord {
        id: "milwaukee", name: "Milwaukee", lat: 43.0389, lng: -87.9065,
        radius_mi: 25.0, population: 590_157, tz: "America/Chicago",
        state: "WI", market: Some("chicago"),
    },
    CityRecord {
        id: "albuquerque", name: "Albuquerque", lat: 35.0844, lng: -106.6504,
        radius_mi: 25.0, population: 560_513, tz: "America/Denver",
        state: "NM", market: None,
    },
    CityRecord {
        id: "sacramento", name: "Sacramento", lat: 38.5816, lng: -121.4944,
        radius_mi: 30.0, population: 513_624, tz: "America/Los_Angeles",
        state: "CA", market: Some("bay-area"),
    },
    CityRecord {
        id: "atlanta", name: "Atlanta", lat: 33.7490, lng: -84.3880,
        radius_mi: 40.0, population: 506_811, tz: "America/New_York",
        state: "GA", market: None,
    },
    CityRecord {
        id: "kansas-city", name: "Kansas City", lat: 39.0997, lng: -94.5786,
        radius_mi: 30.0, population: 495_327, tz: "America/Chicago",
        state: "MO", market: None,
    },
    CityRecord {
        id: "raleigh", name: "Raleigh", lat: 35.7796, lng: -78.6382,
        radius_mi: 25.0, population: 474_069, tz: "America/New_York",
        state: "NC", market: None,
    },
    CityRecord {
        id: "miami", name: "Miami", lat: 25.7617, lng: -80.1918,
        radius_mi: 35.0, population: 467_963, tz: "America/New_York",
        state: "FL", market: None,
    },
    CityRecord {
        id: "minneapolis", name: "Minneapolis", lat: 44.9778, lng: -93.2650,
        radius_mi: 30.0, population: 429_606, tz: "America/Chicago",
        state: "MN", market: None,
    },
    CityRecord {
        id: "tampa", name: "Tampa", lat: 27.9506, lng: -82.4572,
        radius_mi: 30.0, population: 399_700, tz: "America/New_York",
        state: "FL", market: None,
    },
    CityRecord {
        id: "new-orleans", name: "New Orleans", lat: 29.9511, lng: -90.0715,
        radius_mi: 25.0, population: 390_144, tz: "America/Chicago",
        state: "LA", market: None,
    },
    CityRecord {
        id: "cleveland", name: "Cleveland", lat: 41.4993, lng: -81.6944,
        radius_mi: 30.0, population: 381_009, tz: "America/New_York",
        state: "OH", market: None,
    },
    CityRecord {
        id: "cincinnati", name: "Cincinnati", lat: 39.1031, lng: -84.5120,
        radius_mi: 25.0, population: 303_940, tz: "America/New_York",
        state: "OH", market: None,
    },
    CityRecord {
        id: "st-louis", name: "St. Louis", lat: 38.6270, lng: -90.1994,
        radius_mi: 30.0, population: 300_576, tz: "America/Chicago",
        state: "MO", market: None,
    },
    CityRecord {
        id: "pittsburgh", name: "Pittsburgh", lat: 40.4406, lng: -79.9959,
        radius_mi: 30.0, population: 300_286, tz: "America/New_York",
        state: "PA", market: None,
    },
    CityRecord {
        id: "orlando", name: "Orlando", lat: 28.5383, lng: -81.3792,
        radius_mi: 30.0, population: 287_442, tz: "America/New_York",
        state: "FL", market: Some("tampa-st-pete"),
    },
    CityRecord {
        id: "buffalo", name: "Buffalo", lat: 42.8864, lng: -78.8784,
        radius_mi: 25.0, population: 255_284, tz: "America/New_York",
        state: "NY", market: None,
    },
    CityRecord {
        id: "salt-lake-city", name: "Salt Lake City", lat: 40.7608, lng: -111.8910,
        radius_mi: 25.0, population: 200_567, tz: "America/Denver",
        state: "UT", market: None,
    },
];

/// A known reference city.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct City {
    pub id: String,
    pub name: String,
    pub center: GeoPoint,
    /// Default search radius around this city, in miles.
    pub default_radius_mi: f64,
    pub population: u64,
    /// IANA timezone name.
    pub timezone: String,
    /// State or region code.
    pub state: String,
    /// Promotional market this city belongs to, when assigned directly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_id: Option<String>,
}

impl CityRecord {
    fn to_city(&self) -> City {
        City {
            id: self.id.to_string(),
            name: self.name.to_string(),
            center: GeoPoint { lat: self.lat, lng: self.lng },
            default_radius_mi: self.radius_mi,
            population: self.population,
            timezone: self.tz.to_string(),
            state: self.state.to_string(),
            market_id: self.market.map(str::to_string),
        }
    }
}

/// The immutable city catalog. Guaranteed non-empty; sorted descending by
/// population so iteration order is the canonical major-metro order.
pub struct CityCatalog {
    cities: Vec<City>,
}

impl CityCatalog {
    /// Build the catalog from the built-in dataset.
    pub fn builtin() -> Self {
        Self::from_cities(BUILTIN_CITIES.iter().map(CityRecord::to_city).collect())
            .expect("built-in city dataset is non-empty")
    }

    /// Build a catalog from explicit entries. Fails on an empty list; the
    /// resolver's always-succeeds contract depends on a non-empty catalog.
    pub fn from_cities(cities: Vec<City>) -> Result<Self, GeoError> {
        if cities.is_empty() {
            return Err(GeoError::Catalog("city catalog must contain at least one city".into()));
        }
        let mut catalog = Self { cities };
        catalog.sort();
        Ok(catalog)
    }

    /// Build the built-in catalog with overlay entries merged in.
    /// Overlay entries replace built-in cities with the same id.
    pub fn builtin_with_overlay(overlay: Vec<City>) -> Self {
        let mut cities: Vec<City> = BUILTIN_CITIES.iter().map(CityRecord::to_city).collect();
        for entry in overlay {
            match cities.iter_mut().find(|c| c.id == entry.id) {
                Some(existing) => *existing = entry,
                None => cities.push(entry),
            }
        }
        let mut catalog = Self { cities };
        catalog.sort();
        catalog
    }

    fn sort(&mut self) {
        self.cities.sort_by(|a, b| {
            b.population.cmp(&a.population).then_with(|| a.id.cmp(&b.id))
        });
    }

    pub fn get(&self, id: &str) -> Option<&City> {
        self.cities.iter().find(|c| c.id == id)
    }

    /// Cities in descending population order.
    pub fn iter(&self) -> impl Iterator<Item = &City> {
        self.cities.iter()
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_non_empty() {
        let catalog = CityCatalog::builtin();
        assert!(catalog.len() > 40);
    }

    #[test]
    fn test_sorted_by_population_desc() {
        let catalog = CityCatalog::builtin();
        let pops: Vec<u64> = catalog.iter().map(|c| c.population).collect();
        assert!(pops.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(catalog.iter().next().unwrap().id, "nyc");
    }

    #[test]
    fn test_get_by_id() {
        let catalog = CityCatalog::builtin();
        let seattle = catalog.get("seattle").unwrap();
        assert_eq!(seattle.name, "Seattle");
        assert_eq!(seattle.state, "WA");
        assert!((seattle.center.lat - 47.6062).abs() < 0.001);
    }

    #[test]
    fn test_get_unknown_id() {
        assert!(CityCatalog::builtin().get("gotham").is_none());
    }

    #[test]
    fn test_all_coordinates_valid() {
        for city in CityCatalog::builtin().iter() {
            assert!(GeoPoint::new(city.center.lat, city.center.lng).is_ok(), "{}", city.id);
            assert!(city.default_radius_mi > 0.0);
        }
    }

    #[test]
    fn test_all_timezones_parse() {
        for city in CityCatalog::builtin().iter() {
            assert!(
                city.timezone.parse::<chrono_tz::Tz>().is_ok(),
                "bad timezone for {}: {}", city.id, city.timezone
            );
        }
    }

    #[test]
    fn test_ids_unique() {
        let catalog = CityCatalog::builtin();
        let mut ids: Vec<&str> = catalog.iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn test_from_cities_rejects_empty() {
        assert!(CityCatalog::from_cities(vec![]).is_err());
    }

    #[test]
    fn test_overlay_replaces_by_id() {
        let overlay = vec![City {
            id: "seattle".into(),
            name: "Seattle Metro".into(),
            center: GeoPoint { lat: 47.61, lng: -122.33 },
            default_radius_mi: 40.0,
            population: 760_000,
            timezone: "America/Los_Angeles".into(),
            state: "WA".into(),
            market_id: None,
        }];
        let catalog = CityCatalog::builtin_with_overlay(overlay);
        let seattle = catalog.get("seattle").unwrap();
        assert_eq!(seattle.name, "Seattle Metro");
        assert_eq!(seattle.default_radius_mi, 40.0);
        assert_eq!(catalog.len(), CityCatalog::builtin().len());
    }

    #[test]
    fn test_overlay_appends_new_city() {
        let overlay = vec![City {
            id: "boise".into(),
            name: "Boise".into(),
            center: GeoPoint { lat: 43.6150, lng: -116.2023 },
            default_radius_mi: 25.0,
            population: 235_684,
            timezone: "America/Boise".into(),
            state: "ID".into(),
            market_id: None,
        }];
        let catalog = CityCatalog::builtin_with_overlay(overlay);
        assert!(catalog.get("boise").is_some());
        assert_eq!(catalog.len(), CityCatalog::builtin().len() + 1);
    }
}
