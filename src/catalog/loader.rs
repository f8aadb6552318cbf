//! Optional catalog overlay file at ~/.geopulse/catalog.json.
//!
//! Lets a deployment extend or override the built-in city dataset without a
//! rebuild. A missing file is silently skipped. A malformed file is an
//! error; a bad overlay must not silently fall back to the defaults.

use crate::catalog::cities::City;
use crate::geo::{GeoError, GeoPoint};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct OverlayFile {
    #[serde(default)]
    cities: Vec<OverlayCity>,
}

#[derive(Deserialize)]
struct OverlayCity {
    id: String,
    name: String,
    lat: f64,
    lng: f64,
    #[serde(default = "default_radius")]
    radius_mi: f64,
    #[serde(default)]
    population: u64,
    #[serde(default = "default_timezone")]
    timezone: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    market_id: Option<String>,
}

fn default_radius() -> f64 {
    25.0
}

fn default_timezone() -> String {
    "UTC".into()
}

/// Default overlay path (~/.geopulse/catalog.json).
pub fn default_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".geopulse")
        .join("catalog.json")
}

/// Load overlay entries from an explicit path.
pub fn load_from(path: &Path) -> Result<Vec<City>, GeoError> {
    let data = fs::read_to_string(path)
        .map_err(|e| GeoError::Catalog(format!("cannot read {}: {}", path.display(), e)))?;
    parse(&data, path)
}

/// Load overlay entries from the default path, if the file exists.
pub fn load_default() -> Result<Option<Vec<City>>, GeoError> {
    let path = default_path();
    if !path.exists() {
        return Ok(None);
    }
    load_from(&path).map(Some)
}

fn parse(data: &str, path: &Path) -> Result<Vec<City>, GeoError> {
    let file: OverlayFile = serde_json::from_str(data)
        .map_err(|e| GeoError::Catalog(format!("cannot parse {}: {}", path.display(), e)))?;

    let mut cities = Vec::with_capacity(file.cities.len());
    for entry in file.cities {
        let center = GeoPoint::new(entry.lat, entry.lng).map_err(|_| {
            GeoError::Catalog(format!(
                "city '{}' has invalid coordinates ({}, {})",
                entry.id, entry.lat, entry.lng
            ))
        })?;
        if !entry.radius_mi.is_finite() || entry.radius_mi <= 0.0 {
            return Err(GeoError::Catalog(format!(
                "city '{}' has invalid radius {}", entry.id, entry.radius_mi
            )));
        }
        cities.push(City {
            id: entry.id,
            name: entry.name,
            center,
            default_radius_mi: entry.radius_mi,
            population: entry.population,
            timezone: entry.timezone,
            state: entry.state,
            market_id: entry.market_id,
        });
    }
    Ok(cities)
}
