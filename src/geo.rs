//! Geographic primitives: coordinates, great-circle distance, and the
//! Web Mercator scale factor used to map ground distance onto screen pixels.
//!
//! Distances are in statute miles throughout the crate; the cluster engine
//! converts to meters only at the pixel-conversion boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MI: f64 = 3958.7613;

/// Statute miles to meters.
pub const MILES_TO_METERS: f64 = 1609.344;

/// Web Mercator ground resolution at the equator, zoom 0 (meters per pixel).
const MERCATOR_EQUATOR_MPP: f64 = 156543.03392;

/// A validated latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Construct a point, rejecting NaN and out-of-range coordinates.
    pub fn new(lat: f64, lng: f64) -> Result<Self, GeoError> {
        if !lat.is_finite() || !lng.is_finite()
            || !(-90.0..=90.0).contains(&lat)
            || !(-180.0..=180.0).contains(&lng)
        {
            return Err(GeoError::InvalidCoordinate { lat, lng });
        }
        Ok(Self { lat, lng })
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ns = if self.lat < 0.0 { 'S' } else { 'N' };
        let ew = if self.lng < 0.0 { 'W' } else { 'E' };
        write!(f, "{:.4}°{} {:.4}°{}", self.lat.abs(), ns, self.lng.abs(), ew)
    }
}

/// Great-circle distance between two points, in miles (haversine).
///
/// Symmetric, non-negative, exactly zero for identical points. Spherical
/// approximation with no ellipsoidal correction; error is negligible at
/// city-distance scale.
pub fn haversine_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_MI * h.sqrt().min(1.0).asin()
}

/// Great-circle distance in meters.
pub fn haversine_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    haversine_miles(a, b) * MILES_TO_METERS
}

/// Web Mercator ground resolution at a latitude and integer zoom level.
///
/// Higher zoom means fewer meters per pixel. The cosine term accounts for
/// Mercator stretching away from the equator.
pub fn meters_per_pixel(lat: f64, zoom: u8) -> f64 {
    MERCATOR_EQUATOR_MPP * lat.to_radians().cos() / 2_f64.powi(zoom as i32)
}

/// Validation and catalog errors.
#[derive(Debug)]
pub enum GeoError {
    /// Latitude or longitude outside the valid range, or NaN.
    InvalidCoordinate { lat: f64, lng: f64 },
    /// A radius that is negative or non-finite.
    InvalidRadius(f64),
    /// A minimum cluster size of zero.
    InvalidClusterSize,
    /// A catalog overlay file could not be read or parsed.
    Catalog(String),
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCoordinate { lat, lng } => {
                write!(f, "Invalid coordinates ({}, {}). Lat: -90..90, Lng: -180..180", lat, lng)
            }
            Self::InvalidRadius(r) => write!(f, "Invalid radius {}: must be finite and >= 0", r),
            Self::InvalidClusterSize => write!(f, "Minimum cluster size must be at least 1"),
            Self::Catalog(msg) => write!(f, "Catalog error: {}", msg),
        }
    }
}

impl std::error::Error for GeoError {}
