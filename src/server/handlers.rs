use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{Offset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::cluster::{ClusterConfig, ClusterableItem, Partition};
use crate::engine::ResolvedCity;
use crate::geo::GeoPoint;
use crate::market::MarketInfo;
use crate::resolver::{ResolveFilter, METRO_POPULATION};

use super::state::{AppState, ComputeCache};

/// Highest zoom level any slippy-map client requests.
const MAX_ZOOM: u8 = 22;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

fn parse_point(lat: Option<f64>, lng: Option<f64>) -> Result<GeoPoint, ApiError> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => GeoPoint::new(lat, lng)
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("{}", e))),
        _ => Err(api_error(StatusCode::BAD_REQUEST, "Provide 'lat' and 'lng' parameters")),
    }
}

/// UTC-offset label for an IANA timezone, e.g. "UTC-05:00".
fn tz_label(tz_name: &str) -> String {
    match tz_name.parse::<Tz>() {
        Ok(tz) => {
            let secs = Utc::now().with_timezone(&tz).offset().fix().local_minus_utc();
            let sign = if secs < 0 { '-' } else { '+' };
            let abs = secs.abs();
            format!("UTC{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
        }
        Err(_) => "UTC".into(),
    }
}

// ─── GET /api/resolve ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    /// Only consider cities within this many miles.
    pub max_distance: Option<f64>,
    /// Only consider cities with at least this population.
    pub min_population: Option<u64>,
}

#[derive(Serialize)]
pub struct ResolveResponse {
    #[serde(flatten)]
    pub resolved: ResolvedCity,
    pub tz_label: String,
}

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveQuery>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let start = Instant::now();
    let point = parse_point(params.lat, params.lng)?;

    if let Some(max) = params.max_distance {
        if !max.is_finite() || max < 0.0 {
            return Err(api_error(StatusCode::BAD_REQUEST, format!("Invalid max_distance {}", max)));
        }
    }

    let resolved = if params.max_distance.is_some() || params.min_population.is_some() {
        let filter = ResolveFilter {
            max_distance_mi: params.max_distance,
            min_population: params.min_population,
        };
        state.engine.resolve_nearest_city_filtered(point, &filter)
    } else {
        state.engine.resolve_nearest_city(point)
    };

    eprintln!(
        "[{}] GET /api/resolve {} -> {} ({:.1}mi, {:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        point,
        resolved.city.id,
        resolved.distance_mi,
        start.elapsed().as_secs_f64() * 1000.0,
    );

    let tz_label = tz_label(&resolved.city.timezone);
    Ok(Json(ResolveResponse { resolved, tz_label }))
}

// ─── GET /api/within ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct WithinQuery {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
}

#[derive(Serialize)]
pub struct CityHit {
    #[serde(flatten)]
    pub city: crate::catalog::City,
    pub distance_mi: f64,
}

#[derive(Serialize)]
pub struct WithinResponse {
    pub within_radius: bool,
    pub cities: Vec<CityHit>,
}

pub async fn within(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WithinQuery>,
) -> Result<Json<WithinResponse>, ApiError> {
    let start = Instant::now();
    let point = parse_point(params.lat, params.lng)?;

    let radius = params
        .radius
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Provide a 'radius' parameter (miles)"))?;
    if !radius.is_finite() || radius < 0.0 {
        return Err(api_error(StatusCode::BAD_REQUEST, format!("Invalid radius {}", radius)));
    }

    let cities: Vec<CityHit> = state
        .engine
        .cities_within_radius(point, radius)
        .into_iter()
        .map(|(city, distance_mi)| CityHit { city: city.clone(), distance_mi })
        .collect();

    eprintln!(
        "[{}] GET /api/within {} r={}mi -> {} cities ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        point,
        radius,
        cities.len(),
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(WithinResponse { within_radius: !cities.is_empty(), cities }))
}

// ─── GET /api/metros ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct MetrosQuery {
    pub min_population: Option<u64>,
}

pub async fn metros(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MetrosQuery>,
) -> Json<Vec<crate::catalog::City>> {
    let min = params.min_population.unwrap_or(METRO_POPULATION);
    let metros: Vec<crate::catalog::City> =
        state.engine.major_metros(min).into_iter().cloned().collect();
    Json(metros)
}

// ─── GET /api/market ─────────────────────────────────────────────

#[derive(Deserialize)]
pub struct MarketQuery {
    pub city: Option<String>,
}

pub async fn market(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MarketQuery>,
) -> Result<Json<MarketInfo>, ApiError> {
    let city_id = params
        .city
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Provide a 'city' parameter"))?;

    match state.engine.market_info_for_city_id(city_id) {
        Some(info) => Ok(Json(info)),
        None => Err(api_error(StatusCode::NOT_FOUND, format!("Unknown city id '{}'", city_id))),
    }
}

// ─── POST /api/cluster ───────────────────────────────────────────

#[derive(Deserialize)]
pub struct ClusterRequest {
    pub items: Vec<ClusterableItem>,
    pub zoom: u8,
    pub max_cluster_radius_px: Option<f64>,
    pub min_cluster_size: Option<usize>,
}

pub async fn cluster(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClusterRequest>,
) -> Result<Json<Partition>, ApiError> {
    let start = Instant::now();

    if req.zoom > MAX_ZOOM {
        return Err(api_error(StatusCode::BAD_REQUEST, format!("Zoom must be 0-{}", MAX_ZOOM)));
    }
    for item in &req.items {
        if let Some(pos) = item.position {
            GeoPoint::new(pos.lat, pos.lng).map_err(|e| {
                api_error(StatusCode::BAD_REQUEST, format!("Item '{}': {}", item.id, e))
            })?;
        }
    }

    let defaults = ClusterConfig::default();
    let config = ClusterConfig {
        max_cluster_radius_px: req.max_cluster_radius_px.unwrap_or(defaults.max_cluster_radius_px),
        min_cluster_size: req.min_cluster_size.unwrap_or(defaults.min_cluster_size),
    };

    let cache_key = ComputeCache::key(&req.items, req.zoom, &config);
    {
        let cache = state.cache.lock().unwrap();
        if let Some(cached) = cache.get(cache_key) {
            eprintln!(
                "[{}] POST /api/cluster n={} z={} -> CACHED ({:.1}ms)",
                Utc::now().format("%H:%M:%S"),
                req.items.len(),
                req.zoom,
                start.elapsed().as_secs_f64() * 1000.0,
            );
            return Ok(Json(cached));
        }
    }

    let partition = state
        .engine
        .cluster_points_with(&req.items, req.zoom, config)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("{}", e)))?;

    {
        let mut cache = state.cache.lock().unwrap();
        cache.put(cache_key, partition.clone());
    }

    eprintln!(
        "[{}] POST /api/cluster n={} z={} -> {} clusters, {} singles ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        req.items.len(),
        req.zoom,
        partition.clusters.len(),
        partition.singles.len(),
        start.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(Json(partition))
}
