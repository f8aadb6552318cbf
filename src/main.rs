use clap::Parser;
use std::path::PathBuf;

use geopulse::catalog::{loader, CityCatalog, MarketCatalog};
use geopulse::cluster::{ClusterConfig, ClusterableItem};
use geopulse::engine::GeoEngine;
use geopulse::geo::GeoPoint;
use geopulse::resolver::ResolveFilter;
use geopulse::server;

/// geopulse: geospatial resolution and clustering engine
///
/// Resolves coordinates to the nearest reference city and market, and
/// groups geo-tagged items into zoom-adaptive clusters.
///
/// Examples:
///   geopulse --lat 41.88 --lng -87.63
///   geopulse --lat 41.88 --lng -87.63 --within 50
///   geopulse --metros 1000000
///   geopulse --market fort-worth
///   geopulse --cluster-file items.json --zoom 14
///   geopulse --serve --port 8080
#[derive(Parser)]
#[command(name = "geopulse", version, about, long_about = None)]
struct Cli {
    /// Latitude (-90 to 90).
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude (-180 to 180).
    #[arg(long, allow_hyphen_values = true)]
    lng: Option<f64>,

    /// List catalog cities within this radius in miles, nearest first.
    #[arg(long)]
    within: Option<f64>,

    /// Resolve filter: only consider cities within this many miles.
    #[arg(long)]
    max_distance: Option<f64>,

    /// Resolve filter: only consider cities with at least this population.
    #[arg(long)]
    min_population: Option<u64>,

    /// List major metros with at least this population, largest first.
    #[arg(long)]
    metros: Option<u64>,

    /// Market info for a catalog city id (e.g. "fort-worth").
    #[arg(long)]
    market: Option<String>,

    /// Cluster items from a JSON file (array of {id, position, payload}).
    #[arg(long)]
    cluster_file: Option<PathBuf>,

    /// Map zoom level for clustering.
    #[arg(long, short = 'z', default_value_t = 12)]
    zoom: u8,

    /// Base cluster radius in screen pixels.
    #[arg(long)]
    radius_px: Option<f64>,

    /// Groups smaller than this are emitted as singles.
    #[arg(long)]
    min_cluster_size: Option<usize>,

    /// Catalog overlay file. Defaults to ~/.geopulse/catalog.json when present.
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Start the HTTP server instead of answering a one-shot query.
    #[arg(long)]
    serve: bool,

    /// Server bind host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server bind port.
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

fn main() {
    let cli = Cli::parse();
    let engine = build_engine(&cli);

    if cli.serve {
        let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("Error: Cannot start async runtime: {}", e);
            std::process::exit(1);
        });
        runtime.block_on(server::start(engine, &cli.host, cli.port));
        return;
    }

    if let Some(ref path) = cli.cluster_file {
        run_cluster(&engine, &cli, path);
        return;
    }

    if let Some(min_population) = cli.metros {
        let metros: Vec<_> = engine.major_metros(min_population).into_iter().cloned().collect();
        eprintln!("  {} metros with population >= {}", metros.len(), min_population);
        print_json(&metros);
        return;
    }

    if let Some(ref city_id) = cli.market {
        match engine.market_info_for_city_id(city_id) {
            Some(info) => print_json(&info),
            None => {
                eprintln!("Error: Unknown city id '{}'", city_id);
                std::process::exit(1);
            }
        }
        return;
    }

    let point = parse_point(&cli);

    if let Some(radius) = cli.within {
        if !radius.is_finite() || radius < 0.0 {
            eprintln!("Error: Invalid radius {}. Must be >= 0 miles.", radius);
            std::process::exit(1);
        }
        let hits: Vec<_> = engine
            .cities_within_radius(point, radius)
            .into_iter()
            .map(|(city, distance_mi)| CityHit { city: city.clone(), distance_mi })
            .collect();
        eprintln!("  {} cities within {} mi of {}", hits.len(), radius, point);
        print_json(&hits);
        return;
    }

    // Default mode: resolve the nearest city
    let resolved = if cli.max_distance.is_some() || cli.min_population.is_some() {
        let filter = ResolveFilter {
            max_distance_mi: cli.max_distance,
            min_population: cli.min_population,
        };
        engine.resolve_nearest_city_filtered(point, &filter)
    } else {
        engine.resolve_nearest_city(point)
    };

    eprintln!(
        "  \u{1F4CD} {}, {} \u{2014} {:.1} mi away (search radius {:.0} mi)",
        resolved.city.name, resolved.city.state, resolved.distance_mi, resolved.optimal_radius_mi
    );
    if let Some(ref market) = resolved.market.market_name {
        eprintln!("  Market: {}", market);
    }
    print_json(&resolved);
}

#[derive(serde::Serialize)]
struct CityHit {
    #[serde(flatten)]
    city: geopulse::catalog::City,
    distance_mi: f64,
}

fn parse_point(cli: &Cli) -> GeoPoint {
    match (cli.lat, cli.lng) {
        (Some(lat), Some(lng)) => GeoPoint::new(lat, lng).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }),
        _ => {
            eprintln!("Error: No query specified.");
            eprintln!();
            eprintln!("Usage:");
            eprintln!("  geopulse --lat 41.88 --lng -87.63");
            eprintln!("  geopulse --lat 41.88 --lng -87.63 --within 50");
            eprintln!("  geopulse --metros 1000000");
            eprintln!("  geopulse --market fort-worth");
            eprintln!("  geopulse --cluster-file items.json --zoom 14");
            eprintln!("  geopulse --serve");
            std::process::exit(1);
        }
    }
}

fn build_engine(cli: &Cli) -> GeoEngine {
    let overlay = match cli.catalog {
        Some(ref path) => loader::load_from(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }),
        None => loader::load_default()
            .unwrap_or_else(|e| {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            })
            .unwrap_or_default(),
    };

    let cities = if overlay.is_empty() {
        CityCatalog::builtin()
    } else {
        eprintln!("  Merged {} overlay cities into the catalog", overlay.len());
        CityCatalog::builtin_with_overlay(overlay)
    };

    GeoEngine::with_catalogs(cities, MarketCatalog::builtin())
}

fn run_cluster(engine: &GeoEngine, cli: &Cli, path: &PathBuf) {
    let data = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Error: Cannot read {}: {}", path.display(), e);
        std::process::exit(1);
    });
    let items: Vec<ClusterableItem> = serde_json::from_str(&data).unwrap_or_else(|e| {
        eprintln!("Error: Cannot parse {}: {}", path.display(), e);
        std::process::exit(1);
    });

    for item in &items {
        if let Some(pos) = item.position {
            if let Err(e) = GeoPoint::new(pos.lat, pos.lng) {
                eprintln!("Error: Item '{}': {}", item.id, e);
                std::process::exit(1);
            }
        }
    }

    let defaults = ClusterConfig::default();
    let config = ClusterConfig {
        max_cluster_radius_px: cli.radius_px.unwrap_or(defaults.max_cluster_radius_px),
        min_cluster_size: cli.min_cluster_size.unwrap_or(defaults.min_cluster_size),
    };

    let partition = engine
        .cluster_points_with(&items, cli.zoom, config)
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    eprintln!(
        "  {} items -> {} clusters, {} singles at zoom {}",
        items.len(),
        partition.clusters.len(),
        partition.singles.len(),
        cli.zoom
    );
    print_json(&partition);
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error: Cannot serialize output: {}", e);
            std::process::exit(1);
        }
    }
}
