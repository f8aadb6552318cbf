//! GeoPulse: the geospatial resolution and clustering engine behind the
//! map surface of a location-based posting product.
//!
//! Two independent halves share one distance primitive:
//!
//! - **Resolution**: map an arbitrary coordinate to the nearest reference
//!   city and its promotional market, with adaptive search radii for remote
//!   locations ([`engine::GeoEngine::resolve_nearest_city`]).
//! - **Clustering**: partition geo-tagged items into zoom-adaptive visual
//!   clusters for marker display ([`engine::GeoEngine::cluster_points`]).
//!
//! All operations are pure and synchronous over immutable catalogs; the
//! engine is freely shareable across threads.

pub mod catalog;
pub mod cluster;
pub mod engine;
pub mod geo;
pub mod market;
pub mod resolver;
pub mod server;

pub use catalog::{City, CityCatalog, Market, MarketCatalog};
pub use cluster::{Cluster, ClusterConfig, ClusterEngine, ClusterableItem, Partition};
pub use engine::{GeoEngine, ResolvedCity};
pub use geo::{GeoError, GeoPoint};
pub use market::{MarketInfo, MarketMapper};
pub use resolver::{NearestCityResolver, ResolveFilter};
