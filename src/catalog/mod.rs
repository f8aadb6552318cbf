//! Static reference catalogs for the resolution engine.
//!
//! Both catalogs are built once at startup and read-only afterwards. The
//! city catalog is guaranteed non-empty; the market catalog may be empty.

pub mod cities;
pub mod loader;
pub mod markets;

pub use cities::{City, CityCatalog};
pub use markets::{Market, MarketCatalog};
