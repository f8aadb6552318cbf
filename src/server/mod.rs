//! HTTP surface for the engine.
//!
//! Thin axum layer over [`crate::engine::GeoEngine`]. Every route is a pure
//! computation, so requests are independently cancellable and idempotent;
//! a client that abandons a stale viewport request loses nothing.

mod handlers;
mod state;

use axum::http::header::{HeaderValue, CACHE_CONTROL};
use axum::routing::{get, post};
use axum::Router;
use state::AppState;
use std::sync::Arc;
use std::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::engine::GeoEngine;

pub fn build_router(engine: GeoEngine) -> Router {
    let state = Arc::new(AppState {
        engine,
        cache: Mutex::new(state::ComputeCache::new()),
    });

    Router::new()
        .route("/api/resolve", get(handlers::resolve))
        .route("/api/within", get(handlers::within))
        .route("/api/metros", get(handlers::metros))
        .route("/api/market", get(handlers::market))
        .route("/api/cluster", post(handlers::cluster))
        .layer(CorsLayer::permissive())
        // Results depend on the live viewport; intermediaries must not cache
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .with_state(state)
}

pub async fn start(engine: GeoEngine, host: &str, port: u16) {
    let app = build_router(engine);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Error: Cannot bind to {}: {}", addr, e);
            std::process::exit(1);
        });

    eprintln!("  geopulse server listening on http://{}", addr);
    eprintln!("  Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Server error: {}", e);
            std::process::exit(1);
        });
}
