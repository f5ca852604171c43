//! Data layer and HTTP surface of a timber storefront: categories, five
//! product kinds, carts with denormalized totals, customers and orders.

pub mod cache;
pub mod catalog;
pub mod cart;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod orders;
pub mod routes;
pub mod validation;

use std::path::Path;

use axum::Router;
use sqlx::PgPool;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub use cache::AppCache;
pub use error::{AppError, Result};

/// Embedded schema migrations
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub cache: AppCache,
}

impl AppState {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            cache: AppCache::new(),
        }
    }
}

/// Full application router with middleware
pub fn app(state: AppState, media_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([routes::shopper::SESSION_KEY_HEADER.clone()]);

    routes::router()
        .nest_service("/media", ServeDir::new(media_dir))
        .fallback(routes::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
