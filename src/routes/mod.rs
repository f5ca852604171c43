//! HTTP routes

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod pages;
pub mod shopper;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::cache::CacheStats;
use crate::error::AppError;
use crate::AppState;

/// URL routing table
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::index))
        .route("/about/", get(pages::about))
        .route("/contact/", get(pages::contact))
        .route("/category/:slug/", get(catalog::category_detail))
        .route("/products/:ct_model/:slug/", get(catalog::product_detail))
        .route("/cart/", get(cart::cart_detail))
        .route("/add-to-cart/:ct_model/:slug/", post(cart::add_to_cart))
        .route("/remove-from-cart/:ct_model/:slug/", post(cart::remove_from_cart))
        .route("/change-quantity/:ct_model/:slug/", post(cart::change_quantity))
        .route("/check-out/", get(checkout::checkout_summary))
        .route("/make-order/", post(checkout::make_order))
        .route(checkout::THANK_YOU_PATH, get(pages::thank_you))
        .route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub cache: CacheStats,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        cache: state.cache.stats(),
    })
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}
