//! Catalog route handlers: sidebar, category pages and product pages

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::db;
use crate::error::Result;
use crate::models::{CategoryDetail, ProductKind, ProductSummary, SidebarEntry};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub categories: Vec<SidebarEntry>,
}

/// Home page: categories for the sidebar
pub async fn index(State(state): State<AppState>) -> Result<Json<IndexResponse>> {
    let sidebar = state.cache.sidebar(&state.db).await?;
    Ok(Json(IndexResponse {
        categories: sidebar.iter().map(SidebarEntry::from).collect(),
    }))
}

/// Category page with the products of every kind
pub async fn category_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryDetail>> {
    let detail = state.cache.category(&state.db, &slug).await?;
    Ok(Json(detail.as_ref().clone()))
}

pub async fn product_detail(
    State(state): State<AppState>,
    Path((ct_model, slug)): Path<(String, String)>,
) -> Result<Json<ProductSummary>> {
    let kind: ProductKind = ct_model.parse()?;
    let product = db::get_product_by_slug(&state.db, kind, &slug).await?;
    Ok(Json(ProductSummary::from(&product)))
}
