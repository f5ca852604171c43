//! Catalog writes.
//!
//! Every write goes through here so the cached sidebar and category pages
//! are dropped as soon as it commits.

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::cache::AppCache;
use crate::db;
use crate::error::Result;
use crate::models::{Category, NewCategory, NewProduct, Product, ProductKind};

pub async fn create_category(db: &PgPool, cache: &AppCache, new: NewCategory) -> Result<Category> {
    let category = db::create_category(db, new).await?;
    cache.invalidate_catalog();
    Ok(category)
}

pub async fn create_product(
    db: &PgPool,
    cache: &AppCache,
    kind: ProductKind,
    new: &NewProduct,
) -> Result<Product> {
    let product = db::create_product(db, kind, new).await?;
    cache.invalidate_catalog();
    Ok(product)
}

/// Change a product's price. Stored carts pick it up on their next save
/// or [`crate::cart::recalculate_cart`].
pub async fn update_product_price(
    db: &PgPool,
    cache: &AppCache,
    kind: ProductKind,
    slug: &str,
    price: Decimal,
) -> Result<Product> {
    let product = db::update_product_price(db, kind, slug, price).await?;
    cache.invalidate_catalog();
    Ok(product)
}

/// Delete a category with its products; see [`db::delete_category`]
pub async fn delete_category(db: &PgPool, cache: &AppCache, slug: &str) -> Result<Category> {
    let category = db::delete_category(db, slug).await?;
    cache.invalidate_catalog();
    Ok(category)
}
