//! Database queries for the catalog: categories and products of every kind

use rust_decimal::Decimal;
use sqlx::{PgExecutor, PgPool};
use tracing::info;

use crate::cart;
use crate::error::{AppError, Result};
use crate::models::{
    Category, NewCategory, NewProduct, Product, ProductKind, ProductRow, SidebarCategory,
};

/// Column list for a product select, uniform across kinds.
fn product_columns(kind: ProductKind) -> String {
    let working_width = if kind.has_working_width() {
        "working_width"
    } else {
        "NULL::varchar AS working_width"
    };
    format!(
        "'{}'::varchar AS kind, id, category_id, title, slug, price, depth, width, {}, length, country",
        kind.as_str(),
        working_width
    )
}

fn into_products(rows: Vec<ProductRow>) -> Result<Vec<Product>> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Get a category by slug
pub async fn get_category_by_slug<'e, E: PgExecutor<'e>>(
    executor: E,
    slug: &str,
) -> Result<Category> {
    let category = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, name, slug, image, description
        FROM main_category
        WHERE slug = $1
        "#,
    )
    .bind(slug)
    .fetch_optional(executor)
    .await?
    .ok_or(AppError::NotFound)?;

    Ok(category)
}

/// Get all categories
pub async fn get_categories(pool: &PgPool) -> Result<Vec<Category>> {
    let categories = sqlx::query_as::<_, Category>(
        r#"
        SELECT id, name, slug, image, description
        FROM main_category
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(categories)
}

/// Categories with the number of products of every kind, for the sidebar
pub async fn get_categories_for_sidebar(pool: &PgPool) -> Result<Vec<SidebarCategory>> {
    let counts = ProductKind::ALL
        .iter()
        .map(|kind| format!("(SELECT COUNT(*) FROM {} p WHERE p.category_id = c.id)", kind.table()))
        .collect::<Vec<_>>()
        .join(" + ");
    let sql = format!(
        "SELECT c.name, c.slug, ({})::bigint AS product_count FROM main_category c ORDER BY c.id",
        counts
    );

    let categories = sqlx::query_as::<_, SidebarCategory>(&sql)
        .fetch_all(pool)
        .await?;

    Ok(categories)
}

/// All products of every kind in a category
pub async fn get_category_products(pool: &PgPool, category_id: i32) -> Result<Vec<Product>> {
    let sql = ProductKind::ALL
        .iter()
        .map(|kind| {
            format!(
                "SELECT {} FROM {} WHERE category_id = $1",
                product_columns(*kind),
                kind.table()
            )
        })
        .collect::<Vec<_>>()
        .join(" UNION ALL ")
        + " ORDER BY kind, title";

    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(category_id)
        .fetch_all(pool)
        .await?;

    into_products(rows)
}

fn product_by_slug_sql(kind: ProductKind, lock: bool) -> String {
    format!(
        "SELECT {} FROM {} WHERE slug = $1{}",
        product_columns(kind),
        kind.table(),
        if lock { " FOR SHARE" } else { "" }
    )
}

async fn fetch_product_by_slug<'e, E: PgExecutor<'e>>(
    executor: E,
    kind: ProductKind,
    slug: &str,
    lock: bool,
) -> Result<Product> {
    let sql = product_by_slug_sql(kind, lock);
    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(slug)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound)?;

    Product::try_from(row)
}

/// Resolve (kind, slug) to exactly one product of that kind
pub async fn get_product_by_slug<'e, E: PgExecutor<'e>>(
    executor: E,
    kind: ProductKind,
    slug: &str,
) -> Result<Product> {
    fetch_product_by_slug(executor, kind, slug, false).await
}

/// Same as [`get_product_by_slug`], holding a share lock so the product
/// cannot be deleted before the transaction ends
pub async fn share_product_by_slug<'e, E: PgExecutor<'e>>(
    executor: E,
    kind: ProductKind,
    slug: &str,
) -> Result<Product> {
    fetch_product_by_slug(executor, kind, slug, true).await
}

/// Load products of one kind by id (missing ids are skipped)
pub async fn get_products_by_ids<'e, E: PgExecutor<'e>>(
    executor: E,
    kind: ProductKind,
    ids: &[i32],
) -> Result<Vec<Product>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ANY($1)",
        product_columns(kind),
        kind.table()
    );

    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(ids)
        .fetch_all(executor)
        .await?;

    into_products(rows)
}

/// Create a category
pub async fn create_category<'e, E: PgExecutor<'e>>(
    executor: E,
    new: NewCategory,
) -> Result<Category> {
    let new = new.validate()?;
    let category = sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO main_category (name, slug, image, description)
        VALUES ($1, $2, $3, $4)
        RETURNING id, name, slug, image, description
        "#,
    )
    .bind(&new.name)
    .bind(&new.slug)
    .bind(&new.image)
    .bind(&new.description)
    .fetch_one(executor)
    .await?;

    info!("Created category {}", category.slug);
    Ok(category)
}

/// Create a product of the given kind
pub async fn create_product<'e, E: PgExecutor<'e>>(
    executor: E,
    kind: ProductKind,
    new: &NewProduct,
) -> Result<Product> {
    new.validate(kind)?;

    let (extra_column, extra_param) = if kind.has_working_width() {
        (", working_width", ", $9")
    } else {
        ("", "")
    };
    let sql = format!(
        "INSERT INTO {} (category_id, title, slug, price, depth, width, length, country{}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8{}) RETURNING {}",
        kind.table(),
        extra_column,
        extra_param,
        product_columns(kind)
    );

    let d = &new.dimensions;
    let mut query = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(new.category_id)
        .bind(&new.title)
        .bind(&new.slug)
        .bind(new.price)
        .bind(&d.depth)
        .bind(&d.width)
        .bind(&d.length)
        .bind(&d.country);
    if kind.has_working_width() {
        query = query.bind(&d.working_width);
    }

    let product = Product::try_from(query.fetch_one(executor).await?)?;
    info!("Created {} {}", kind, product.slug);
    Ok(product)
}

/// Change a product's price.
///
/// Cart lines keep their stored totals until the cart is next saved or
/// recalculated.
pub async fn update_product_price<'e, E: PgExecutor<'e>>(
    executor: E,
    kind: ProductKind,
    slug: &str,
    price: Decimal,
) -> Result<Product> {
    crate::models::catalog::validate_price(price)?;
    let sql = format!(
        "UPDATE {} SET price = $1 WHERE slug = $2 RETURNING {}",
        kind.table(),
        product_columns(kind)
    );

    let row = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(price)
        .bind(slug)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound)?;

    info!("Price of {} {} set to {}", kind, slug, price);
    Product::try_from(row)
}

/// Delete a category together with its products of every kind.
///
/// Line items pointing at those products are dropped from open carts and
/// the affected carts recalculated in the same transaction. Carts already
/// in an order keep their lines. Affected carts are locked before anything
/// else, in id order, the same order the cart service locks them in.
pub async fn delete_category(pool: &PgPool, slug: &str) -> Result<Category> {
    let mut tx = pool.begin().await?;

    let category = get_category_by_slug(&mut *tx, slug).await?;
    let mut affected_carts = cart::queries::lock_open_carts_for_category(&mut *tx, category.id).await?;

    sqlx::query("DELETE FROM main_category WHERE id = $1")
        .bind(category.id)
        .execute(&mut *tx)
        .await?;

    for kind in ProductKind::ALL {
        let carts = cart::queries::delete_dangling_open_lines(&mut *tx, kind).await?;
        affected_carts.extend(carts);
    }
    affected_carts.sort_unstable();
    affected_carts.dedup();

    for cart_id in &affected_carts {
        cart::services::recalculate_locked(&mut *tx, *cart_id).await?;
    }

    tx.commit().await?;

    info!(
        "Deleted category {} ({} open carts recalculated)",
        category.slug,
        affected_carts.len()
    );
    Ok(category)
}
