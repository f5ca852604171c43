//! Database queries for carts and cart line items.

use sqlx::PgExecutor;

use crate::error::{AppError, Result};
use crate::models::{Cart, CartOwner, CartProduct, ProductKind};

use super::calculators::{CartLine, CartTotals};

const CART_COLUMNS: &str =
    "id, owner_id, session_key, total_products, total_price, in_order, for_anonymous_user";

const LINE_COLUMNS: &str = "id, user_id, cart_id, product_kind, object_id, quantity, total_price";

fn active_cart_sql(owner: &CartOwner, lock: bool) -> String {
    let filter = match owner {
        CartOwner::Customer(_) => "owner_id = $1",
        CartOwner::Anonymous(_) => "session_key = $1 AND for_anonymous_user",
    };
    format!(
        "SELECT {} FROM main_cart WHERE {} AND NOT in_order ORDER BY id LIMIT 1{}",
        CART_COLUMNS,
        filter,
        if lock { " FOR UPDATE" } else { "" }
    )
}

async fn fetch_active_cart<'e, E: PgExecutor<'e>>(
    executor: E,
    owner: &CartOwner,
    lock: bool,
) -> Result<Option<Cart>> {
    let sql = active_cart_sql(owner, lock);
    let query = sqlx::query_as::<_, Cart>(&sql);
    let query = match owner {
        CartOwner::Customer(customer_id) => query.bind(*customer_id),
        CartOwner::Anonymous(session_key) => query.bind(*session_key),
    };
    Ok(query.fetch_optional(executor).await?)
}

/// Find the owner's cart that is not yet in an order
pub async fn find_active_cart<'e, E: PgExecutor<'e>>(
    executor: E,
    owner: &CartOwner,
) -> Result<Option<Cart>> {
    fetch_active_cart(executor, owner, false).await
}

/// Same as [`find_active_cart`], locking the row for the rest of the transaction
pub async fn lock_active_cart<'e, E: PgExecutor<'e>>(
    executor: E,
    owner: &CartOwner,
) -> Result<Option<Cart>> {
    fetch_active_cart(executor, owner, true).await
}

/// Lock a cart by id
pub async fn lock_cart<'e, E: PgExecutor<'e>>(executor: E, cart_id: i32) -> Result<Cart> {
    let sql = format!("SELECT {} FROM main_cart WHERE id = $1 FOR UPDATE", CART_COLUMNS);
    sqlx::query_as::<_, Cart>(&sql)
        .bind(cart_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound)
}

/// Get a cart by id
pub async fn get_cart<'e, E: PgExecutor<'e>>(executor: E, cart_id: i32) -> Result<Cart> {
    let sql = format!("SELECT {} FROM main_cart WHERE id = $1", CART_COLUMNS);
    sqlx::query_as::<_, Cart>(&sql)
        .bind(cart_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound)
}

/// Insert an empty open cart for the owner unless one already exists.
///
/// Concurrent callers are serialized by the unique partial indexes on open
/// carts; follow up with [`lock_active_cart`] to get the row.
pub async fn insert_cart_if_absent<'e, E: PgExecutor<'e>>(
    executor: E,
    owner: &CartOwner,
) -> Result<bool> {
    let (owner_id, session_key, anonymous) = match owner {
        CartOwner::Customer(customer_id) => (Some(*customer_id), None, false),
        CartOwner::Anonymous(session_key) => (None, Some(*session_key), true),
    };
    let result = sqlx::query(
        "INSERT INTO main_cart (owner_id, session_key, for_anonymous_user) \
         VALUES ($1, $2, $3) ON CONFLICT DO NOTHING",
    )
    .bind(owner_id)
    .bind(session_key)
    .bind(anonymous)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Line items of a cart, oldest first
pub async fn get_cart_lines<'e, E: PgExecutor<'e>>(
    executor: E,
    cart_id: i32,
) -> Result<Vec<CartProduct>> {
    let sql = format!(
        "SELECT {} FROM main_cartproduct WHERE cart_id = $1 ORDER BY id",
        LINE_COLUMNS
    );
    let lines = sqlx::query_as::<_, CartProduct>(&sql)
        .bind(cart_id)
        .fetch_all(executor)
        .await?;

    Ok(lines)
}

pub async fn insert_line<'e, E: PgExecutor<'e>>(
    executor: E,
    cart: &Cart,
    line: &CartLine,
) -> Result<CartProduct> {
    let sql = format!(
        "INSERT INTO main_cartproduct (user_id, cart_id, product_kind, object_id, quantity, total_price) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
        LINE_COLUMNS
    );
    let row = sqlx::query_as::<_, CartProduct>(&sql)
        .bind(cart.owner_id)
        .bind(cart.id)
        .bind(line.product.kind.as_str())
        .bind(line.product.id)
        .bind(line.quantity)
        .bind(line.total_price)
        .fetch_one(executor)
        .await?;

    Ok(row)
}

pub async fn update_line<'e, E: PgExecutor<'e>>(
    executor: E,
    cart: &Cart,
    line_id: i32,
    line: &CartLine,
) -> Result<CartProduct> {
    let sql = format!(
        "UPDATE main_cartproduct SET user_id = $1, quantity = $2, total_price = $3 \
         WHERE id = $4 AND cart_id = $5 RETURNING {}",
        LINE_COLUMNS
    );
    sqlx::query_as::<_, CartProduct>(&sql)
        .bind(cart.owner_id)
        .bind(line.quantity)
        .bind(line.total_price)
        .bind(line_id)
        .bind(cart.id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn delete_line<'e, E: PgExecutor<'e>>(executor: E, line_id: i32) -> Result<()> {
    sqlx::query("DELETE FROM main_cartproduct WHERE id = $1")
        .bind(line_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Store recomputed totals
pub async fn update_cart_totals<'e, E: PgExecutor<'e>>(
    executor: E,
    cart_id: i32,
    totals: &CartTotals,
) -> Result<Cart> {
    let sql = format!(
        "UPDATE main_cart SET total_products = $1, total_price = $2 WHERE id = $3 RETURNING {}",
        CART_COLUMNS
    );
    sqlx::query_as::<_, Cart>(&sql)
        .bind(totals.total_products)
        .bind(totals.total_price)
        .bind(cart_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound)
}

/// Freeze a cart once it has become an order
pub async fn mark_in_order<'e, E: PgExecutor<'e>>(executor: E, cart_id: i32) -> Result<Cart> {
    let sql = format!(
        "UPDATE main_cart SET in_order = TRUE WHERE id = $1 RETURNING {}",
        CART_COLUMNS
    );
    sqlx::query_as::<_, Cart>(&sql)
        .bind(cart_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound)
}

/// Delete a cart; its line items go with it
pub async fn delete_cart<'e, E: PgExecutor<'e>>(executor: E, cart_id: i32) -> Result<()> {
    sqlx::query("DELETE FROM main_cart WHERE id = $1")
        .bind(cart_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Open carts holding products of a category, locked in id order
pub async fn lock_open_carts_for_category<'e, E: PgExecutor<'e>>(
    executor: E,
    category_id: i32,
) -> Result<Vec<i32>> {
    let sql = format!(
        "SELECT id FROM main_cart \
         WHERE NOT in_order AND id IN (SELECT cp.cart_id FROM main_cartproduct cp WHERE {}) \
         ORDER BY id FOR UPDATE",
        category_lines_filter()
    );
    let cart_ids = sqlx::query_scalar::<_, i32>(&sql)
        .bind(category_id)
        .fetch_all(executor)
        .await?;

    Ok(cart_ids)
}

/// Lines (alias `cp`) referencing any product of category `$1`
fn category_lines_filter() -> String {
    ProductKind::ALL
        .iter()
        .map(|kind| {
            format!(
                "(cp.product_kind = '{}' AND cp.object_id IN (SELECT id FROM {} WHERE category_id = $1))",
                kind.as_str(),
                kind.table()
            )
        })
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Drop lines of open carts whose product of `kind` no longer exists.
/// Returns the ids of the carts that lost lines.
pub async fn delete_dangling_open_lines<'e, E: PgExecutor<'e>>(
    executor: E,
    kind: ProductKind,
) -> Result<Vec<i32>> {
    let sql = format!(
        "DELETE FROM main_cartproduct cp USING main_cart c \
         WHERE cp.cart_id = c.id AND NOT c.in_order AND cp.product_kind = $1 \
         AND NOT EXISTS (SELECT 1 FROM {} p WHERE p.id = cp.object_id) \
         RETURNING cp.cart_id",
        kind.table()
    );
    let cart_ids = sqlx::query_scalar::<_, i32>(&sql)
        .bind(kind.as_str())
        .fetch_all(executor)
        .await?;

    Ok(cart_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_active_cart_sql_filters_by_owner_kind() {
        let customer = active_cart_sql(&CartOwner::Customer(1), false);
        assert!(customer.contains("owner_id = $1"));
        assert!(customer.contains("NOT in_order"));
        assert!(!customer.ends_with("FOR UPDATE"));

        let anonymous = active_cart_sql(&CartOwner::Anonymous(Uuid::nil()), true);
        assert!(anonymous.contains("session_key = $1 AND for_anonymous_user"));
        assert!(anonymous.ends_with("FOR UPDATE"));
    }

    #[test]
    fn test_category_filter_covers_every_kind() {
        let filter = category_lines_filter();
        for kind in ProductKind::ALL {
            assert!(filter.contains(&format!("cp.product_kind = '{}'", kind.as_str())));
            assert!(filter.contains(kind.table()));
        }
        assert_eq!(filter.matches(" OR ").count(), ProductKind::ALL.len() - 1);
    }
}
