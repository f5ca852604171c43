//! Checkout and order management.

use sqlx::{PgExecutor, PgPool};
use tracing::info;

use crate::cart::queries as cart_queries;
use crate::cart::services::recalculate_locked;
use crate::error::{AppError, Result};
use crate::models::{CartOwner, Customer, Order, OrderStatus};

use super::queries;
use super::requests::CheckoutForm;

/// Customer record for an account, created on first use. Accounts the
/// database does not know are unauthenticated.
pub async fn customer_for_account<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i32,
) -> Result<Customer> {
    match queries::get_or_create_customer(executor, user_id).await {
        Err(AppError::NotFound) => Err(AppError::Unauthenticated),
        other => other,
    }
}

/// Turn the account's open cart into an order.
///
/// In one transaction: lock the cart, re-save it at current prices, mark it
/// `in_order` and insert the order with the contact details from `form`.
/// The cart's line items stay in place for reference.
pub async fn checkout(pool: &PgPool, user_id: i32, form: CheckoutForm) -> Result<Order> {
    let form = form.validate()?;

    let mut tx = pool.begin().await?;

    let customer = customer_for_account(&mut *tx, user_id).await?;
    let cart = cart_queries::lock_active_cart(&mut *tx, &CartOwner::Customer(customer.id))
        .await?
        .ok_or(AppError::NotFound)?;
    cart.ensure_open()?;

    let cart = recalculate_locked(&mut tx, cart.id).await?;
    if cart.total_products == 0 {
        return Err(AppError::Validation("cannot place an order for an empty cart".to_string()));
    }

    let cart = cart_queries::mark_in_order(&mut *tx, cart.id).await?;
    let order = queries::insert_order(&mut *tx, customer.id, cart.id, &form).await?;

    tx.commit().await?;

    info!(
        "Order {} placed by customer {} from cart {} ({} products, {})",
        order.id, customer.id, cart.id, cart.total_products, cart.total_price
    );
    Ok(order)
}

/// Set an order's status. Any status may follow any other.
pub async fn set_order_status(pool: &PgPool, order_id: i32, status: OrderStatus) -> Result<Order> {
    let order = queries::update_order_status(pool, order_id, status).await?;
    info!("Order {} is now {}", order.id, status);
    Ok(order)
}

/// Orders a customer has placed, newest first
pub async fn orders_for_customer(pool: &PgPool, customer_id: i32) -> Result<Vec<Order>> {
    queries::get_customer_orders(pool, customer_id).await
}

pub async fn order_by_id(pool: &PgPool, order_id: i32) -> Result<Order> {
    queries::get_order(pool, order_id).await
}
