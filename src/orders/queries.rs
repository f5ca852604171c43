//! Database queries for customers and orders.

use sqlx::PgExecutor;

use crate::error::{AppError, Result};
use crate::models::{Customer, Order, OrderStatus};

use super::requests::ValidCheckout;

const ORDER_COLUMNS: &str = "id, customer_id, first_name, last_name, phone, email, cart_id, \
     address, status, buying_type, comment, created_at, order_date";

/// Get the customer for an account, creating it on first use
pub async fn get_or_create_customer<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: i32,
) -> Result<Customer> {
    let customer = sqlx::query_as::<_, Customer>(
        r#"
        INSERT INTO main_customer (user_id)
        VALUES ($1)
        ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
        RETURNING id, user_id, phone, address
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await?;

    Ok(customer)
}

pub async fn insert_order<'e, E: PgExecutor<'e>>(
    executor: E,
    customer_id: i32,
    cart_id: i32,
    form: &ValidCheckout,
) -> Result<Order> {
    let sql = format!(
        "INSERT INTO main_order \
         (customer_id, first_name, last_name, phone, email, cart_id, address, status, buying_type, comment, order_date) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, COALESCE($11, CURRENT_DATE)) \
         RETURNING {}",
        ORDER_COLUMNS
    );
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(customer_id)
        .bind(&form.first_name)
        .bind(&form.last_name)
        .bind(&form.phone)
        .bind(&form.email)
        .bind(cart_id)
        .bind(&form.address)
        .bind(OrderStatus::New.as_str())
        .bind(form.buying_type.as_str())
        .bind(&form.comment)
        .bind(form.order_date)
        .fetch_one(executor)
        .await?;

    Ok(order)
}

pub async fn get_order<'e, E: PgExecutor<'e>>(executor: E, order_id: i32) -> Result<Order> {
    let sql = format!("SELECT {} FROM main_order WHERE id = $1", ORDER_COLUMNS);
    sqlx::query_as::<_, Order>(&sql)
        .bind(order_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound)
}

/// Orders a customer has placed, newest first
pub async fn get_customer_orders<'e, E: PgExecutor<'e>>(
    executor: E,
    customer_id: i32,
) -> Result<Vec<Order>> {
    let sql = format!(
        "SELECT {} FROM main_order WHERE customer_id = $1 ORDER BY created_at DESC, id DESC",
        ORDER_COLUMNS
    );
    let orders = sqlx::query_as::<_, Order>(&sql)
        .bind(customer_id)
        .fetch_all(executor)
        .await?;

    Ok(orders)
}

pub async fn update_order_status<'e, E: PgExecutor<'e>>(
    executor: E,
    order_id: i32,
    status: OrderStatus,
) -> Result<Order> {
    let sql = format!(
        "UPDATE main_order SET status = $1 WHERE id = $2 RETURNING {}",
        ORDER_COLUMNS
    );
    sqlx::query_as::<_, Order>(&sql)
        .bind(status.as_str())
        .bind(order_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::NotFound)
}
