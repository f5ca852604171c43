//! Response DTOs for order endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{BuyingType, Order, OrderStatus};

#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i32,
    pub cart_id: Option<i32>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub status: OrderStatus,
    pub status_label: &'static str,
    pub buying_type: BuyingType,
    pub buying_type_label: &'static str,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub order_date: NaiveDate,
}

impl TryFrom<&Order> for OrderResponse {
    type Error = AppError;

    fn try_from(order: &Order) -> Result<Self> {
        let status = order.status()?;
        let buying_type = order.buying_type()?;
        Ok(Self {
            id: order.id,
            cart_id: order.cart_id,
            first_name: order.first_name.clone(),
            last_name: order.last_name.clone(),
            phone: order.phone.clone(),
            email: order.email.clone(),
            address: order.address.clone(),
            status,
            status_label: status.label(),
            buying_type,
            buying_type_label: buying_type.label(),
            comment: order.comment.clone(),
            created_at: order.created_at,
            order_date: order.order_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(status: &str) -> Order {
        Order {
            id: 1,
            customer_id: 2,
            first_name: "Иван".to_string(),
            last_name: "Петров".to_string(),
            phone: None,
            email: None,
            cart_id: Some(3),
            address: None,
            status: status.to_string(),
            buying_type: "delivery".to_string(),
            comment: None,
            created_at: Utc::now(),
            order_date: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
        }
    }

    #[test]
    fn test_labels_follow_status_and_buying_type() {
        let response = OrderResponse::try_from(&order("is_ready")).unwrap();
        assert_eq!(response.status, OrderStatus::IsReady);
        assert_eq!(response.status_label, "Заказ готов");
        assert_eq!(response.buying_type_label, "Доставка");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "is_ready");
        assert_eq!(json["buying_type"], "delivery");
    }

    #[test]
    fn test_unknown_stored_status_is_an_error() {
        assert!(OrderResponse::try_from(&order("shipped")).is_err());
    }
}
