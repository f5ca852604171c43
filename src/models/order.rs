//! Customer and order models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::{AppError, Result};

/// Customer from main_customer (one per account)
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Customer {
    pub id: i32,
    pub user_id: i32,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Order lifecycle. Any status may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    New,
    InProgress,
    IsReady,
    Completed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::New,
        OrderStatus::InProgress,
        OrderStatus::IsReady,
        OrderStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::New => "new",
            OrderStatus::InProgress => "in_progress",
            OrderStatus::IsReady => "is_ready",
            OrderStatus::Completed => "completed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::New => "Новый заказ",
            OrderStatus::InProgress => "Заказ в обработке",
            OrderStatus::IsReady => "Заказ готов",
            OrderStatus::Completed => "Заказ выполнен",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("unknown order status '{}'", s)))
    }
}

/// How the customer receives the order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BuyingType {
    #[default]
    #[serde(rename = "self")]
    SelfPickup,
    #[serde(rename = "delivery")]
    Delivery,
}

impl BuyingType {
    pub const ALL: [BuyingType; 2] = [BuyingType::SelfPickup, BuyingType::Delivery];

    pub fn as_str(self) -> &'static str {
        match self {
            BuyingType::SelfPickup => "self",
            BuyingType::Delivery => "delivery",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BuyingType::SelfPickup => "Самовывоз",
            BuyingType::Delivery => "Доставка",
        }
    }
}

impl fmt::Display for BuyingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuyingType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        BuyingType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("unknown buying type '{}'", s)))
    }
}

/// Order from main_order.
///
/// Contact fields are a snapshot of the checkout form and may differ from
/// the customer's own details.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: i32,
    pub customer_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub cart_id: Option<i32>,
    pub address: Option<String>,
    pub status: String,
    pub buying_type: String,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
    pub order_date: NaiveDate,
}

impl Order {
    pub fn status(&self) -> Result<OrderStatus> {
        self.status.parse()
    }

    pub fn buying_type(&self) -> Result<BuyingType> {
        self.buying_type.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tags() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_buying_type_tags() {
        assert_eq!(BuyingType::default(), BuyingType::SelfPickup);
        assert_eq!(serde_json::to_string(&BuyingType::SelfPickup).unwrap(), "\"self\"");
        let parsed: BuyingType = serde_json::from_str("\"delivery\"").unwrap();
        assert_eq!(parsed, BuyingType::Delivery);
        assert!("courier".parse::<BuyingType>().is_err());
    }
}
