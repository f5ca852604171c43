//! Cart and cart line item models

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::cart::calculators::CartLine;
use crate::error::{AppError, Result};

use super::catalog::{ProductKind, ProductRef};

/// Who a cart belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOwner {
    /// A registered customer (main_customer.id)
    Customer(i32),
    /// An anonymous shopper identified by a session key
    Anonymous(Uuid),
}

/// Cart from main_cart
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Cart {
    pub id: i32,
    pub owner_id: Option<i32>,
    #[serde(skip_serializing)]
    pub session_key: Option<Uuid>,
    pub total_products: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_price: Decimal,
    pub in_order: bool,
    pub for_anonymous_user: bool,
}

impl Cart {
    /// Carts that have become orders are frozen.
    pub fn ensure_open(&self) -> Result<()> {
        if self.in_order {
            return Err(AppError::Conflict(format!("cart {} is already in an order", self.id)));
        }
        Ok(())
    }
}

/// Line item from main_cartproduct
#[derive(Debug, Clone, FromRow)]
pub struct CartProduct {
    pub id: i32,
    /// Owning customer; absent on anonymous carts
    pub user_id: Option<i32>,
    pub cart_id: i32,
    pub product_kind: String,
    pub object_id: i32,
    pub quantity: i32,
    pub total_price: Decimal,
}

impl CartProduct {
    pub fn reference(&self) -> Result<ProductRef> {
        let kind = self.product_kind.parse::<ProductKind>().map_err(|_| {
            AppError::Internal(format!(
                "cart line {} has unknown product kind '{}'",
                self.id, self.product_kind
            ))
        })?;
        Ok(ProductRef::new(kind, self.object_id))
    }
}

impl TryFrom<&CartProduct> for CartLine {
    type Error = AppError;

    fn try_from(row: &CartProduct) -> Result<Self> {
        Ok(CartLine {
            id: Some(row.id),
            product: row.reference()?,
            quantity: row.quantity,
            total_price: row.total_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn cart(in_order: bool) -> Cart {
        Cart {
            id: 3,
            owner_id: Some(1),
            session_key: None,
            total_products: 0,
            total_price: dec!(0),
            in_order,
            for_anonymous_user: false,
        }
    }

    #[test]
    fn test_ensure_open() {
        assert!(cart(false).ensure_open().is_ok());
        assert!(matches!(cart(true).ensure_open(), Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_line_from_row() {
        let row = CartProduct {
            id: 5,
            user_id: None,
            cart_id: 3,
            product_kind: "terrace".to_string(),
            object_id: 12,
            quantity: 2,
            total_price: dec!(640.00),
        };
        let line = CartLine::try_from(&row).unwrap();
        assert_eq!(line.id, Some(5));
        assert_eq!(line.product, ProductRef::new(ProductKind::Terrace, 12));
    }

    #[test]
    fn test_corrupt_kind_is_internal_error() {
        let row = CartProduct {
            id: 5,
            user_id: None,
            cart_id: 3,
            product_kind: "plywood".to_string(),
            object_id: 12,
            quantity: 1,
            total_price: dec!(1.00),
        };
        assert!(matches!(row.reference(), Err(AppError::Internal(_))));
    }
}
