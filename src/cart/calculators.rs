//! Cart arithmetic and line-item bookkeeping.
//!
//! Pure functions and in-memory cart state - no database access. The
//! services module loads a cart into [`CartContents`], applies a
//! [`CartMutation`], reprices every line and persists the result in one
//! transaction, so stored totals always agree with the line items.

use std::collections::HashMap;

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::{AppError, Result};
use crate::models::ProductRef;

/// Largest value a NUMERIC(9, 2) column holds
pub const MAX_MONEY: Decimal = dec!(9999999.99);

/// Round to specified decimal places using banker's rounding (ROUND_HALF_EVEN).
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Reject amounts that would not fit a NUMERIC(9, 2) column.
pub fn ensure_money_fits(amount: Decimal) -> Result<Decimal> {
    if amount.abs() > MAX_MONEY {
        return Err(AppError::Validation(format!(
            "amount {} exceeds the maximum of {}",
            amount, MAX_MONEY
        )));
    }
    Ok(amount)
}

pub fn ensure_positive_quantity(quantity: i32) -> Result<i32> {
    if quantity <= 0 {
        return Err(AppError::Validation(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }
    Ok(quantity)
}

/// Line total: quantity × unit price, rounded to cents.
///
/// # Examples
/// ```
/// use rust_decimal_macros::dec;
/// use timber_store::cart::calculators::line_total;
///
/// assert_eq!(line_total(3, dec!(100.00)).unwrap(), dec!(300.00));
/// assert!(line_total(0, dec!(100.00)).is_err());
/// ```
pub fn line_total(quantity: i32, unit_price: Decimal) -> Result<Decimal> {
    ensure_positive_quantity(quantity)?;
    let total = unit_price
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(|| AppError::Validation("line total overflow".to_string()))?;
    ensure_money_fits(round_money(total, 2))
}

/// What to do with one product in the cart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    /// Add the given quantity, creating the line if the product is new
    Add(i32),
    /// Drop the line entirely
    Remove,
    /// Replace the line's quantity
    SetQuantity(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartMutation {
    pub product: ProductRef,
    pub action: CartAction,
}

impl CartMutation {
    pub fn new(product: ProductRef, action: CartAction) -> Self {
        Self { product, action }
    }
}

/// One line item. `id` is `None` until the line has been inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub id: Option<i32>,
    pub product: ProductRef,
    pub quantity: i32,
    pub total_price: Decimal,
}

impl CartLine {
    /// Recompute the total from the product's current price.
    pub fn resave(&mut self, unit_price: Decimal) -> Result<()> {
        self.total_price = line_total(self.quantity, unit_price)?;
        Ok(())
    }
}

/// Current unit price per referenced product
pub type PriceBook = HashMap<ProductRef, Decimal>;

/// Denormalized cart totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartTotals {
    /// Sum of quantities across all lines
    pub total_products: i32,
    /// Sum of line totals
    pub total_price: Decimal,
}

/// In-memory line items of a single cart, at most one line per product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartContents {
    lines: Vec<CartLine>,
}

impl CartContents {
    /// Build from stored lines. Duplicate references are rejected, since
    /// they would make the de-duplication rule ambiguous.
    pub fn new(lines: Vec<CartLine>) -> Result<Self> {
        let mut contents = CartContents::default();
        for line in lines {
            if contents.position(&line.product).is_some() {
                return Err(AppError::Internal(format!(
                    "cart holds {} #{} twice",
                    line.product.kind, line.product.id
                )));
            }
            contents.lines.push(line);
        }
        Ok(contents)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line(&self, product: &ProductRef) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product == product)
    }

    fn position(&self, product: &ProductRef) -> Option<usize> {
        self.lines.iter().position(|l| &l.product == product)
    }

    /// Apply a mutation. Returns the line that left the cart, if any.
    ///
    /// On error the contents are left untouched. Line totals are not
    /// updated here; call [`CartContents::reprice`] afterwards.
    pub fn apply(&mut self, mutation: &CartMutation) -> Result<Option<CartLine>> {
        let existing = self.position(&mutation.product);
        match (mutation.action, existing) {
            (CartAction::Add(quantity), Some(idx)) => {
                ensure_positive_quantity(quantity)?;
                let line = &mut self.lines[idx];
                line.quantity = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or_else(|| AppError::Validation("quantity overflow".to_string()))?;
                Ok(None)
            }
            (CartAction::Add(quantity), None) => {
                ensure_positive_quantity(quantity)?;
                self.lines.push(CartLine {
                    id: None,
                    product: mutation.product,
                    quantity,
                    total_price: Decimal::ZERO,
                });
                Ok(None)
            }
            (CartAction::SetQuantity(quantity), Some(idx)) => {
                ensure_positive_quantity(quantity)?;
                self.lines[idx].quantity = quantity;
                Ok(None)
            }
            (CartAction::Remove, Some(idx)) => Ok(Some(self.lines.remove(idx))),
            (CartAction::SetQuantity(_), None) | (CartAction::Remove, None) => {
                Err(AppError::NotFound)
            }
        }
    }

    /// Re-save every line at its product's current price.
    ///
    /// Fails with `NotFound` if a line references a product missing from
    /// `prices`; no line is modified in that case.
    pub fn reprice(&mut self, prices: &PriceBook) -> Result<()> {
        let totals = self
            .lines
            .iter()
            .map(|line| {
                let price = prices.get(&line.product).ok_or(AppError::NotFound)?;
                line_total(line.quantity, *price)
            })
            .collect::<Result<Vec<_>>>()?;

        for (line, total) in self.lines.iter_mut().zip(totals) {
            line.total_price = total;
        }
        Ok(())
    }

    /// Sum quantities and line totals.
    pub fn totals(&self) -> Result<CartTotals> {
        let mut totals = CartTotals::default();
        for line in &self.lines {
            totals.total_products = totals
                .total_products
                .checked_add(line.quantity)
                .ok_or_else(|| AppError::Validation("too many products in cart".to_string()))?;
            totals.total_price += line.total_price;
        }
        ensure_money_fits(totals.total_price)?;
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductKind;

    fn vagonka(id: i32) -> ProductRef {
        ProductRef::new(ProductKind::Vagonka, id)
    }

    fn brus(id: i32) -> ProductRef {
        ProductRef::new(ProductKind::Brus, id)
    }

    fn prices() -> PriceBook {
        PriceBook::from([
            (vagonka(1), dec!(100.00)),
            (brus(1), dec!(45.50)),
            (vagonka(2), dec!(12.25)),
        ])
    }

    // ==================== line_total tests ====================

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(1, dec!(45.50)).unwrap(), dec!(45.50));
        assert_eq!(line_total(4, dec!(12.25)).unwrap(), dec!(49.00));
    }

    #[test]
    fn test_line_total_rejects_non_positive_quantity() {
        assert!(matches!(line_total(0, dec!(1)), Err(AppError::Validation(_))));
        assert!(matches!(line_total(-2, dec!(1)), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_line_total_rejects_values_beyond_column_precision() {
        assert!(line_total(1000, dec!(9999.99)).is_ok());
        assert!(matches!(
            line_total(1001, dec!(9999.99)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_round_money_bankers_rounding() {
        assert_eq!(round_money(dec!(2.345), 2), dec!(2.34));
        assert_eq!(round_money(dec!(2.355), 2), dec!(2.36));
    }

    // ==================== CartContents tests ====================

    #[test]
    fn test_add_same_product_twice_merges_lines() {
        let mut cart = CartContents::default();
        cart.apply(&CartMutation::new(vagonka(1), CartAction::Add(1))).unwrap();
        cart.apply(&CartMutation::new(vagonka(1), CartAction::Add(2))).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.line(&vagonka(1)).unwrap().quantity, 3);
    }

    #[test]
    fn test_same_id_different_kind_is_a_different_product() {
        let mut cart = CartContents::default();
        cart.apply(&CartMutation::new(vagonka(1), CartAction::Add(1))).unwrap();
        cart.apply(&CartMutation::new(brus(1), CartAction::Add(1))).unwrap();
        assert_eq!(cart.lines().len(), 2);
    }

    #[test]
    fn test_totals_after_reprice() {
        let mut cart = CartContents::default();
        cart.apply(&CartMutation::new(vagonka(1), CartAction::Add(3))).unwrap();
        cart.apply(&CartMutation::new(brus(1), CartAction::Add(2))).unwrap();
        cart.reprice(&prices()).unwrap();

        let totals = cart.totals().unwrap();
        assert_eq!(totals.total_products, 5);
        assert_eq!(totals.total_price, dec!(391.00)); // 300 + 91
    }

    #[test]
    fn test_price_change_is_picked_up_on_resave() {
        let mut cart = CartContents::default();
        cart.apply(&CartMutation::new(vagonka(1), CartAction::Add(3))).unwrap();
        cart.reprice(&prices()).unwrap();
        assert_eq!(cart.line(&vagonka(1)).unwrap().total_price, dec!(300.00));

        let mut updated = prices();
        updated.insert(vagonka(1), dec!(150.00));
        cart.reprice(&updated).unwrap();
        assert_eq!(cart.line(&vagonka(1)).unwrap().total_price, dec!(450.00));
        assert_eq!(cart.totals().unwrap().total_price, dec!(450.00));
    }

    #[test]
    fn test_set_quantity() {
        let mut cart = CartContents::default();
        cart.apply(&CartMutation::new(vagonka(2), CartAction::Add(1))).unwrap();
        cart.apply(&CartMutation::new(vagonka(2), CartAction::SetQuantity(4))).unwrap();
        cart.reprice(&prices()).unwrap();
        assert_eq!(cart.totals().unwrap().total_price, dec!(49.00));
    }

    #[test]
    fn test_set_quantity_zero_is_rejected_and_leaves_cart_unchanged() {
        let mut cart = CartContents::default();
        cart.apply(&CartMutation::new(vagonka(2), CartAction::Add(2))).unwrap();
        let before = cart.clone();

        let err = cart
            .apply(&CartMutation::new(vagonka(2), CartAction::SetQuantity(0)))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_returns_the_removed_line() {
        let mut cart = CartContents::new(vec![CartLine {
            id: Some(10),
            product: brus(1),
            quantity: 2,
            total_price: dec!(91.00),
        }])
        .unwrap();

        let removed = cart
            .apply(&CartMutation::new(brus(1), CartAction::Remove))
            .unwrap()
            .unwrap();
        assert_eq!(removed.id, Some(10));
        assert!(cart.is_empty());
        assert_eq!(cart.totals().unwrap(), CartTotals::default());
    }

    #[test]
    fn test_remove_or_change_missing_product_is_not_found() {
        let mut cart = CartContents::default();
        assert!(matches!(
            cart.apply(&CartMutation::new(brus(9), CartAction::Remove)),
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            cart.apply(&CartMutation::new(brus(9), CartAction::SetQuantity(2))),
            Err(AppError::NotFound)
        ));
    }

    #[test]
    fn test_reprice_with_unknown_product_is_not_found_and_atomic() {
        let mut cart = CartContents::default();
        cart.apply(&CartMutation::new(vagonka(1), CartAction::Add(1))).unwrap();
        cart.apply(&CartMutation::new(brus(42), CartAction::Add(1))).unwrap();
        let before = cart.clone();

        assert!(matches!(cart.reprice(&prices()), Err(AppError::NotFound)));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_duplicate_stored_lines_are_rejected() {
        let line = CartLine {
            id: Some(1),
            product: vagonka(1),
            quantity: 1,
            total_price: dec!(100.00),
        };
        let result = CartContents::new(vec![line.clone(), CartLine { id: Some(2), ..line }]);
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
