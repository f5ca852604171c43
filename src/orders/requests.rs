//! Checkout form.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::Result;
use crate::models::BuyingType;
use crate::validation::{check_email, optional_text, require_text};

/// Contact and delivery details submitted at checkout.
///
/// These are copied onto the order as-is; they are not taken from the
/// customer record, so an order can ship to someone else.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub buying_type: BuyingType,
    #[serde(default)]
    pub comment: Option<String>,
    /// Requested date; the creation date when omitted
    #[serde(default)]
    pub order_date: Option<NaiveDate>,
}

/// Checkout form after validation and normalization
#[derive(Debug, Clone, PartialEq)]
pub struct ValidCheckout {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub buying_type: BuyingType,
    pub comment: Option<String>,
    pub order_date: Option<NaiveDate>,
}

impl CheckoutForm {
    pub fn validate(self) -> Result<ValidCheckout> {
        let first_name = self.first_name.trim().to_string();
        let last_name = self.last_name.trim().to_string();
        require_text("first_name", &first_name, 55)?;
        require_text("last_name", &last_name, 55)?;

        let email = optional_text("email", self.email, 100)?;
        if let Some(email) = &email {
            check_email(email)?;
        }

        Ok(ValidCheckout {
            first_name,
            last_name,
            phone: optional_text("phone", self.phone, 15)?,
            email,
            address: optional_text("address", self.address, 300)?,
            buying_type: self.buying_type,
            comment: self
                .comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
            order_date: self.order_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn form() -> CheckoutForm {
        serde_json::from_value(serde_json::json!({
            "first_name": " Пётр ",
            "last_name": "Смирнов",
            "phone": "+79001234567",
            "email": "petr@example.ru",
            "address": "",
            "buying_type": "delivery",
            "comment": "   "
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_form_is_normalized() {
        let valid = form().validate().unwrap();
        assert_eq!(valid.first_name, "Пётр");
        assert_eq!(valid.buying_type, BuyingType::Delivery);
        assert_eq!(valid.address, None);
        assert_eq!(valid.comment, None);
        assert_eq!(valid.order_date, None);
    }

    #[test]
    fn test_comment_is_trimmed_like_other_fields() {
        let mut f = form();
        f.comment = Some("  позвонить за час  \n".to_string());
        assert_eq!(f.validate().unwrap().comment.as_deref(), Some("позвонить за час"));
    }

    #[test]
    fn test_buying_type_defaults_to_self_pickup() {
        let form: CheckoutForm =
            serde_json::from_value(serde_json::json!({"first_name": "A", "last_name": "B"}))
                .unwrap();
        assert_eq!(form.validate().unwrap().buying_type, BuyingType::SelfPickup);
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let mut f = form();
        f.last_name = " ".to_string();
        assert!(matches!(f.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_long_phone_is_rejected() {
        let mut f = form();
        f.phone = Some("+7 900 123 45 67 89".to_string());
        assert!(matches!(f.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_bad_email_is_rejected() {
        let mut f = form();
        f.email = Some("petr.example.ru".to_string());
        assert!(matches!(f.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_order_date_is_parsed() {
        let form: CheckoutForm = serde_json::from_value(serde_json::json!({
            "first_name": "A",
            "last_name": "B",
            "order_date": "2026-11-02"
        }))
        .unwrap();
        assert_eq!(
            form.validate().unwrap().order_date,
            NaiveDate::from_ymd_opt(2026, 11, 2)
        );
    }
}
