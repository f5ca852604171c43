//! Catalog models: categories and the five product kinds

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::cart::calculators::ensure_money_fits;
use crate::error::{AppError, Result};
use crate::validation::{check_slug, optional_text, require_text};

/// Max length of every dimensional attribute
const DIMENSION_MAX_LEN: usize = 20;

/// Product kind. Each kind is stored in its own table; the lower-case tag
/// is what appears in product URLs and in cart line item references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Vagonka,
    Terrace,
    Stairs,
    DoskaPola,
    Brus,
}

impl ProductKind {
    pub const ALL: [ProductKind; 5] = [
        ProductKind::Vagonka,
        ProductKind::Terrace,
        ProductKind::Stairs,
        ProductKind::DoskaPola,
        ProductKind::Brus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProductKind::Vagonka => "vagonka",
            ProductKind::Terrace => "terrace",
            ProductKind::Stairs => "stairs",
            ProductKind::DoskaPola => "doskapola",
            ProductKind::Brus => "brus",
        }
    }

    /// Storage table holding rows of this kind
    pub fn table(self) -> &'static str {
        match self {
            ProductKind::Vagonka => "main_vagonka",
            ProductKind::Terrace => "main_terrace",
            ProductKind::Stairs => "main_stairs",
            ProductKind::DoskaPola => "main_doskapola",
            ProductKind::Brus => "main_brus",
        }
    }

    /// Stairs and Brus have no working width column.
    pub fn has_working_width(self) -> bool {
        !matches!(self, ProductKind::Stairs | ProductKind::Brus)
    }

    /// Storefront label
    pub fn display_name(self) -> &'static str {
        match self {
            ProductKind::Vagonka => "Вагонка",
            ProductKind::Terrace => "Террасная доска",
            ProductKind::Stairs => "Лестничные элементы",
            ProductKind::DoskaPola => "Доска пола",
            ProductKind::Brus => "Брус",
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductKind {
    type Err = AppError;

    /// Unknown tags resolve to nothing, so they are `NotFound`.
    fn from_str(s: &str) -> Result<Self> {
        ProductKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(AppError::NotFound)
    }
}

/// Typed reference to one row in one of the product tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductRef {
    pub kind: ProductKind,
    pub id: i32,
}

impl ProductRef {
    pub fn new(kind: ProductKind, id: i32) -> Self {
        Self { kind, id }
    }
}

/// Category from main_category
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl Category {
    pub fn absolute_url(&self) -> String {
        category_url(&self.slug)
    }

    /// Public URL of the uploaded image, served from the media directory
    pub fn image_url(&self) -> Option<String> {
        self.image.as_ref().map(|path| format!("/media/{}", path.trim_start_matches('/')))
    }
}

pub fn category_url(slug: &str) -> String {
    format!("/category/{}/", slug)
}

pub fn product_url(kind: ProductKind, slug: &str) -> String {
    format!("/products/{}/{}/", kind, slug)
}

/// Sidebar entry: category name, link and number of products of every kind
#[derive(Debug, Clone, FromRow)]
pub struct SidebarCategory {
    pub name: String,
    pub slug: String,
    pub product_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SidebarEntry {
    pub name: String,
    pub url: String,
    pub product_count: i64,
}

impl From<&SidebarCategory> for SidebarEntry {
    fn from(c: &SidebarCategory) -> Self {
        Self {
            name: c.name.clone(),
            url: category_url(&c.slug),
            product_count: c.product_count,
        }
    }
}

/// Product row as selected from any of the five kind tables.
///
/// Every query selects the kind tag as a literal column and substitutes
/// `NULL` for `working_width` on kinds without that column.
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    pub kind: String,
    pub id: i32,
    pub category_id: i32,
    pub title: String,
    pub slug: String,
    pub price: Decimal,
    pub depth: String,
    pub width: String,
    pub working_width: Option<String>,
    pub length: String,
    pub country: String,
}

/// Dimensional attributes shared by all kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Thickness
    pub depth: String,
    pub width: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_width: Option<String>,
    pub length: String,
    pub country: String,
}

#[derive(Debug, Clone)]
pub struct Product {
    pub kind: ProductKind,
    pub id: i32,
    pub category_id: i32,
    pub title: String,
    pub slug: String,
    pub price: Decimal,
    pub dimensions: Dimensions,
}

impl Product {
    pub fn reference(&self) -> ProductRef {
        ProductRef::new(self.kind, self.id)
    }

    pub fn absolute_url(&self) -> String {
        product_url(self.kind, &self.slug)
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = AppError;

    fn try_from(row: ProductRow) -> Result<Self> {
        let kind = row
            .kind
            .parse::<ProductKind>()
            .map_err(|_| AppError::Internal(format!("unknown product kind '{}'", row.kind)))?;
        Ok(Product {
            kind,
            id: row.id,
            category_id: row.category_id,
            title: row.title,
            slug: row.slug,
            price: row.price,
            dimensions: Dimensions {
                depth: row.depth,
                width: row.width,
                working_width: row.working_width,
                length: row.length,
                country: row.country,
            },
        })
    }
}

/// Product as exposed to the storefront
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub kind: ProductKind,
    pub kind_name: &'static str,
    pub title: String,
    pub slug: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub url: String,
    #[serde(flatten)]
    pub dimensions: Dimensions,
}

impl From<&Product> for ProductSummary {
    fn from(p: &Product) -> Self {
        Self {
            kind: p.kind,
            kind_name: p.kind.display_name(),
            title: p.title.clone(),
            slug: p.slug.clone(),
            price: p.price,
            url: p.absolute_url(),
            dimensions: p.dimensions.clone(),
        }
    }
}

/// Category page payload (cached)
#[derive(Debug, Clone, Serialize)]
pub struct CategoryDetail {
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub products: Vec<ProductSummary>,
}

impl CategoryDetail {
    pub fn new(category: &Category, products: &[Product]) -> Self {
        Self {
            name: category.name.clone(),
            slug: category.slug.clone(),
            image_url: category.image_url(),
            description: category.description.clone(),
            products: products.iter().map(ProductSummary::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewCategory {
    pub fn validate(self) -> Result<Self> {
        require_text("name", &self.name, 255)?;
        check_slug(&self.slug)?;
        Ok(Self {
            image: optional_text("image", self.image, 100)?,
            description: optional_text("description", self.description, 1000)?,
            ..self
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub category_id: i32,
    pub title: String,
    pub slug: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub dimensions: Dimensions,
}

impl NewProduct {
    pub fn validate(&self, kind: ProductKind) -> Result<()> {
        require_text("title", &self.title, 255)?;
        check_slug(&self.slug)?;
        validate_price(self.price)?;

        let d = &self.dimensions;
        for (field, value) in [
            ("depth", &d.depth),
            ("width", &d.width),
            ("length", &d.length),
            ("country", &d.country),
        ] {
            require_text(field, value, DIMENSION_MAX_LEN)?;
        }
        match (&d.working_width, kind.has_working_width()) {
            (Some(w), true) => require_text("working_width", w, DIMENSION_MAX_LEN),
            (None, true) => Err(AppError::Validation(format!(
                "working_width is required for {}",
                kind
            ))),
            (Some(_), false) => Err(AppError::Validation(format!(
                "{} has no working_width",
                kind
            ))),
            (None, false) => Ok(()),
        }
    }
}

/// Prices are non-negative and fit NUMERIC(9, 2).
pub fn validate_price(price: Decimal) -> Result<()> {
    if price.is_sign_negative() {
        return Err(AppError::Validation("price must not be negative".to_string()));
    }
    if price.normalize().scale() > 2 {
        return Err(AppError::Validation(
            "price must have at most 2 decimal places".to_string(),
        ));
    }
    ensure_money_fits(price)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn dims(working_width: Option<&str>) -> Dimensions {
        Dimensions {
            depth: "20".to_string(),
            width: "96".to_string(),
            working_width: working_width.map(str::to_string),
            length: "3000".to_string(),
            country: "Россия".to_string(),
        }
    }

    #[test]
    fn test_kind_tags_round_trip_through_from_str() {
        for kind in ProductKind::ALL {
            assert_eq!(kind.as_str().parse::<ProductKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_is_not_found() {
        assert!(matches!("plywood".parse::<ProductKind>(), Err(AppError::NotFound)));
        // tags are case-sensitive, as in URLs
        assert!(matches!("Vagonka".parse::<ProductKind>(), Err(AppError::NotFound)));
    }

    #[test]
    fn test_kind_serde_uses_url_tag() {
        let json = serde_json::to_string(&ProductKind::DoskaPola).unwrap();
        assert_eq!(json, "\"doskapola\"");
    }

    #[test]
    fn test_each_kind_has_its_own_table() {
        let tables: std::collections::HashSet<_> =
            ProductKind::ALL.iter().map(|k| k.table()).collect();
        assert_eq!(tables.len(), ProductKind::ALL.len());
    }

    #[test]
    fn test_working_width_kinds() {
        assert!(ProductKind::Vagonka.has_working_width());
        assert!(ProductKind::Terrace.has_working_width());
        assert!(ProductKind::DoskaPola.has_working_width());
        assert!(!ProductKind::Stairs.has_working_width());
        assert!(!ProductKind::Brus.has_working_width());
    }

    #[test]
    fn test_product_url() {
        assert_eq!(
            product_url(ProductKind::Terrace, "larch-28"),
            "/products/terrace/larch-28/"
        );
        assert_eq!(category_url("pine"), "/category/pine/");
    }

    #[test]
    fn test_product_from_row() {
        let row = ProductRow {
            kind: "brus".to_string(),
            id: 7,
            category_id: 1,
            title: "Брус 100x100".to_string(),
            slug: "brus-100".to_string(),
            price: dec!(450.00),
            depth: "100".to_string(),
            width: "100".to_string(),
            working_width: None,
            length: "6000".to_string(),
            country: "Россия".to_string(),
        };
        let product = Product::try_from(row).unwrap();
        assert_eq!(product.reference(), ProductRef::new(ProductKind::Brus, 7));
        assert_eq!(product.absolute_url(), "/products/brus/brus-100/");
    }

    #[test]
    fn test_category_image_url() {
        let category = Category {
            id: 1,
            name: "Сосна".to_string(),
            slug: "pine".to_string(),
            image: Some("categories/pine.jpg".to_string()),
            description: None,
        };
        assert_eq!(category.image_url().as_deref(), Some("/media/categories/pine.jpg"));
    }

    #[test]
    fn test_new_product_working_width_rules() {
        let mut product = NewProduct {
            category_id: 1,
            title: "Вагонка штиль".to_string(),
            slug: "vagonka-shtil".to_string(),
            price: dec!(320.50),
            dimensions: dims(Some("88")),
        };
        assert!(product.validate(ProductKind::Vagonka).is_ok());
        assert!(product.validate(ProductKind::Brus).is_err());

        product.dimensions = dims(None);
        assert!(product.validate(ProductKind::Stairs).is_ok());
        assert!(product.validate(ProductKind::Terrace).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(dec!(0)).is_ok());
        assert!(validate_price(dec!(9999999.99)).is_ok());
        assert!(validate_price(dec!(10000000.00)).is_err());
        assert!(validate_price(dec!(-1)).is_err());
        assert!(validate_price(dec!(1.005)).is_err());
        assert!(validate_price(dec!(1.500)).is_ok());
    }

    #[test]
    fn test_new_category_blank_description_is_none() {
        let category = NewCategory {
            name: "Лиственница".to_string(),
            slug: "larch".to_string(),
            image: None,
            description: Some("   ".to_string()),
        }
        .validate()
        .unwrap();
        assert_eq!(category.description, None);
    }
}
