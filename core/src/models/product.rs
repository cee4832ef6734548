// calliope_ledger/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price_cents: i32,
    pub image_url: Option<String>,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    #[serde(alias = "price_cents")]
    pub price_cents: i32,
    #[serde(alias = "image_url")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock: i32,
}

impl NewProduct {
    pub fn validate(&self) -> LedgerResult<()> {
        validate_name(&self.name)?;
        validate_price(self.price_cents)?;
        validate_stock(self.stock)
    }

    pub fn into_product(self, id: Uuid, created_at: DateTime<Utc>) -> Product {
        Product {
            id,
            name: self.name,
            description: self.description,
            price_cents: self.price_cents,
            image_url: self.image_url,
            stock: self.stock,
            created_at,
        }
    }
}

/// Partial update; `None` leaves the field as it is.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "price_cents")]
    pub price_cents: Option<i32>,
    #[serde(alias = "image_url")]
    pub image_url: Option<String>,
    pub stock: Option<i32>,
}

impl ProductPatch {
    pub fn validate(&self) -> LedgerResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price_cents {
            validate_price(price)?;
        }
        if let Some(stock) = self.stock {
            validate_stock(stock)?;
        }
        Ok(())
    }

    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price_cents {
            product.price_cents = price;
        }
        if let Some(image_url) = self.image_url {
            product.image_url = Some(image_url);
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
    }
}

fn validate_name(name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation("Product name is required.".to_string()));
    }
    Ok(())
}

fn validate_price(price_cents: i32) -> LedgerResult<()> {
    if price_cents <= 0 {
        return Err(LedgerError::Validation(format!(
            "Price must be positive (got {} cents).",
            price_cents
        )));
    }
    Ok(())
}

fn validate_stock(stock: i32) -> LedgerResult<()> {
    if stock < 0 {
        return Err(LedgerError::Validation(format!("Stock cannot be negative (got {}).", stock)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> NewProduct {
        NewProduct {
            name: "Widget".to_string(),
            description: "A widget".to_string(),
            price_cents: 1299,
            image_url: None,
            stock: 4,
        }
    }

    #[test]
    fn new_product_rejects_non_positive_price() {
        let mut p = widget();
        p.price_cents = 0;
        assert!(matches!(p.validate(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn new_product_rejects_negative_stock_and_blank_name() {
        let mut p = widget();
        p.stock = -1;
        assert!(p.validate().is_err());

        let mut p = widget();
        p.name = "   ".to_string();
        assert!(p.validate().is_err());

        assert!(widget().validate().is_ok());
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut product = widget().into_product(Uuid::new_v4(), Utc::now());
        let patch = ProductPatch {
            price_cents: Some(999),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
        patch.apply(&mut product);
        assert_eq!(product.price_cents, 999);
        assert_eq!(product.name, "Widget");
        assert_eq!(product.stock, 4);
    }

    #[test]
    fn snake_case_request_fields_are_accepted() {
        let p: NewProduct = serde_json::from_str(
            r#"{"name": "Kettle", "description": "Boils", "price_cents": 3400, "image_url": "k.png", "stock": 2}"#,
        )
        .unwrap();
        assert_eq!(p.price_cents, 3400);
        assert_eq!(p.image_url.as_deref(), Some("k.png"));

        let camel: NewProduct =
            serde_json::from_str(r#"{"name": "Kettle", "description": "Boils", "priceCents": 3400}"#).unwrap();
        assert_eq!(camel.price_cents, 3400);
        assert_eq!(camel.stock, 0);

        let patch: ProductPatch = serde_json::from_str(r#"{"price_cents": 100}"#).unwrap();
        assert_eq!(patch.price_cents, Some(100));
    }
}
