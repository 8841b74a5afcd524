use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

const MAX_NAME_CHARS: usize = 255;
const MAX_DESCRIPTION_CHARS: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a product.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub stock: i64,
}

impl NewProduct {
    pub fn validate(&self) -> CoreResult<()> {
        validate_name(&self.name)?;
        validate_description(&self.description)?;
        validate_price(self.price)?;
        validate_stock(self.stock)
    }
}

/// Sparse update: only the fields that are present change.
///
/// Unknown field names are rejected at deserialization, so a typo in a
/// request body is an error rather than a silent no-op.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock.is_none()
    }

    pub fn validate(&self) -> CoreResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(description) = &self.description {
            validate_description(description)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(stock) = self.stock {
            validate_stock(stock)?;
        }
        Ok(())
    }

    /// Writes the present fields onto `product`. Returns `true` if anything
    /// was applied.
    pub fn apply_to(&self, product: &mut Product) -> bool {
        if let Some(name) = &self.name {
            product.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            product.description.clone_from(description);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        !self.is_empty()
    }
}

fn validate_name(name: &str) -> CoreResult<()> {
    let len = name.chars().count();
    if len == 0 || len > MAX_NAME_CHARS {
        return Err(CoreError::Validation(format!(
            "name must be between 1 and {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: &str) -> CoreResult<()> {
    if description.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(CoreError::Validation(format!(
            "description must be at most {MAX_DESCRIPTION_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_price(price: f64) -> CoreResult<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(CoreError::Validation(
            "price must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_stock(stock: i64) -> CoreResult<()> {
    if stock < 0 {
        return Err(CoreError::Validation("stock must not be negative".to_string()));
    }
    Ok(())
}
