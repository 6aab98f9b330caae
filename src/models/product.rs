use std::fmt;

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::validation::{
    non_negative_integer, non_negative_number, optional_text, required_text, ValidationError,
};

/// Store-assigned product identifier, rendered as a 24-character hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductId(ObjectId);

impl ProductId {
    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    /// `None` when `raw` is not a well-formed ObjectId.
    pub fn parse(raw: &str) -> Option<Self> {
        ObjectId::parse_str(raw).ok().map(Self)
    }

    pub fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ObjectId> for ProductId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_hex())
    }
}

impl Serialize for ProductId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_hex())
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid product id: {}", raw)))
    }
}

/// Core product entity as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    pub price: f64,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Materialize a validated payload with its server-assigned fields.
    pub fn from_new(id: ProductId, new: NewProduct, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            sku: new.sku,
            price: new.price,
            quantity: new.quantity,
            category: new.category,
            created_at: now,
            updated_at: now,
        }
    }
}

// ── Request payloads ─────────────────────────────────────────────────────────

/// Body of `POST /products`. Every field is optional at the serde level so
/// that missing fields surface as validation messages instead of parse errors.
#[derive(Debug, Default, Deserialize)]
pub struct CreateProduct {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<f64>,
    pub category: Option<String>,
}

/// Body of `PUT`/`PATCH /products/:id`.
///
/// Outer `None` means the field was not submitted; `Some(None)` means it was
/// submitted as `null`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProduct {
    #[serde(default, deserialize_with = "nullable")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub sku: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub price: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub quantity: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub category: Option<Option<String>>,
}

fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ── Validated forms ──────────────────────────────────────────────────────────

/// A product that passed validation and is ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub sku: Option<String>,
    pub price: f64,
    pub quantity: i64,
    pub category: Option<String>,
}

/// Validated partial update. `None` leaves a field untouched; for the
/// optional text fields `Some(None)` clears the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub sku: Option<Option<String>>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub category: Option<Option<String>>,
}

impl CreateProduct {
    pub fn validate(self) -> Result<NewProduct, ValidationError> {
        let mut errors = ValidationError::default();

        let name = required_text(&mut errors, "name", self.name);
        let price = match self.price {
            Some(price) => non_negative_number(&mut errors, "price", price),
            None => {
                errors.push("price", "price is required");
                None
            }
        };
        let quantity = match self.quantity {
            Some(quantity) => non_negative_integer(&mut errors, "quantity", quantity),
            None => Some(0),
        };

        match (name, price, quantity) {
            (Some(name), Some(price), Some(quantity)) if errors.is_empty() => Ok(NewProduct {
                name,
                sku: optional_text(self.sku),
                price,
                quantity,
                category: optional_text(self.category),
            }),
            _ => Err(errors),
        }
    }
}

impl UpdateProduct {
    pub fn validate(self) -> Result<ProductChanges, ValidationError> {
        let mut errors = ValidationError::default();
        let mut changes = ProductChanges::default();

        if let Some(name) = self.name {
            changes.name = required_text(&mut errors, "name", name);
        }
        match self.price {
            Some(Some(price)) => changes.price = non_negative_number(&mut errors, "price", price),
            Some(None) => errors.push("price", "price is required"),
            None => {}
        }
        match self.quantity {
            Some(Some(quantity)) => {
                changes.quantity = non_negative_integer(&mut errors, "quantity", quantity)
            }
            Some(None) => errors.push("quantity", "quantity must be an integer"),
            None => {}
        }
        changes.sku = self.sku.map(optional_text);
        changes.category = self.category.map(optional_text);

        errors.finish(changes)
    }
}

impl ProductChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the submitted fields to `product` and stamp `updated_at`.
    pub fn apply_to(&self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            product.name = name.clone();
        }
        if let Some(sku) = &self.sku {
            product.sku = sku.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
        if let Some(category) = &self.category {
            product.category = category.clone();
        }
        product.updated_at = now;
    }
}
