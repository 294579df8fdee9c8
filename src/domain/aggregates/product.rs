//! Product record as served by the catalog

use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use crate::domain::value_objects::{Price, ProductId};

/// Snapshot of a catalog product. Stock is authoritative only at the catalog;
/// once copied into a cart item it is advisory and may be stale.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub title: String,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize", deserialize_with = "non_negative_price")]
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    pub stock: u32,
}

impl Product {
    pub fn id(&self) -> &ProductId { &self.id }
    pub fn price(&self) -> Price { Price::new(self.price) }
    pub fn is_in_stock(&self) -> bool { self.stock > 0 }
}

fn non_negative_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    let price = rust_decimal::serde::float::deserialize(deserializer)?;
    if price.is_sign_negative() && !price.is_zero() {
        return Err(de::Error::custom(format!("price must not be negative, got {price}")));
    }
    Ok(price)
}

#[cfg(test)]
pub(crate) fn sample(id: &str, price: Decimal, stock: u32) -> Product {
    Product {
        id: ProductId::new(id),
        title: format!("Product {id}"),
        price,
        description: String::new(),
        image: format!("https://img.example.com/{id}.jpg"),
        stock,
    }
}
