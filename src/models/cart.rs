//! Cart document posted by the platform to the pricing callback.
//!
//! Storefront themes disagree on field names and on whether numbers are sent
//! as strings, so every field deserializes loosely. A cart or product of the
//! wrong shape reads as empty and a line that is not an object is skipped;
//! neither fails the whole request.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct CartTransformRequest {
    #[serde(default, deserialize_with = "loose_id")]
    pub shop: Option<String>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub cart: CallbackCart,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackCart {
    #[serde(default, deserialize_with = "lenient_lines")]
    pub line_items: Vec<CallbackLine>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackLine {
    #[serde(default, deserialize_with = "loose_id")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "loose_id")]
    pub item_id: Option<String>,
    #[serde(default, deserialize_with = "loose_id")]
    pub product_id: Option<String>,
    #[serde(default, deserialize_with = "loose_amount")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "loose_amount")]
    pub final_price: Option<f64>,
    #[serde(default, deserialize_with = "loose_quantity")]
    pub quantity: Option<i64>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub product: Option<CallbackProduct>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CallbackProduct {
    #[serde(default, deserialize_with = "loose_id")]
    pub product_id: Option<String>,
    #[serde(default, rename = "productId", deserialize_with = "loose_id")]
    pub product_id_camel: Option<String>,
    #[serde(default, deserialize_with = "loose_amount")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "loose_amount")]
    pub price_amount: Option<f64>,
}

impl CallbackLine {
    /// `product_id` on the line, then on the product in either casing.
    pub fn product_id(&self) -> Option<&str> {
        self.product_id
            .as_deref()
            .or_else(|| self.product.as_ref()?.product_id.as_deref())
            .or_else(|| self.product.as_ref()?.product_id_camel.as_deref())
    }

    /// First price present among product price, product price_amount, line
    /// price, line final_price.
    pub fn unit_price(&self) -> f64 {
        let product = self.product.as_ref();
        product
            .and_then(|p| p.price)
            .or_else(|| product.and_then(|p| p.price_amount))
            .or(self.price)
            .or(self.final_price)
            .unwrap_or(0.0)
    }

    pub fn quantity(&self) -> u32 {
        match self.quantity {
            Some(q) if q >= 1 => u32::try_from(q).unwrap_or(u32::MAX),
            _ => 1,
        }
    }

    pub fn line_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.item_id.as_deref())
    }
}

/// Non-empty string, or a non-zero number rendered as a string.
fn loose_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    })
}

/// An amount is absent when null, `false`, zero or an empty string. Any other
/// value is present, and worth 0 unless it is a number or a numeric string.
fn loose_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::Number(n)) => n.as_f64().filter(|n| *n != 0.0 && n.is_finite()),
        Some(Value::String(s)) if s.is_empty() => None,
        Some(Value::String(s)) => Some(
            s.trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .unwrap_or(0.0),
        ),
        Some(_) => Some(0.0),
    })
}

fn loose_quantity<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Anything but an object reads as the default.
fn lenient_object<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => serde_json::from_value(value).unwrap_or_default(),
        _ => T::default(),
    })
}

/// Lines that fail to deserialize are dropped; a non-array is an empty cart.
fn lenient_lines<'de, D>(deserializer: D) -> Result<Vec<CallbackLine>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}
