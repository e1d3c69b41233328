//! Tolerant readers for the loosely typed cart document the sandbox receives.
//!
//! Fields arrive as numbers or strings depending on the storefront theme, and
//! any of them may be missing. Every reader here falls back instead of failing.

use serde_json::Value;

use crate::{METAFIELD_KEY, METAFIELD_NAMESPACE, PROTECTION_TITLE};

/// A value counts as present if it is not null, not `false`, not zero and not
/// an empty string.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null | Value::Bool(false) => false,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    })
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Unit price from the first present of `product.price`,
/// `product.price_amount`, `price`, `final_price`. Unparsable is 0.
pub fn unit_price(item: &Value) -> f64 {
    let product = item.get("product");
    let candidates = [
        product.and_then(|p| p.get("price")),
        product.and_then(|p| p.get("price_amount")),
        item.get("price"),
        item.get("final_price"),
    ];
    candidates
        .into_iter()
        .find_map(present)
        .and_then(as_number)
        .unwrap_or(0.0)
}

/// Integer quantity; missing, non-positive or unparsable means 1.
pub fn quantity(item: &Value) -> u32 {
    let parsed = match item.get("quantity") {
        Some(Value::Number(n)) => n.as_f64().map(f64::trunc),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok().map(|q| q as f64),
        _ => None,
    };
    match parsed {
        Some(q) if q >= 1.0 => q.min(f64::from(u32::MAX)) as u32,
        _ => 1,
    }
}

/// Line id from `id`, falling back to `item_id`. Empty ids are absent.
pub fn line_id(item: &Value) -> Option<String> {
    let raw = present(item.get("id")).or_else(|| present(item.get("item_id")))?;
    match raw {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn is_protection(product: Option<&Value>) -> bool {
    let Some(product) = product else {
        return false;
    };
    let title = present(product.get("title"))
        .or_else(|| present(product.get("product_title")))
        .and_then(Value::as_str)
        .unwrap_or_default();
    title.trim() == PROTECTION_TITLE
}

/// Percent carried in the protection product's own metafields, if valid.
pub fn metafield_percent(product: Option<&Value>) -> Option<f64> {
    product?
        .get("metafields")?
        .as_array()?
        .iter()
        .filter(|mf| {
            mf.get("namespace").and_then(Value::as_str) == Some(METAFIELD_NAMESPACE)
                && mf.get("key").and_then(Value::as_str) == Some(METAFIELD_KEY)
        })
        .filter_map(|mf| mf.get("value").and_then(as_number))
        .filter(|p| (0.0..=100.0).contains(p))
        .last()
}
