//! Row mapping trait and helpers for reducing boilerplate in queries.

use std::collections::BTreeMap;

use rusqlite::{Connection, OptionalExtension, Row, ToSql};
use serde_json::Value;

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to rusqlite errors.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Read a JSON text column, logging and falling back to empty when malformed.
fn parse_json_column(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<Value> {
    let raw: String = row.get(col)?;
    Ok(serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(column = col_name, "Ignoring malformed JSON column: {}", e);
        Value::Null
    }))
}

fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|n: &f64| n.is_finite())
}

fn json_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn category_percents(value: Value) -> BTreeMap<String, f64> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(category, percent)| Some((category, json_number(&percent)?)))
            .collect(),
        _ => BTreeMap::new(),
    }
}

fn category_ids(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(json_id).collect(),
        _ => Vec::new(),
    }
}

/// Trait for constructing a type from a database row.
///
/// Implementing this trait allows using the `query_one` and `query_all`
/// helper functions, reducing repetitive row mapping closures.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

/// Store columns with its settings LEFT JOINed (settings columns NULL when unsaved).
/// Expects `stores s LEFT JOIN store_settings st ON st.store_id = s.id`.
pub const STORE_WITH_SETTINGS_COLS: &str = "s.id, s.shop_domain, s.installed_at, st.store_id, st.activated, st.pricing_mode, st.fixed_percent_all, st.category_percents, st.excluded_category_ids, st.widget_variant, st.enable_powered_by_chubb, st.offer_at_checkout, st.default_at_checkout, st.item_protection_product_id, st.item_protection_variant_id, st.updated_at";

pub const PRODUCT_CATEGORY_COLS: &str = "product_id, category_id";

// ============ FromRow Implementations ============

impl FromRow for Store {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let settings = match row.get::<_, Option<String>>(3)? {
            Some(_) => Some(
                StoreSettings {
                    activated: row.get::<_, i32>(4)? != 0,
                    pricing_mode: parse_enum(row, 5, "pricing_mode")?,
                    fixed_percent_all: row.get(6)?,
                    category_percents: category_percents(parse_json_column(
                        row,
                        7,
                        "category_percents",
                    )?),
                    excluded_category_ids: category_ids(parse_json_column(
                        row,
                        8,
                        "excluded_category_ids",
                    )?),
                    widget_variant: row.get(9)?,
                    show_brand_logo: row.get::<_, i32>(10)? != 0,
                    offer_at_checkout: row.get::<_, i32>(11)? != 0,
                    default_at_checkout: row.get::<_, i32>(12)? != 0,
                    item_protection_product_id: row.get(13)?,
                    item_protection_variant_id: row.get(14)?,
                    updated_at: row.get(15)?,
                }
                .clamped(),
            ),
            None => None,
        };

        Ok(Store {
            id: row.get(0)?,
            shop_domain: row.get(1)?,
            installed_at: row.get(2)?,
            settings,
        })
    }
}

impl FromRow for ProductCategory {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ProductCategory {
            product_id: row.get(0)?,
            category_id: row.get(1)?,
        })
    }
}
