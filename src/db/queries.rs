use std::collections::BTreeMap;

use chrono::Utc;
use rusqlite::{Connection, ToSql, params};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::*;
use crate::util::normalize_shop_domain;

use super::from_row::{PRODUCT_CATEGORY_COLS, STORE_WITH_SETTINGS_COLS, query_all, query_one};

fn now() -> i64 {
    Utc::now().timestamp()
}

fn gen_id() -> String {
    Uuid::new_v4().to_string()
}

// ============ Stores ============

/// Look up a store by shop domain. The domain is normalized first.
pub fn get_store_by_shop(conn: &Connection, shop: &str) -> Result<Option<Store>> {
    let shop = normalize_shop_domain(shop);
    query_one(
        conn,
        &format!(
            "SELECT {} FROM stores s
             LEFT JOIN store_settings st ON st.store_id = s.id
             WHERE s.shop_domain = ?1",
            STORE_WITH_SETTINGS_COLS
        ),
        &[&shop],
    )
}

/// Register a shop, or return the existing row for it.
pub fn upsert_store(conn: &Connection, shop: &str) -> Result<Store> {
    let shop = normalize_shop_domain(shop);
    if shop.is_empty() {
        return Err(AppError::BadRequest(crate::error::msg::SHOP_REQUIRED.into()));
    }

    conn.execute(
        "INSERT INTO stores (id, shop_domain, installed_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(shop_domain) DO NOTHING",
        params![gen_id(), &shop, now()],
    )?;

    get_store_by_shop(conn, &shop)?
        .ok_or_else(|| AppError::Internal(format!("store {} missing after insert", shop)))
}

/// Create or replace a store's pricing configuration.
pub fn save_store_settings(
    conn: &Connection,
    store_id: &str,
    settings: &StoreSettings,
) -> Result<StoreSettings> {
    let mut saved = settings.clone().clamped();
    saved.updated_at = now();

    conn.execute(
        "INSERT INTO store_settings (
            store_id, activated, pricing_mode, fixed_percent_all, category_percents,
            excluded_category_ids, widget_variant, enable_powered_by_chubb,
            offer_at_checkout, default_at_checkout, item_protection_product_id,
            item_protection_variant_id, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
         ON CONFLICT(store_id) DO UPDATE SET
            activated = excluded.activated,
            pricing_mode = excluded.pricing_mode,
            fixed_percent_all = excluded.fixed_percent_all,
            category_percents = excluded.category_percents,
            excluded_category_ids = excluded.excluded_category_ids,
            widget_variant = excluded.widget_variant,
            enable_powered_by_chubb = excluded.enable_powered_by_chubb,
            offer_at_checkout = excluded.offer_at_checkout,
            default_at_checkout = excluded.default_at_checkout,
            item_protection_product_id = excluded.item_protection_product_id,
            item_protection_variant_id = excluded.item_protection_variant_id,
            updated_at = excluded.updated_at",
        params![
            store_id,
            saved.activated,
            saved.pricing_mode.as_ref(),
            saved.fixed_percent_all,
            serde_json::to_string(&saved.category_percents)?,
            serde_json::to_string(&saved.excluded_category_ids)?,
            &saved.widget_variant,
            saved.show_brand_logo,
            saved.offer_at_checkout,
            saved.default_at_checkout,
            &saved.item_protection_product_id,
            &saved.item_protection_variant_id,
            saved.updated_at,
        ],
    )?;

    Ok(saved)
}

// ============ Product Categories ============

/// Category for each of `product_ids` that has one. Unknown products are absent.
pub fn get_product_category_map(
    conn: &Connection,
    store_id: &str,
    product_ids: &[String],
) -> Result<BTreeMap<String, String>> {
    if product_ids.is_empty() {
        return Ok(BTreeMap::new());
    }

    let placeholders = vec!["?"; product_ids.len()].join(", ");
    let sql = format!(
        "SELECT {} FROM product_categories WHERE store_id = ? AND product_id IN ({})",
        PRODUCT_CATEGORY_COLS, placeholders
    );
    let mut params: Vec<&dyn ToSql> = Vec::with_capacity(product_ids.len() + 1);
    params.push(&store_id);
    params.extend(product_ids.iter().map(|id| id as &dyn ToSql));

    let rows: Vec<ProductCategory> = query_all(conn, &sql, &params)?;
    Ok(rows
        .into_iter()
        .map(|row| (row.product_id, row.category_id))
        .collect())
}

pub fn set_product_category(
    conn: &Connection,
    store_id: &str,
    product_id: &str,
    category_id: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO product_categories (store_id, product_id, category_id) VALUES (?1, ?2, ?3)
         ON CONFLICT(store_id, product_id) DO UPDATE SET category_id = excluded.category_id",
        params![store_id, product_id, category_id],
    )?;
    Ok(())
}
