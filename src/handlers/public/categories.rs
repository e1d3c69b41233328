use std::collections::BTreeMap;

use axum::extract::State;
use serde::Deserialize;

use crate::db::{AppState, queries};
use crate::error::{OptionExt, Result, msg};
use crate::extractors::{Json, Query, ShopParam};

/// Upper bound on ids resolved per request.
pub const MAX_PRODUCT_IDS: usize = 250;

#[derive(Debug, Deserialize)]
pub struct CategoryQuery {
    #[serde(default, rename = "productIds")]
    pub product_ids: Option<String>,
}

/// Comma-separated ids, trimmed, blanks and duplicates dropped.
pub fn parse_product_ids(raw: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in raw.split(',').map(str::trim).filter(|id| !id.is_empty()) {
        if !ids.iter().any(|seen| seen == id) {
            ids.push(id.to_string());
        }
        if ids.len() == MAX_PRODUCT_IDS {
            break;
        }
    }
    ids
}

/// `{ productId: categoryId }` for the requested products that have a category.
pub async fn product_categories(
    State(state): State<AppState>,
    ShopParam(shop): ShopParam,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<BTreeMap<String, String>>> {
    let ids = parse_product_ids(query.product_ids.as_deref().unwrap_or_default());
    if ids.is_empty() {
        return Ok(Json(BTreeMap::new()));
    }

    let conn = state.db.get()?;
    let store = queries::get_store_by_shop(&conn, &shop)?.or_not_found(msg::STORE_NOT_FOUND)?;
    let map = queries::get_product_category_map(&conn, &store.id, &ids)?;

    Ok(Json(map))
}
