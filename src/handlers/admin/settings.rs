use axum::extract::State;

use crate::db::{AppState, queries};
use crate::error::{OptionExt, Result, msg};
use crate::extractors::{Json, ShopParam};
use crate::models::StoreSettings;

/// Full pricing configuration for the admin surface.
pub async fn get_settings(
    State(state): State<AppState>,
    ShopParam(shop): ShopParam,
) -> Result<Json<StoreSettings>> {
    let conn = state.db.get()?;
    let store = queries::get_store_by_shop(&conn, &shop)?.or_not_found(msg::STORE_NOT_FOUND)?;
    let settings = store.settings.or_not_found(msg::SETTINGS_NOT_FOUND)?;
    Ok(Json(settings))
}
