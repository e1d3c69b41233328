use axum::extract::State;

use crate::db::{AppState, queries};
use crate::error::{OptionExt, Result, msg};
use crate::extractors::{Json, ShopParam};
use crate::models::PublicSettings;

/// Settings the checkout widget needs. Never includes secrets or tokens.
pub async fn public_settings(
    State(state): State<AppState>,
    ShopParam(shop): ShopParam,
) -> Result<Json<PublicSettings>> {
    let conn = state.db.get()?;
    let store = queries::get_store_by_shop(&conn, &shop)?.or_not_found(msg::STORE_NOT_FOUND)?;
    let settings = store
        .settings
        .as_ref()
        .or_not_found(msg::SETTINGS_NOT_FOUND)?;

    Ok(Json(PublicSettings::from(settings)))
}
