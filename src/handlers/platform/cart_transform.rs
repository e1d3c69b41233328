//! Pricing callback for merchants without a bound sandbox function.
//!
//! Returns the same patch document as the sandbox, but identifies the
//! protection line by the merchant's configured product id instead of its
//! title, and always prices with the flat percentage.

use std::collections::HashMap;

use axum::{Extension, body::Bytes, extract::State, http::HeaderMap};
use premium::patch::CartPatch;
use premium::{Line, compute};
use serde::Serialize;

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::Json;
use crate::middleware::SignedRequest;
use crate::models::{CallbackLine, CartTransformRequest, StoreSettings};
use crate::util::{normalize_shop_domain, shop_from_headers};

#[derive(Debug, Serialize)]
pub struct ProbeResponse {
    pub ok: bool,
    pub message: &'static str,
}

pub async fn cart_transform_probe() -> Json<ProbeResponse> {
    Json(ProbeResponse {
        ok: true,
        message: "Cart Transform endpoint is reachable",
    })
}

/// The body is parsed by hand: the platform does not always send a JSON
/// content type.
pub async fn cart_transform(
    State(state): State<AppState>,
    signed: Option<Extension<SignedRequest>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CartPatch>> {
    let req: CartTransformRequest = serde_json::from_slice(&body)?;

    let shop = req
        .shop
        .as_deref()
        .map(normalize_shop_domain)
        .filter(|shop| !shop.is_empty())
        .or_else(|| shop_from_headers(&headers))
        .ok_or_else(|| AppError::BadRequest(msg::SHOP_REQUIRED.into()))?;

    let conn = state.db.get()?;
    let store = queries::get_store_by_shop(&conn, &shop)?.or_not_found(msg::STORE_NOT_FOUND)?;
    let settings = store.settings.or_not_found(msg::SETTINGS_NOT_FOUND)?;

    let patch = price_protection_line(&req.cart.line_items, &settings);
    if settings.protection_product_id().is_none() {
        tracing::debug!(shop = %shop, "No protection product configured");
    }
    tracing::debug!(
        shop = %shop,
        updates = patch.operations.update.len(),
        demo = signed.is_some_and(|Extension(s)| s.demo),
        "Cart transform priced"
    );

    Ok(Json(patch))
}

/// Price the line whose product is the configured protection product.
///
/// Every line carrying that product is left out of the subtotal; the first
/// one with an id receives the premium.
pub fn price_protection_line(lines: &[CallbackLine], settings: &StoreSettings) -> CartPatch {
    let Some(protection_product) = settings.protection_product_id() else {
        return CartPatch::empty();
    };

    let Some(line_id) = lines
        .iter()
        .filter(|line| line.product_id() == Some(protection_product))
        .find_map(CallbackLine::line_id)
    else {
        return CartPatch::empty();
    };

    let priced: Vec<Line<'_>> = lines
        .iter()
        .map(|line| {
            let product_id = line.product_id().unwrap_or_default();
            let priced = Line::new(product_id, line.unit_price(), line.quantity());
            if product_id == protection_product {
                priced.protection()
            } else {
                priced
            }
        })
        .collect();

    CartPatch::set_price(
        line_id,
        compute(&priced, &settings.flat_rates(), &HashMap::new()),
    )
}
