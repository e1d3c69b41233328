use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::{AppState, queries};
use crate::error::{AppError, OptionExt, Result, msg};
use crate::extractors::Json;
use crate::util::normalize_shop_domain;

/// Best-effort notice from the checkout widget that it applied or removed the fee.
#[derive(Debug, Deserialize)]
pub struct ApplyFeeRequest {
    #[serde(default)]
    pub shop: String,
    #[serde(default)]
    pub order_token: String,
    /// Number or decimal string, whichever the widget had at hand.
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl ApplyFeeRequest {
    pub fn validate(&self) -> Result<()> {
        if self.shop.trim().is_empty() {
            return Err(AppError::BadRequest(msg::SHOP_REQUIRED.into()));
        }
        if self.order_token.trim().is_empty() {
            return Err(AppError::BadRequest(msg::ORDER_TOKEN_REQUIRED.into()));
        }
        Ok(())
    }

    fn amount_display(&self) -> String {
        match &self.amount {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "-".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub ok: bool,
}

/// Records the notification. Pricing itself happens in the cart transform.
pub async fn apply_fee(
    State(state): State<AppState>,
    Json(req): Json<ApplyFeeRequest>,
) -> Result<Json<AckResponse>> {
    req.validate()?;

    let shop = normalize_shop_domain(&req.shop);
    let conn = state.db.get()?;
    queries::get_store_by_shop(&conn, &shop)?.or_not_found(msg::STORE_NOT_FOUND)?;

    tracing::info!(
        shop = %shop,
        order_token = %req.order_token.trim(),
        amount = %req.amount_display(),
        label = req.label.as_deref().unwrap_or("Item protection"),
        enabled = req.enabled.unwrap_or(true),
        "Item protection fee notification"
    );

    Ok(Json(AckResponse { ok: true }))
}
