//! Type definitions for the checkout engine
//!
//! Host pages are loose about number encodings (prices arrive as `"12.00"` or
//! `12`, ids as strings or integers), so everything read from them goes
//! through the lenient helpers in [`loose`].

use std::collections::{HashMap, HashSet};

use premium::{Line, Premium, PricingMode, Rates, clamp_percent};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fee line name the platform's price endpoint keys additional prices by
pub const PROTECTION_FEE_NAME: &str = "cd_insure_item_protection";

/// Label shown for the protection fee
pub const FEE_LABEL: &str = "Item protection";

pub(crate) mod loose {
    use premium::PricingMode;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn amount<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .filter(|v: &f64| v.is_finite()))
    }

    pub fn quantity<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::Number(n)) => n.as_u64().and_then(|q| u32::try_from(q).ok()),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// `per_category` or flat; anything else, including the legacy
    /// `fixed_percent_all`, prices flat.
    pub fn pricing_mode<'de, D: Deserializer<'de>>(d: D) -> Result<PricingMode, D::Error> {
        Ok(match Option::<String>::deserialize(d)?.as_deref() {
            Some("per_category") => PricingMode::PerCategory,
            _ => PricingMode::Flat,
        })
    }
}

// ==================== App settings ====================

/// Store settings as served by the app's public settings endpoint
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PublicSettings {
    pub activated: bool,
    #[serde(deserialize_with = "loose::pricing_mode")]
    pub pricing_mode: PricingMode,
    pub fixed_percent_all: f64,
    pub category_percents: HashMap<String, f64>,
    pub excluded_category_ids: Vec<String>,
    pub widget_variant: Option<String>,
    pub enable_powered_by_chubb: bool,
    /// False hides the widget entirely
    pub offer_at_checkout: bool,
    /// True turns protection on right after the first render
    pub default_at_checkout: bool,
    #[serde(deserialize_with = "loose::id")]
    pub item_protection_product_id: Option<String>,
    #[serde(deserialize_with = "loose::id")]
    pub item_protection_variant_id: Option<String>,
}

impl Default for PublicSettings {
    fn default() -> Self {
        Self {
            activated: false,
            pricing_mode: PricingMode::Flat,
            fixed_percent_all: 0.0,
            category_percents: HashMap::new(),
            excluded_category_ids: Vec::new(),
            widget_variant: None,
            enable_powered_by_chubb: true,
            offer_at_checkout: true,
            default_at_checkout: false,
            item_protection_product_id: None,
            item_protection_variant_id: None,
        }
    }
}

impl PublicSettings {
    pub fn rates(&self) -> Rates {
        match self.pricing_mode {
            PricingMode::Flat => Rates::flat(self.fixed_percent_all),
            PricingMode::PerCategory => Rates::per_category(
                self.fixed_percent_all,
                self.category_percents.clone(),
                self.excluded_category_ids.iter().cloned().collect::<HashSet<_>>(),
            ),
        }
    }

    pub fn has_percent(&self) -> bool {
        clamp_percent(self.fixed_percent_all) > 0.0
    }

    pub fn protection_product_id(&self) -> Option<&str> {
        self.item_protection_product_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }

    /// Product and variant of the protection item, when both are configured.
    pub fn protection_ids(&self) -> Option<(&str, &str)> {
        let variant = self
            .item_protection_variant_id
            .as_deref()
            .filter(|id| !id.is_empty())?;
        Some((self.protection_product_id()?, variant))
    }
}

// ==================== Host checkout state ====================

/// A product from the host page's order summary.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutProduct {
    #[serde(deserialize_with = "loose::id")]
    pub id: Option<String>,
    #[serde(deserialize_with = "loose::id")]
    pub product_id: Option<String>,
    #[serde(deserialize_with = "loose::id", alias = "category_id")]
    pub category_id: Option<String>,
    #[serde(deserialize_with = "loose::id", alias = "collection_id")]
    pub collection_id: Option<String>,
    #[serde(deserialize_with = "loose::amount")]
    pub final_line_price: Option<f64>,
    #[serde(deserialize_with = "loose::amount")]
    pub line_price: Option<f64>,
    #[serde(deserialize_with = "loose::amount")]
    pub price: Option<f64>,
    #[serde(deserialize_with = "loose::quantity")]
    pub quantity: Option<u32>,
    pub title: Option<String>,
}

impl CheckoutProduct {
    pub fn product_key(&self) -> Option<&str> {
        self.id.as_deref().or(self.product_id.as_deref())
    }

    pub fn category(&self) -> Option<&str> {
        self.category_id
            .as_deref()
            .or(self.collection_id.as_deref())
    }

    /// Line prices are already totals; a bare unit price is multiplied out.
    pub fn to_line(&self) -> Line<'_> {
        let key = self.product_key().unwrap_or_default();
        let line = match self.final_line_price.or(self.line_price) {
            Some(total) => Line::new(key, total, 1),
            None => Line::new(
                key,
                self.price.unwrap_or_default(),
                self.quantity.filter(|q| *q > 0).unwrap_or(1),
            ),
        };
        match self.category() {
            Some(category) => line.with_category(category),
            None => line,
        }
    }
}

/// Order totals in the shape the host's price hooks accept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckoutPrices {
    pub subtotal_price: String,
    pub total_price: String,
    pub shipping_price: String,
    pub tax_price: String,
    pub discount_code_price: String,
    pub discount_price: String,
    pub discount_line_item_price: String,
    pub payment_due: String,
    pub paid_total: String,
    pub gift_card_price: String,
    pub total_tip_received: String,
    pub discount_shipping_price: String,
    pub additional_prices: Vec<Value>,
    #[serde(rename = "line_items")]
    pub line_items: Vec<Value>,
}

fn pick<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| !v.is_null())
}

fn price_string(obj: &Value, keys: &[&str]) -> String {
    match pick(obj, keys) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "0".to_string(),
    }
}

fn array(obj: &Value, keys: &[&str]) -> Vec<Value> {
    pick(obj, keys)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

impl CheckoutPrices {
    /// Normalize a price endpoint response. Prices may sit under
    /// `data.prices`, `data` or the root, in snake_case or camelCase.
    pub fn from_price_response(response: &Value) -> Self {
        let data = response.get("data").filter(|d| d.is_object()).unwrap_or(response);
        let prices = data.get("prices").filter(|p| p.is_object()).unwrap_or(data);

        Self {
            subtotal_price: price_string(prices, &["subtotal_price", "subtotalPrice"]),
            total_price: price_string(prices, &["total_price", "total", "totalPrice"]),
            shipping_price: price_string(prices, &["shipping_price", "shippingPrice"]),
            tax_price: price_string(prices, &["tax_price", "taxPrice"]),
            discount_code_price: price_string(prices, &["discount_code_price", "discountCodePrice"]),
            discount_price: price_string(prices, &["discount_price", "discountPrice"]),
            discount_line_item_price: price_string(
                prices,
                &["discount_line_item_price", "discountLineItemPrice"],
            ),
            payment_due: price_string(
                prices,
                &["payment_due", "total_price", "total", "totalPrice"],
            ),
            paid_total: price_string(prices, &["paid_total", "paidTotal"]),
            gift_card_price: price_string(prices, &["gift_card_price", "giftCardPrice"]),
            total_tip_received: price_string(prices, &["total_tip_received", "totalTipReceived"]),
            discount_shipping_price: price_string(
                prices,
                &["discount_shipping_price", "discountShippingPrice"],
            ),
            additional_prices: array(prices, &["additionalPrices", "additional_prices"]),
            line_items: array(data, &["line_items", "lineItems"]),
        }
    }

    /// Order total, else subtotal, else 0.
    pub fn total(&self) -> f64 {
        [&self.total_price, &self.subtotal_price]
            .into_iter()
            .filter_map(|s| s.trim().parse::<f64>().ok())
            .find(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(0.0)
    }
}

/// Shipping address as the price endpoint expects it. Unknown fields are sent
/// empty; province defaults to `ALL`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShippingAddress {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country_code: String,
    pub country: String,
    pub area: String,
    pub address: String,
    pub address1: String,
    pub company: String,
    pub phone_area_code: String,
    pub latitude: String,
    pub longitude: String,
    pub source: String,
    pub tags: String,
    pub email_or_phone: String,
    pub cpf: String,
    pub id_number: String,
    pub gender: String,
    pub province: String,
    pub province_code: String,
    pub city: String,
    pub zip: String,
}

impl Default for ShippingAddress {
    fn default() -> Self {
        Self {
            id: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            country_code: String::new(),
            country: String::new(),
            area: String::new(),
            address: String::new(),
            address1: String::new(),
            company: String::new(),
            phone_area_code: "00".to_string(),
            latitude: String::new(),
            longitude: String::new(),
            source: String::new(),
            tags: String::new(),
            email_or_phone: String::new(),
            cpf: String::new(),
            id_number: String::new(),
            gender: String::new(),
            province: "ALL".to_string(),
            province_code: "ALL".to_string(),
            city: String::new(),
            zip: String::new(),
        }
    }
}

// ==================== Outbound payloads ====================

/// Fee handed to the host's in-page additional price hook
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeLine {
    pub label: String,
    pub amount: String,
}

impl FeeLine {
    pub fn protection(premium: Premium) -> Self {
        Self {
            label: FEE_LABEL.to_string(),
            amount: premium.to_string(),
        }
    }
}

/// Extra price carried by the price recalculation request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdditionalPrice {
    pub name: String,
    pub price: String,
    pub fee_title: String,
}

impl AdditionalPrice {
    pub fn protection(premium: Premium) -> Self {
        Self {
            name: PROTECTION_FEE_NAME.to_string(),
            price: premium.to_string(),
            fee_title: FEE_LABEL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceConfig {
    pub checkout_business_type: u8,
}

/// Body of the host's price recalculation endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePayload {
    pub order_token: String,
    pub calculate_shipping_line: bool,
    pub total_tip_received: String,
    pub step: String,
    pub config: PriceConfig,
    pub shipping_address: ShippingAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_line: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_prices: Option<Vec<AdditionalPrice>>,
    /// Same list under the key spelling some host versions read.
    #[serde(rename = "addtional_prices", skip_serializing_if = "Option::is_none")]
    pub legacy_additional_prices: Option<Vec<AdditionalPrice>>,
}

impl PricePayload {
    pub fn new(order_token: impl Into<String>, step: impl Into<String>) -> Self {
        Self {
            order_token: order_token.into(),
            calculate_shipping_line: true,
            total_tip_received: "0.00".to_string(),
            step: step.into(),
            config: PriceConfig {
                checkout_business_type: 0,
            },
            shipping_address: ShippingAddress::default(),
            shipping_line: None,
            additional_prices: None,
            legacy_additional_prices: None,
        }
    }

    pub fn with_additional_prices(mut self, prices: Vec<AdditionalPrice>) -> Self {
        self.legacy_additional_prices = Some(prices.clone());
        self.additional_prices = Some(prices);
        self
    }
}

/// Body of the legacy checkout package endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PkgSetPayload {
    pub order_token: String,
    /// 1 when protection is on
    pub checked: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferInfo {
    pub source: String,
}

/// Adds one protection item to the cart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartAddRequest {
    pub product_id: String,
    pub variant_id: String,
    pub quantity: u32,
    pub refer_info: ReferInfo,
}

impl CartAddRequest {
    pub fn protection(product_id: &str, variant_id: &str) -> Self {
        Self {
            product_id: product_id.to_string(),
            variant_id: variant_id.to_string(),
            quantity: 1,
            refer_info: ReferInfo {
                source: "add_to_cart".to_string(),
            },
        }
    }
}

/// A line of the live cart
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CartLine {
    #[serde(deserialize_with = "loose::id")]
    pub id: Option<String>,
    #[serde(deserialize_with = "loose::id", alias = "productId")]
    pub product_id: Option<String>,
    #[serde(deserialize_with = "loose::id", alias = "variantId")]
    pub variant_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CartBody {
    pub line_items: Vec<CartLine>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CartResponse {
    pub cart: Option<CartBody>,
}

/// Removes a cart line. Sent to the variant's cart URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartRemoveRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub product_id: String,
    pub variant_id: String,
}

/// Best-effort notice to the app that the fee changed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeeNotification {
    pub shop: String,
    pub order_token: String,
    pub amount: String,
    pub label: String,
    pub enabled: bool,
}
