//! The checkout page the engine runs inside.
//!
//! Every capability is optional: hosts differ per theme and platform version,
//! so each method has a default meaning "not available here" and the engine
//! treats a `false` or `None` as one more channel that did not respond.

use serde_json::Value;

use crate::types::{CheckoutPrices, CheckoutProduct, FeeLine, ShippingAddress};

/// Which refresh hint to show after a cart change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintKind {
    Added,
    Removed,
}

impl HintKind {
    pub fn message(self) -> &'static str {
        match self {
            HintKind::Added => "Item protection added. Refresh the page to see the updated total.",
            HintKind::Removed => {
                "Item protection removed. Refresh the page to see the updated total."
            }
        }
    }
}

/// What the widget should display.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetView {
    pub toggle_on: bool,
    /// Premium formatted to cents, or a dash when there is nothing to charge
    pub price_label: String,
    pub currency_symbol: String,
    /// No premium and no percent: shown as unavailable, toggle hidden
    pub disabled: bool,
    pub show_brand_logo: bool,
}

pub trait CheckoutHost {
    /// Whether the page exposes the platform's checkout runtime at all.
    fn has_checkout_api(&self) -> bool {
        false
    }

    fn prices(&self) -> Option<CheckoutPrices> {
        None
    }

    fn products(&self) -> Vec<CheckoutProduct> {
        Vec::new()
    }

    fn step(&self) -> Option<String> {
        None
    }

    fn shipping_address(&self) -> Option<ShippingAddress> {
        None
    }

    fn shipping_line(&self) -> Option<Value> {
        None
    }

    fn currency_symbol(&self) -> Option<String> {
        None
    }

    /// In-page pricing write. Returns true if any hook accepted the fees.
    fn set_additional_prices(&self, _fees: &[FeeLine]) -> bool {
        false
    }

    /// Feed fresh prices to the host's price-change hook.
    fn push_prices(&self, _prices: &CheckoutPrices) -> bool {
        false
    }

    /// Dispatch a named refresh event. Returns true if a listener handled it.
    fn dispatch_event(&self, _name: &str, _prices: &CheckoutPrices) -> bool {
        false
    }

    /// Call a refresh callback on the host's store object, if it has one by that name.
    fn call_store_callback(&self, _name: &str, _prices: &CheckoutPrices) -> bool {
        false
    }

    /// Draw the widget, or clear it when `view` is `None`.
    fn render(&self, _view: Option<&WidgetView>) {}

    /// Non-blocking text hint. Never a reload or an alert.
    fn show_hint(&self, _kind: HintKind) {}
}

/// A page without the checkout runtime, e.g. a manual test harness.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedHost;

impl CheckoutHost for DetachedHost {}
