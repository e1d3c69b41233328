//! Display-only premium shown next to the toggle.
//!
//! The authoritative premium is whatever the cart transform or pricing
//! callback charges; this only has to be close enough to show.

use std::collections::HashMap;

use premium::{Line, Premium, PricingMode, compute};

use crate::types::{CheckoutPrices, CheckoutProduct, PublicSettings};

/// Shown when the page has no checkout runtime to read a cart from.
pub const SAMPLE_PREMIUM: f64 = 4.69;

/// Smallest premium shown for a non-empty cart with a non-zero flat percent.
pub const MINIMUM_PREMIUM: f64 = 0.01;

pub fn sample_premium() -> Premium {
    Premium::from_raw(SAMPLE_PREMIUM)
}

/// Preview premium for the host's current cart.
///
/// The protection product itself is never priced. In flat mode an empty
/// product list falls back to the host's order total.
pub fn preview_premium(
    settings: &PublicSettings,
    prices: Option<&CheckoutPrices>,
    products: &[CheckoutProduct],
    category_map: &HashMap<String, String>,
) -> Premium {
    let protection = settings.protection_product_id();
    let mut lines: Vec<Line<'_>> = products
        .iter()
        .map(|product| {
            let line = product.to_line();
            if protection.is_some_and(|id| Some(id) == product.product_key()) {
                line.protection()
            } else {
                line
            }
        })
        .collect();

    let rates = settings.rates();
    if rates.mode == PricingMode::PerCategory {
        return compute(&lines, &rates, category_map);
    }

    if products.is_empty() {
        if let Some(prices) = prices {
            lines.push(Line::new("", prices.total(), 1));
        }
    }

    let subtotal: f64 = lines
        .iter()
        .filter(|line| !line.is_protection)
        .map(Line::total)
        .sum();
    let premium = compute(&lines, &rates, category_map);

    if premium.is_zero() && subtotal > 0.0 && settings.has_percent() {
        Premium::from_raw(MINIMUM_PREMIUM)
    } else {
        premium
    }
}
