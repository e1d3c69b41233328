//! Item-protection premium math.
//!
//! One calculator backs every place a premium is priced: the sandboxed cart
//! transform function, the HTTP pricing callback, and the checkout preview.
//! Keeping it in a single dependency-free crate means all three round and
//! clamp identically for the same cart.
//!
//! ```
//! use premium::{compute, Line, Rates};
//! use std::collections::HashMap;
//!
//! let lines = [Line::new("sku-1", 200.0, 1)];
//! let premium = compute(&lines, &Rates::flat(5.0), &HashMap::new());
//! assert_eq!(premium.to_string(), "10.00");
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;

#[cfg(feature = "serde")]
pub mod patch;

/// Largest premium the platform accepts as a fixed line price.
pub const PREMIUM_CEILING: f64 = 999_999_999.0;

/// Percent applied when a store has no explicit rate.
pub const DEFAULT_PERCENT: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PricingMode {
    /// One percentage across the whole cart.
    #[default]
    Flat,
    /// Per-category percentages with a flat fallback.
    PerCategory,
}

/// Percentages used to price a cart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rates {
    pub mode: PricingMode,
    pub flat_percent: f64,
    pub category_percents: HashMap<String, f64>,
    pub excluded_categories: HashSet<String>,
}

impl Rates {
    pub fn flat(percent: f64) -> Self {
        Self {
            mode: PricingMode::Flat,
            flat_percent: percent,
            ..Self::default()
        }
    }

    pub fn per_category(
        flat_percent: f64,
        category_percents: HashMap<String, f64>,
        excluded_categories: HashSet<String>,
    ) -> Self {
        Self {
            mode: PricingMode::PerCategory,
            flat_percent,
            category_percents,
            excluded_categories,
        }
    }

    /// Effective percent for a line in the given category, always within 0..=100.
    ///
    /// Excluded categories price at zero. Unknown or missing categories fall
    /// back to the flat percent.
    pub fn percent_for(&self, category: Option<&str>) -> f64 {
        let percent = match (self.mode, category) {
            (PricingMode::Flat, _) | (PricingMode::PerCategory, None) => self.flat_percent,
            (PricingMode::PerCategory, Some(category)) => {
                if self.excluded_categories.contains(category) {
                    0.0
                } else {
                    self.category_percents
                        .get(category)
                        .copied()
                        .unwrap_or(self.flat_percent)
                }
            }
        };
        clamp_percent(percent)
    }
}

/// One cart line as seen by the calculator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line<'a> {
    pub product_id: &'a str,
    pub category_id: Option<&'a str>,
    pub unit_price: f64,
    pub quantity: u32,
    /// The protection line itself never contributes to the subtotal.
    pub is_protection: bool,
}

impl<'a> Line<'a> {
    pub fn new(product_id: &'a str, unit_price: f64, quantity: u32) -> Self {
        Self {
            product_id,
            category_id: None,
            unit_price,
            quantity,
            is_protection: false,
        }
    }

    pub fn with_category(mut self, category_id: &'a str) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn protection(mut self) -> Self {
        self.is_protection = true;
        self
    }

    /// Line total. Non-finite or negative prices count as zero.
    pub fn total(&self) -> f64 {
        let price = if self.unit_price.is_finite() && self.unit_price > 0.0 {
            self.unit_price
        } else {
            0.0
        };
        price * f64::from(self.quantity)
    }
}

/// A premium already rounded to cents and clamped to `0..=PREMIUM_CEILING`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Premium(f64);

impl Premium {
    pub const ZERO: Premium = Premium(0.0);

    /// Round to two decimals, then clamp.
    pub fn from_raw(raw: f64) -> Self {
        Premium(clamp_premium(round2(raw)))
    }

    pub fn amount(self) -> f64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 <= 0.0
    }
}

impl fmt::Display for Premium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Round to cents, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// NaN and non-positive values become 0; anything at or above the ceiling
/// (including infinity) becomes the ceiling.
pub fn clamp_premium(value: f64) -> f64 {
    if value.is_nan() || value <= 0.0 {
        0.0
    } else if value >= PREMIUM_CEILING {
        PREMIUM_CEILING
    } else {
        value
    }
}

pub fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

/// Price a cart.
///
/// `category_map` resolves product ids to categories for lines that do not
/// carry their own category. Protection lines are skipped. The result is
/// rounded once, after summing.
pub fn compute(lines: &[Line<'_>], rates: &Rates, category_map: &HashMap<String, String>) -> Premium {
    let priced = lines.iter().filter(|line| !line.is_protection);

    let raw = match rates.mode {
        PricingMode::Flat => {
            let subtotal: f64 = priced.map(Line::total).sum();
            subtotal * rates.percent_for(None) / 100.0
        }
        PricingMode::PerCategory => priced
            .map(|line| {
                let category = line
                    .category_id
                    .or_else(|| category_map.get(line.product_id).map(String::as_str));
                line.total() * rates.percent_for(category) / 100.0
            })
            .sum(),
    };

    Premium::from_raw(raw)
}
