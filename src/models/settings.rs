use std::collections::{BTreeMap, HashSet};

use premium::{Rates, clamp_percent};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PricingMode {
    /// One percentage for the whole cart. Older rows store it as `fixed_percent_all`.
    #[default]
    #[serde(alias = "fixed_percent_all")]
    #[strum(to_string = "flat", serialize = "fixed_percent_all")]
    Flat,
    PerCategory,
}

/// A merchant's pricing configuration, as the admin surface sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    pub activated: bool,
    pub pricing_mode: PricingMode,
    pub fixed_percent_all: f64,
    pub category_percents: BTreeMap<String, f64>,
    pub excluded_category_ids: Vec<String>,
    pub widget_variant: String,
    #[serde(rename = "enablePoweredByChubb")]
    pub show_brand_logo: bool,
    pub offer_at_checkout: bool,
    pub default_at_checkout: bool,
    pub item_protection_product_id: Option<String>,
    pub item_protection_variant_id: Option<String>,
    pub updated_at: i64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            activated: false,
            pricing_mode: PricingMode::Flat,
            fixed_percent_all: 0.0,
            category_percents: BTreeMap::new(),
            excluded_category_ids: Vec::new(),
            widget_variant: "default".to_string(),
            show_brand_logo: true,
            offer_at_checkout: true,
            default_at_checkout: false,
            item_protection_product_id: None,
            item_protection_variant_id: None,
            updated_at: 0,
        }
    }
}

impl StoreSettings {
    /// Force every percentage into 0..=100.
    pub fn clamped(mut self) -> Self {
        self.fixed_percent_all = clamp_percent(self.fixed_percent_all);
        for percent in self.category_percents.values_mut() {
            *percent = clamp_percent(*percent);
        }
        self
    }

    pub fn protection_product_id(&self) -> Option<&str> {
        self.item_protection_product_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Flat-only rates. The pricing callback never uses categories.
    pub fn flat_rates(&self) -> Rates {
        Rates::flat(self.fixed_percent_all)
    }

    pub fn rates(&self) -> Rates {
        match self.pricing_mode {
            PricingMode::Flat => self.flat_rates(),
            PricingMode::PerCategory => Rates::per_category(
                self.fixed_percent_all,
                self.category_percents
                    .iter()
                    .map(|(k, v)| (k.clone(), *v))
                    .collect(),
                self.excluded_category_ids.iter().cloned().collect::<HashSet<_>>(),
            ),
        }
    }
}

/// The subset of settings the checkout page may read. Holds no secrets.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSettings {
    pub activated: bool,
    pub pricing_mode: PricingMode,
    pub fixed_percent_all: f64,
    pub category_percents: BTreeMap<String, f64>,
    pub excluded_category_ids: Vec<String>,
    pub widget_variant: String,
    pub enable_powered_by_chubb: bool,
    pub offer_at_checkout: bool,
    pub default_at_checkout: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_protection_product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_protection_variant_id: Option<String>,
}

impl From<&StoreSettings> for PublicSettings {
    fn from(s: &StoreSettings) -> Self {
        Self {
            activated: s.activated,
            pricing_mode: s.pricing_mode,
            fixed_percent_all: s.fixed_percent_all,
            category_percents: s.category_percents.clone(),
            excluded_category_ids: s.excluded_category_ids.clone(),
            widget_variant: s.widget_variant.clone(),
            enable_powered_by_chubb: s.show_brand_logo,
            offer_at_checkout: s.offer_at_checkout,
            default_at_checkout: s.default_at_checkout,
            item_protection_product_id: s.item_protection_product_id.clone(),
            item_protection_variant_id: s.item_protection_variant_id.clone(),
        }
    }
}
