use serde::Serialize;

use super::StoreSettings;

/// An installed shop.
#[derive(Debug, Clone, Serialize)]
pub struct Store {
    pub id: String,
    /// Normalized domain, e.g. `demo.myshoplaza.com`.
    pub shop_domain: String,
    pub installed_at: i64,
    /// Absent until the merchant first saves settings.
    pub settings: Option<StoreSettings>,
}

/// One product's category within a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductCategory {
    pub product_id: String,
    pub category_id: String,
}
