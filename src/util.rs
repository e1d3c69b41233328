//! Shared helpers for shop identifiers and request metadata.

use axum::http::HeaderMap;

pub const MAX_SHOP_LEN: usize = 256;

/// Headers that may carry the shop domain on platform callbacks, in order.
pub const SHOP_HEADERS: [&str; 2] = ["x-shop-domain", "x-shop"];

/// Canonical form of a shop identifier.
///
/// Trims, lowercases, and drops any scheme, path, query or trailing slash, so
/// `https://Demo.myshoplaza.com/` and `demo.myshoplaza.com` match.
pub fn normalize_shop_domain(shop: &str) -> String {
    let shop = shop.trim().to_ascii_lowercase();
    let without_scheme = shop
        .strip_prefix("https://")
        .or_else(|| shop.strip_prefix("http://"))
        .unwrap_or(&shop);
    without_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// First non-empty shop header, normalized.
pub fn shop_from_headers(headers: &HeaderMap) -> Option<String> {
    SHOP_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|v| v.to_str().ok())
        .map(normalize_shop_domain)
        .find(|s| !s.is_empty())
}

/// Whether a `Host` header names this machine.
pub fn is_local_host(headers: &HeaderMap) -> bool {
    let Some(host) = headers.get("host").and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let name = match host.strip_prefix('[') {
        // [::1]:3000
        Some(rest) => rest.split(']').next().unwrap_or_default(),
        None => host.split(':').next().unwrap_or_default(),
    };
    matches!(name, "localhost" | "127.0.0.1" | "::1")
}
