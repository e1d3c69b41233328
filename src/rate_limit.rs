//! Per-IP rate limiting for the storefront endpoints.
//!
//! Tiers:
//! - Strict: /apply-fee - writes a log line per call
//! - Standard: /public-settings, /product-categories - one database read per call
//! - Relaxed: /health
//!
//! Configure via environment variables (0 disables a tier):
//! - RATE_LIMIT_STRICT_RPM (default: 30)
//! - RATE_LIMIT_STANDARD_RPM (default: 60)
//! - RATE_LIMIT_RELAXED_RPM (default: 120)

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;

use crate::db::AppState;

/// Rate limiter layer type alias using governor types directly
pub type RateLimitLayer = GovernorLayer<
    tower_governor::key_extractor::PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware<governor::clock::QuantaInstant>,
    axum::body::Body,
>;

/// Creates a rate limiter layer with the specified requests per minute.
/// Returns None for 0, which disables limiting.
fn create_layer(requests_per_minute: u32) -> Option<RateLimitLayer> {
    if requests_per_minute == 0 {
        return None;
    }

    // Replenish one request every (60 / rpm) seconds, at least one per second
    let period_ms = (60_000 / u64::from(requests_per_minute)).max(1);
    let config = GovernorConfigBuilder::default()
        .period(Duration::from_millis(period_ms))
        .burst_size(requests_per_minute)
        .finish()?;

    Some(GovernorLayer::new(Arc::new(config)))
}

/// Layer for endpoints with side effects.
pub fn strict_layer(requests_per_minute: u32) -> Option<RateLimitLayer> {
    create_layer(requests_per_minute)
}

/// Layer for database-backed reads.
pub fn standard_layer(requests_per_minute: u32) -> Option<RateLimitLayer> {
    create_layer(requests_per_minute)
}

/// Layer for lightweight endpoints like health checks.
pub fn relaxed_layer(requests_per_minute: u32) -> Option<RateLimitLayer> {
    create_layer(requests_per_minute)
}

/// Apply a tier to a router, or leave it unlimited when the tier is disabled.
pub fn limited(
    router: Router<AppState>,
    tier: fn(u32) -> Option<RateLimitLayer>,
    requests_per_minute: u32,
) -> Router<AppState> {
    match tier(requests_per_minute) {
        Some(layer) => router.layer(layer),
        None => router,
    }
}
