pub mod admin;
pub mod platform;
pub mod public;

use axum::Router;

use crate::config::RateLimitConfig;
use crate::db::AppState;

/// Every route the service exposes, bound to `state`.
pub fn router(state: AppState, rate_limit: RateLimitConfig) -> Router {
    Router::new()
        // Storefront checkout page (CORS, rate limited)
        .merge(public::router(rate_limit))
        // Platform callbacks (webhook signature)
        .merge(platform::router(state.clone()))
        // Admin reads (app signature)
        .merge(admin::router(state.clone()))
        .with_state(state)
}
