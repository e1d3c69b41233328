//! Endpoints called from the storefront checkout page.
//!
//! Browsers on any shop domain call these, so CORS is open and every route
//! is rate limited per IP instead.

mod apply_fee;
mod categories;
mod settings;

pub use apply_fee::*;
pub use categories::*;
pub use settings::*;

use axum::{
    Json, Router,
    http::Method,
    routing::{get, post},
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::config::RateLimitConfig;
use crate::db::AppState;
use crate::rate_limit;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn storefront_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

pub fn router(rate_limit: RateLimitConfig) -> Router<AppState> {
    let health = rate_limit::limited(
        Router::new().route("/health", get(health)),
        rate_limit::relaxed_layer,
        rate_limit.relaxed_rpm,
    );

    let reads = rate_limit::limited(
        Router::new()
            .route("/public-settings", get(public_settings))
            .route("/product-categories", get(product_categories)),
        rate_limit::standard_layer,
        rate_limit.standard_rpm,
    );

    let writes = rate_limit::limited(
        Router::new().route("/apply-fee", post(apply_fee)),
        rate_limit::strict_layer,
        rate_limit.strict_rpm,
    );

    Router::new()
        .merge(health)
        .merge(reads.merge(writes).layer(storefront_cors()))
}
