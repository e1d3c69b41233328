//! Test utilities and fixtures for item protection integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use chrono::Utc;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde_json::Value;

pub use item_protection::config::{RateLimitConfig, SigningConfig};
pub use item_protection::crypto::{
    SIGNATURE_HEADER, TIMESTAMP_HEADER, canonicalize_query, sign,
};
pub use item_protection::db::{AppState, init_db, queries};
pub use item_protection::handlers;
pub use item_protection::models::*;

pub const SHOP: &str = "demo.myshoplaza.com";
pub const PROTECTION_PRODUCT: &str = "ip-product";
pub const PROTECTION_VARIANT: &str = "ip-variant";
pub const CLIENT_SECRET: &str = "test-client-secret";
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

/// Signing config with both secrets set and the demo bypass off
pub fn test_signing() -> SigningConfig {
    SigningConfig {
        client_secret: Some(CLIENT_SECRET.to_string()),
        webhook_secret: Some(WEBHOOK_SECRET.to_string()),
        timestamp_tolerance_secs: SigningConfig::DEFAULT_TOLERANCE_SECS,
        allow_demo_bypass: false,
    }
}

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// App state over a single-connection in-memory pool
pub fn create_test_app_state_with(signing: SigningConfig) -> AppState {
    let manager = SqliteConnectionManager::memory();
    let db = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = db.get().unwrap();
        init_db(&conn).unwrap();
    }
    AppState { db, signing }
}

pub fn create_test_app_state() -> AppState {
    create_test_app_state_with(test_signing())
}

/// Full router with rate limiting off
pub fn app(state: AppState) -> Router {
    handlers::router(state, RateLimitConfig::disabled())
}

/// Flat-rate settings with the protection product configured
pub fn flat_settings(percent: f64) -> StoreSettings {
    StoreSettings {
        activated: true,
        fixed_percent_all: percent,
        item_protection_product_id: Some(PROTECTION_PRODUCT.to_string()),
        item_protection_variant_id: Some(PROTECTION_VARIANT.to_string()),
        ..StoreSettings::default()
    }
}

pub fn per_category_settings(default_percent: f64, percents: &[(&str, f64)]) -> StoreSettings {
    StoreSettings {
        pricing_mode: PricingMode::PerCategory,
        category_percents: percents
            .iter()
            .map(|(category, percent)| (category.to_string(), *percent))
            .collect::<BTreeMap<_, _>>(),
        ..flat_settings(default_percent)
    }
}

/// Register `shop` and save its settings
pub fn create_test_store(conn: &Connection, shop: &str, settings: &StoreSettings) -> Store {
    let store = queries::upsert_store(conn, shop).expect("Failed to create test store");
    queries::save_store_settings(conn, &store.id, settings).expect("Failed to save settings");
    queries::get_store_by_shop(conn, shop)
        .expect("Failed to reload store")
        .expect("Store missing after insert")
}

/// Seed the default shop with flat settings in the given state
pub fn seed_store(state: &AppState, settings: &StoreSettings) -> Store {
    let conn = state.db.get().unwrap();
    create_test_store(&conn, SHOP, settings)
}

pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Hex HMAC of `message` under `secret`
pub fn signature(secret: &str, message: &[u8]) -> String {
    hex::encode(sign(secret.as_bytes(), message).unwrap())
}

/// POST body signed the way the platform signs callbacks
pub fn signed_post(uri: &str, body: &Value) -> Request<Body> {
    let bytes = serde_json::to_vec(body).unwrap();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header(SIGNATURE_HEADER, signature(WEBHOOK_SECRET, &bytes))
        .header(TIMESTAMP_HEADER, now().to_string())
        .body(Body::from(bytes))
        .unwrap()
}

/// GET with `hmac` appended over the canonical query
pub fn signed_get(path: &str, query: &str) -> Request<Body> {
    let hmac = signature(CLIENT_SECRET, canonicalize_query(query).as_bytes());
    Request::builder()
        .method("GET")
        .uri(format!("{}?{}&hmac={}", path, query, hmac))
        .body(Body::empty())
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).expect("Response should be valid JSON")
}
