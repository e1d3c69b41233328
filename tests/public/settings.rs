//! Tests for GET /public-settings and GET /health.

use axum::http::StatusCode;
use tower::ServiceExt;

#[path = "../common/mod.rs"]
mod common;
use common::*;

#[tokio::test]
async fn test_public_settings_for_configured_store() {
    let state = create_test_app_state();
    seed_store(
        &state,
        &StoreSettings {
            default_at_checkout: true,
            ..per_category_settings(5.0, &[("electronics", 8.0)])
        },
    );

    let response = app(state)
        .oneshot(get(&format!("/public-settings?shop={}", SHOP)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["activated"], true);
    assert_eq!(json["pricingMode"], "per_category");
    assert_eq!(json["fixedPercentAll"], 5.0);
    assert_eq!(json["categoryPercents"]["electronics"], 8.0);
    assert_eq!(json["offerAtCheckout"], true);
    assert_eq!(json["defaultAtCheckout"], true);
    assert_eq!(json["enablePoweredByChubb"], true);
    assert_eq!(json["itemProtectionProductId"], PROTECTION_PRODUCT);
    assert_eq!(json["itemProtectionVariantId"], PROTECTION_VARIANT);
    assert!(json.get("updatedAt").is_none());
}

#[tokio::test]
async fn test_public_settings_clamps_stored_percent() {
    let state = create_test_app_state();
    seed_store(&state, &flat_settings(250.0));

    let response = app(state)
        .oneshot(get(&format!("/public-settings?shop={}", SHOP)))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["fixedPercentAll"], 100.0);
}

#[tokio::test]
async fn test_public_settings_normalizes_shop() {
    let state = create_test_app_state();
    seed_store(&state, &flat_settings(5.0));

    let response = app(state)
        .oneshot(get("/public-settings?shop=https%3A%2F%2FDEMO.myshoplaza.com%2F"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_public_settings_requires_shop() {
    let state = create_test_app_state();

    let response = app(state.clone()).oneshot(get("/public-settings")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["details"], "Missing shop");

    let long = "a".repeat(257);
    let response = app(state)
        .oneshot(get(&format!("/public-settings?shop={}", long)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["details"],
        "Shop must be at most 256 characters"
    );
}

#[tokio::test]
async fn test_public_settings_unknown_store() {
    let state = create_test_app_state();

    let response = app(state)
        .oneshot(get("/public-settings?shop=nobody.myshoplaza.com"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Not found");
    assert_eq!(json["details"], "Store not found");
}

#[tokio::test]
async fn test_public_settings_allows_any_origin() {
    let state = create_test_app_state();
    seed_store(&state, &flat_settings(5.0));

    let mut request = get(&format!("/public-settings?shop={}", SHOP));
    request
        .headers_mut()
        .insert("origin", "https://demo.myshoplaza.com".parse().unwrap());

    let response = app(state).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_health() {
    let state = create_test_app_state();

    let response = app(state).oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}
