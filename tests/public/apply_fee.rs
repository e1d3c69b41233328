//! Tests for POST /apply-fee, the widget's fee notification.

use axum::{body::Body, http::Request, http::StatusCode};
use serde_json::json;
use tower::ServiceExt;

#[path = "../common/mod.rs"]
mod common;
use common::*;

#[tokio::test]
async fn test_accepts_notification() {
    let state = create_test_app_state();
    seed_store(&state, &flat_settings(5.0));

    let response = app(state)
        .oneshot(post_json(
            "/apply-fee",
            &json!({
                "shop": SHOP,
                "order_token": "2407954194541497895892",
                "amount": "10.00",
                "label": "Item protection",
                "enabled": true
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"ok": true}));
}

#[tokio::test]
async fn test_numeric_amount_is_accepted() {
    let state = create_test_app_state();
    seed_store(&state, &flat_settings(5.0));

    let response = app(state)
        .oneshot(post_json(
            "/apply-fee",
            &json!({"shop": SHOP, "order_token": "t", "amount": 10, "enabled": false}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_requires_shop_and_order_token() {
    let state = create_test_app_state();
    seed_store(&state, &flat_settings(5.0));

    let response = app(state.clone())
        .oneshot(post_json("/apply-fee", &json!({"order_token": "t"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["details"], "Missing shop");

    let response = app(state)
        .oneshot(post_json("/apply-fee", &json!({"shop": SHOP, "order_token": "  "})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["details"], "Missing order_token");
}

#[tokio::test]
async fn test_unknown_store() {
    let state = create_test_app_state();

    let response = app(state)
        .oneshot(post_json(
            "/apply-fee",
            &json!({"shop": "nobody.myshoplaza.com", "order_token": "t"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body_is_json_error() {
    let state = create_test_app_state();

    let response = app(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/apply-fee")
                .header("content-type", "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Invalid JSON");
}

#[tokio::test]
async fn test_preflight_is_answered() {
    let state = create_test_app_state();

    let response = app(state)
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/apply-fee")
                .header("origin", "https://demo.myshoplaza.com")
                .header("access-control-request-method", "POST")
                .header("access-control-request-headers", "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
    let methods = response
        .headers()
        .get("access-control-allow-methods")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("POST"));
}
