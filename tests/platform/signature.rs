//! Tests for the request signature filter on platform-called routes.

use axum::{body::Body, http::Request, http::StatusCode};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Value, json};
use tower::ServiceExt;

#[path = "../common/mod.rs"]
mod common;
use common::*;

fn cart_body() -> Vec<u8> {
    serde_json::to_vec(&json!({
        "shop": SHOP,
        "cart": {"line_items": [
            {"id": "1", "product_id": "mug", "price": 200},
            {"id": "42", "product_id": PROTECTION_PRODUCT, "price": 1}
        ]}
    }))
    .unwrap()
}

fn post_with(body: Vec<u8>, headers: &[(&str, String)]) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/cart-transform")
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, value);
    }
    builder.body(Body::from(body)).unwrap()
}

fn seeded_state(signing: SigningConfig) -> AppState {
    let state = create_test_app_state_with(signing);
    seed_store(&state, &flat_settings(5.0));
    state
}

async fn assert_unauthorized(response: axum::http::Response<Body>) {
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json: Value = body_json(response).await;
    assert_eq!(json["error"], "Unauthorized");
    assert_eq!(json["details"], "Invalid signature");
}

#[tokio::test]
async fn test_unsigned_request_is_rejected() {
    let state = seeded_state(test_signing());

    let response = app(state).oneshot(post_with(cart_body(), &[])).await.unwrap();

    assert_unauthorized(response).await;
}

#[tokio::test]
async fn test_wrong_secret_is_rejected() {
    let state = seeded_state(test_signing());
    let body = cart_body();
    let forged = signature("not-the-secret", &body);

    let response = app(state)
        .oneshot(post_with(body, &[(SIGNATURE_HEADER, forged)]))
        .await
        .unwrap();

    assert_unauthorized(response).await;
}

#[tokio::test]
async fn test_tampered_body_is_rejected() {
    let state = seeded_state(test_signing());
    let signed = signature(WEBHOOK_SECRET, &cart_body());
    let tampered = serde_json::to_vec(&json!({"shop": SHOP, "cart": {"line_items": []}})).unwrap();

    let response = app(state)
        .oneshot(post_with(tampered, &[(SIGNATURE_HEADER, signed)]))
        .await
        .unwrap();

    assert_unauthorized(response).await;
}

#[tokio::test]
async fn test_base64_signature_is_accepted() {
    let state = seeded_state(test_signing());
    let body = cart_body();
    let digest = sign(WEBHOOK_SECRET.as_bytes(), &body).unwrap();

    let response = app(state)
        .oneshot(post_with(body, &[(SIGNATURE_HEADER, BASE64.encode(digest))]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_stale_timestamp_is_rejected() {
    let state = seeded_state(test_signing());
    let body = cart_body();
    let sig = signature(WEBHOOK_SECRET, &body);

    let response = app(state)
        .oneshot(post_with(
            body,
            &[
                (SIGNATURE_HEADER, sig),
                (TIMESTAMP_HEADER, (now() - 3600).to_string()),
            ],
        ))
        .await
        .unwrap();

    assert_unauthorized(response).await;
}

#[tokio::test]
async fn test_unparsable_timestamp_is_ignored() {
    let state = seeded_state(test_signing());
    let body = cart_body();
    let sig = signature(WEBHOOK_SECRET, &body);

    let response = app(state)
        .oneshot(post_with(
            body,
            &[
                (SIGNATURE_HEADER, sig),
                (TIMESTAMP_HEADER, "last tuesday".to_string()),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_webhook_secret_falls_back_to_client_secret() {
    let state = seeded_state(SigningConfig {
        webhook_secret: None,
        ..test_signing()
    });
    let body = cart_body();
    let sig = signature(CLIENT_SECRET, &body);

    let response = app(state)
        .oneshot(post_with(body, &[(SIGNATURE_HEADER, sig)]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_secret_is_server_error() {
    let state = seeded_state(SigningConfig {
        client_secret: None,
        webhook_secret: None,
        ..test_signing()
    });
    let body = cart_body();
    let sig = signature(WEBHOOK_SECRET, &body);

    let response = app(state)
        .oneshot(post_with(body, &[(SIGNATURE_HEADER, sig)]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Internal server error");
    assert!(json.get("details").is_none());
}

#[tokio::test]
async fn test_demo_bypass_in_dev_mode_on_localhost() {
    let state = seeded_state(SigningConfig {
        allow_demo_bypass: true,
        ..test_signing()
    });

    let response = app(state)
        .oneshot(post_with(
            cart_body(),
            &[
                ("host", "localhost:3000".to_string()),
                ("x-demo-mode", "1".to_string()),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["operations"]["update"][0]["price"]["adjustment_fixed_price"], "10.00");
}

#[tokio::test]
async fn test_demo_bypass_needs_local_host() {
    let state = seeded_state(SigningConfig {
        allow_demo_bypass: true,
        ..test_signing()
    });

    let response = app(state)
        .oneshot(post_with(
            cart_body(),
            &[
                ("host", "app.example.com".to_string()),
                ("x-demo-mode", "1".to_string()),
            ],
        ))
        .await
        .unwrap();

    assert_unauthorized(response).await;
}

#[tokio::test]
async fn test_demo_bypass_off_outside_dev_mode() {
    let state = seeded_state(test_signing());

    let response = app(state)
        .oneshot(post_with(
            cart_body(),
            &[
                ("host", "localhost:3000".to_string()),
                (SIGNATURE_HEADER, "demo-signature".to_string()),
            ],
        ))
        .await
        .unwrap();

    assert_unauthorized(response).await;
}

#[tokio::test]
async fn test_admin_read_needs_query_signature() {
    let state = seeded_state(test_signing());

    let response = app(state.clone())
        .oneshot(get(&format!("/settings?shop={}", SHOP)))
        .await
        .unwrap();
    assert_unauthorized(response).await;

    // Signed with the webhook secret instead of the client secret
    let query = format!("shop={}&timestamp={}", SHOP, now());
    let hmac = signature(WEBHOOK_SECRET, canonicalize_query(&query).as_bytes());
    let response = app(state)
        .oneshot(get(&format!("/settings?{}&hmac={}", query, hmac)))
        .await
        .unwrap();
    assert_unauthorized(response).await;
}
