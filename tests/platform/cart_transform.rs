//! Tests for POST /cart-transform, the HTTP pricing callback.

use axum::{body::Body, http::Request, http::StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

#[path = "../common/mod.rs"]
mod common;
use common::*;

fn cart(shop: Option<&str>) -> Value {
    let mut doc = json!({
        "cart": {
            "line_items": [
                {"id": "1", "product_id": "mug", "price": "120.00", "quantity": 1},
                {"id": "2", "product": {"product_id": "tee", "price": "40.00"}, "quantity": "2"},
                {"id": "42", "product_id": PROTECTION_PRODUCT, "price": "3.00", "quantity": 1}
            ]
        }
    });
    if let Some(shop) = shop {
        doc["shop"] = json!(shop);
    }
    doc
}

#[tokio::test]
async fn test_prices_protection_line() {
    let state = create_test_app_state();
    seed_store(&state, &flat_settings(5.0));

    let response = app(state)
        .oneshot(signed_post("/cart-transform", &cart(Some(SHOP))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json,
        json!({"operations": {"update": [
            {"id": "42", "price": {"adjustment_fixed_price": "10.00"}}
        ]}})
    );
}

#[tokio::test]
async fn test_shop_is_normalized() {
    let state = create_test_app_state();
    seed_store(&state, &flat_settings(5.0));

    let response = app(state)
        .oneshot(signed_post(
            "/cart-transform",
            &cart(Some("https://Demo.myshoplaza.com/")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["operations"]["update"][0]["price"]["adjustment_fixed_price"], "10.00");
}

#[tokio::test]
async fn test_shop_from_header_when_body_has_none() {
    let state = create_test_app_state();
    seed_store(&state, &flat_settings(5.0));

    let mut request = signed_post("/cart-transform", &cart(None));
    request
        .headers_mut()
        .insert("x-shop-domain", SHOP.parse().unwrap());

    let response = app(state).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["operations"]["update"][0]["id"], "42");
}

#[tokio::test]
async fn test_missing_shop_is_bad_request() {
    let state = create_test_app_state();

    let response = app(state)
        .oneshot(signed_post("/cart-transform", &cart(None)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Bad request");
    assert_eq!(json["details"], "Missing shop");
}

#[tokio::test]
async fn test_unknown_shop_is_not_found() {
    let state = create_test_app_state();

    let response = app(state)
        .oneshot(signed_post("/cart-transform", &cart(Some("nobody.myshoplaza.com"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["details"], "Store not found");
}

#[tokio::test]
async fn test_store_without_settings_is_not_found() {
    let state = create_test_app_state();
    {
        let conn = state.db.get().unwrap();
        queries::upsert_store(&conn, SHOP).unwrap();
    }

    let response = app(state)
        .oneshot(signed_post("/cart-transform", &cart(Some(SHOP))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["details"], "Settings not found");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let state = create_test_app_state();
    let body = b"{\"shop\": ".to_vec();

    let response = app(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/cart-transform")
                .header(SIGNATURE_HEADER, signature(WEBHOOK_SECRET, &body))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Invalid JSON");
}

#[tokio::test]
async fn test_non_object_cart_returns_empty_update() {
    let state = create_test_app_state();
    seed_store(&state, &flat_settings(5.0));

    for cart in [json!(null), json!("cart"), json!([])] {
        let response = app(state.clone())
            .oneshot(signed_post(
                "/cart-transform",
                &json!({"shop": SHOP, "cart": cart}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"operations": {"update": []}}));
    }
}

#[tokio::test]
async fn test_unconfigured_protection_product_returns_empty_update() {
    let state = create_test_app_state();
    seed_store(
        &state,
        &StoreSettings {
            item_protection_product_id: None,
            ..flat_settings(5.0)
        },
    );

    let response = app(state)
        .oneshot(signed_post("/cart-transform", &cart(Some(SHOP))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"operations": {"update": []}}));
}

#[tokio::test]
async fn test_per_category_store_is_priced_flat() {
    let state = create_test_app_state();
    seed_store(&state, &per_category_settings(5.0, &[("A", 50.0)]));
    {
        let conn = state.db.get().unwrap();
        let store = queries::get_store_by_shop(&conn, SHOP).unwrap().unwrap();
        queries::set_product_category(&conn, &store.id, "mug", "A").unwrap();
    }

    let response = app(state)
        .oneshot(signed_post("/cart-transform", &cart(Some(SHOP))))
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["operations"]["update"][0]["price"]["adjustment_fixed_price"], "10.00");
}

#[tokio::test]
async fn test_probe_needs_no_signature() {
    let state = create_test_app_state();

    let response = app(state).oneshot(get("/cart-transform")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["message"], "Cart Transform endpoint is reachable");
}
