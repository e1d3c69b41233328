//! Tests for GET /product-categories.

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

#[path = "../common/mod.rs"]
mod common;
use common::*;

fn seeded_state() -> AppState {
    let state = create_test_app_state();
    let store = seed_store(&state, &per_category_settings(5.0, &[("A", 10.0)]));
    let conn = state.db.get().unwrap();
    queries::set_product_category(&conn, &store.id, "a1", "A").unwrap();
    queries::set_product_category(&conn, &store.id, "b1", "B").unwrap();
    drop(conn);
    state
}

#[tokio::test]
async fn test_returns_known_products_only() {
    let state = seeded_state();

    let response = app(state)
        .oneshot(get(&format!(
            "/product-categories?shop={}&productIds=a1,%20b1,,zz,a1",
            SHOP
        )))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"a1": "A", "b1": "B"}));
}

#[tokio::test]
async fn test_no_ids_is_empty_map() {
    let state = seeded_state();

    let response = app(state)
        .oneshot(get(&format!("/product-categories?shop={}", SHOP)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({}));
}

#[tokio::test]
async fn test_unknown_store() {
    let state = seeded_state();

    let response = app(state)
        .oneshot(get("/product-categories?shop=nobody.myshoplaza.com&productIds=a1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_categories_are_scoped_to_store() {
    let state = seeded_state();
    {
        let conn = state.db.get().unwrap();
        create_test_store(&conn, "other.myshoplaza.com", &flat_settings(5.0));
    }

    let response = app(state)
        .oneshot(get("/product-categories?shop=other.myshoplaza.com&productIds=a1,b1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({}));
}
