mod cart_transform;

pub use cart_transform::*;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::db::AppState;
use crate::middleware::require_webhook_signature;

/// Routes the platform calls directly. `POST` is signed; the `GET` probe is not.
pub fn router(state: AppState) -> Router<AppState> {
    let signed_transform = post(cart_transform)
        .route_layer(middleware::from_fn_with_state(state, require_webhook_signature));

    Router::new().route(
        "/cart-transform",
        get(cart_transform_probe).merge(signed_transform),
    )
}
