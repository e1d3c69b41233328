mod settings;

pub use settings::*;

use axum::{Router, middleware, routing::get};

use crate::db::AppState;
use crate::middleware::require_app_signature;

/// Admin reads, signed over the query string with the app client secret.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/settings", get(get_settings))
        .route_layer(middleware::from_fn_with_state(state, require_app_signature))
}
