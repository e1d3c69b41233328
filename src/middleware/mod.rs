//! Request authenticity filter for traffic that claims to come from the platform.
//!
//! Applied with `axum::middleware::from_fn_with_state` on the routes the
//! platform calls directly. Rejections never echo the secret or either
//! signature; the warning carries only the request path.

mod hmac_auth;

pub use hmac_auth::*;
