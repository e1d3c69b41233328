use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::config::SigningConfig;
use crate::crypto::{
    SIGNATURE_HEADER, SIGNATURE_PARAM, TIMESTAMP_HEADER, TIMESTAMP_PARAM, canonicalize_query,
    is_fresh, parse_timestamp, query_param, verify_signature,
};
use crate::db::AppState;
use crate::error::{AppError, msg};
use crate::util::is_local_host;

/// Largest body buffered for signature verification.
pub const MAX_SIGNED_BODY_BYTES: usize = 1024 * 1024;

pub const DEMO_HEADER: &str = "x-demo-mode";
const DEMO_SHOP_MARKER: &str = "demo-store";
const DEMO_SIGNATURES: [&str; 2] = ["demo-signature", "demo-hmac-signature"];

/// Which secret signs a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureClass {
    /// Platform callbacks, signed with the webhook secret.
    Webhook,
    /// OAuth-style redirects and admin reads, signed with the client secret.
    App,
}

/// Inserted into request extensions once a request passes the filter.
#[derive(Debug, Clone, Copy)]
pub struct SignedRequest {
    pub class: SignatureClass,
    /// Let through by the local demo bypass rather than a signature.
    pub demo: bool,
}

pub async fn require_webhook_signature(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    verify_request(SignatureClass::Webhook, &state.signing, request, next).await
}

pub async fn require_app_signature(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    verify_request(SignatureClass::App, &state.signing, request, next).await
}

fn unauthorized() -> AppError {
    AppError::Unauthorized(msg::INVALID_SIGNATURE.into())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Demo traffic is only recognized in dev mode and on a local host.
fn is_demo_request(
    signing: &SigningConfig,
    headers: &HeaderMap,
    raw_query: &str,
    provided: Option<&str>,
) -> bool {
    if !signing.allow_demo_bypass || !is_local_host(headers) {
        return false;
    }
    headers.contains_key(DEMO_HEADER)
        || query_param(raw_query, "shop").is_some_and(|shop| shop.contains(DEMO_SHOP_MARKER))
        || provided.is_some_and(|sig| DEMO_SIGNATURES.contains(&sig))
}

/// GET and HEAD are signed over the query string, everything else over the body.
fn signs_query(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD
}

async fn verify_request(
    class: SignatureClass,
    signing: &SigningConfig,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();
    let raw_query = request.uri().query().unwrap_or_default().to_string();

    let provided = header_str(request.headers(), SIGNATURE_HEADER)
        .or_else(|| query_param(&raw_query, SIGNATURE_PARAM))
        .map(str::to_string);

    if is_demo_request(signing, request.headers(), &raw_query, provided.as_deref()) {
        tracing::debug!(path = %path, "Demo request let through without signature");
        request
            .extensions_mut()
            .insert(SignedRequest { class, demo: true });
        return Ok(next.run(request).await);
    }

    let Some(provided) = provided.filter(|sig| !sig.trim().is_empty()) else {
        tracing::warn!(path = %path, "Rejected request: missing signature");
        return Err(unauthorized());
    };

    let secret = match class {
        SignatureClass::Webhook => signing.webhook_secret(),
        SignatureClass::App => signing.client_secret(),
    };
    let Some(secret) = secret.map(|s| s.as_bytes().to_vec()) else {
        tracing::error!(path = %path, ?class, "Rejected request: signing secret not configured");
        return Err(AppError::Internal(msg::SIGNING_NOT_CONFIGURED.into()));
    };

    // Unparsable timestamps are ignored, like absent ones.
    let timestamp = header_str(request.headers(), TIMESTAMP_HEADER)
        .or_else(|| query_param(&raw_query, TIMESTAMP_PARAM))
        .and_then(parse_timestamp);
    if let Some(timestamp) = timestamp
        && !is_fresh(timestamp, Utc::now().timestamp(), signing.timestamp_tolerance_secs)
    {
        tracing::warn!(path = %path, "Rejected request: stale timestamp");
        return Err(unauthorized());
    }

    let (mut request, message) = if signs_query(request.method()) {
        let canonical = canonicalize_query(&raw_query);
        (request, canonical.into_bytes())
    } else {
        let (parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, MAX_SIGNED_BODY_BYTES)
            .await
            .map_err(|_| AppError::BadRequest(msg::BODY_TOO_LARGE.into()))?;
        let message = bytes.to_vec();
        (Request::from_parts(parts, Body::from(bytes)), message)
    };

    if message.is_empty() || !verify_signature(&secret, &message, &provided) {
        tracing::warn!(path = %path, "Rejected request: invalid signature");
        return Err(unauthorized());
    }

    request
        .extensions_mut()
        .insert(SignedRequest { class, demo: false });
    Ok(next.run(request).await)
}
