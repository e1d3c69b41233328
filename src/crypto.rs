//! HMAC signing primitives for requests from the platform.
//!
//! Query-string requests are signed over a canonical form of the raw query;
//! body requests are signed over the raw body bytes. The platform sends the
//! digest hex- or base64-encoded depending on the endpoint, so both are
//! accepted.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::DateTime;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-shoplazza-hmac-sha256";
pub const TIMESTAMP_HEADER: &str = "x-shoplazza-triggered-at";
pub const SIGNATURE_PARAM: &str = "hmac";
pub const TIMESTAMP_PARAM: &str = "timestamp";

/// Unix timestamps above this are taken to be milliseconds.
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Canonical signed form of a raw query string.
///
/// Drops the signature pair and empty segments, then sorts the rest by key
/// using byte order. Values are never decoded or re-encoded: the signature
/// covers the exact bytes the sender produced.
pub fn canonicalize_query(raw: &str) -> String {
    let raw = raw.strip_prefix('?').unwrap_or(raw);
    let mut pairs: Vec<&str> = raw
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| !pair_key(pair).eq_ignore_ascii_case(SIGNATURE_PARAM))
        .collect();
    pairs.sort_by(|a, b| pair_key(a).as_bytes().cmp(pair_key(b).as_bytes()));
    pairs.join("&")
}

fn pair_key(pair: &str) -> &str {
    pair.split_once('=').map_or(pair, |(key, _)| key)
}

/// Raw value of a query parameter, without decoding.
pub fn query_param<'a>(raw: &'a str, name: &str) -> Option<&'a str> {
    raw.strip_prefix('?')
        .unwrap_or(raw)
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// HMAC-SHA256 of `message` under `secret`.
pub fn sign(secret: &[u8], message: &[u8]) -> Option<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(message);
    Some(mac.finalize().into_bytes().to_vec())
}

/// Decode a supplied signature from hex (either case) or standard base64.
fn decode_signature(provided: &str) -> Option<Vec<u8>> {
    let provided = provided.trim();
    if provided.is_empty() {
        return None;
    }
    hex::decode(provided)
        .ok()
        .or_else(|| BASE64.decode(provided).ok())
}

/// Constant-time check of a supplied signature against `message`.
pub fn verify_signature(secret: &[u8], message: &[u8], provided: &str) -> bool {
    let Some(provided) = decode_signature(provided) else {
        return false;
    };
    let Some(expected) = sign(secret, message) else {
        return false;
    };
    if provided.len() != expected.len() {
        return false;
    }
    expected.ct_eq(&provided).into()
}

/// Parse a request timestamp: unix seconds, unix milliseconds, or RFC 3339.
/// Anything else is treated as absent.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        let value: i64 = raw.parse().ok()?;
        return Some(if value > MILLIS_THRESHOLD { value / 1000 } else { value });
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.timestamp())
}

/// Whether `timestamp` lies within `tolerance_secs` of `now` in either direction.
pub fn is_fresh(timestamp: i64, now: i64, tolerance_secs: i64) -> bool {
    now.abs_diff(timestamp) <= tolerance_secs.unsigned_abs()
}
