//! Item protection for Shoplazza checkouts
//!
//! Storage of each merchant's pricing settings, the signed price callback the
//! platform calls on every cart change, and the storefront endpoints the
//! checkout widget reads from. The premium arithmetic itself lives in the
//! `premium` crate so the sandboxed cart transform shares it.

pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod util;
