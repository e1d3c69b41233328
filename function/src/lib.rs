//! Cart transform run by the platform inside its sandbox.
//!
//! The platform writes a cart document to stdin and reads a price patch from
//! stdout. There is no network, no filesystem and no error channel, so every
//! failure produces the empty patch instead of aborting checkout pricing.
//!
//! The protection line is found by its product title because the merchant's
//! configured product id is not available here. Its percent comes from the
//! `cd_insure.percent` metafield on that product, falling back to the percent
//! baked in at build time through `ITEM_PROTECTION_DEFAULT_PERCENT`.

use std::collections::HashMap;
use std::io::{self, Read, Write};

use premium::patch::CartPatch;
use premium::{compute, Line, Rates};
use serde_json::Value;

mod input;

pub const PROTECTION_TITLE: &str = "Item protection";
pub const METAFIELD_NAMESPACE: &str = "cd_insure";
pub const METAFIELD_KEY: &str = "percent";

/// Bytes requested per read from the input stream.
pub const READ_CHUNK: usize = 1024;

const EMPTY_PATCH: &[u8] = br#"{"operations":{"update":[]}}"#;

/// Build-time default percent, 20 unless overridden and valid.
pub fn default_percent() -> f64 {
    option_env!("ITEM_PROTECTION_DEFAULT_PERCENT")
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|p| p.is_finite() && (0.0..=100.0).contains(p))
        .unwrap_or(premium::DEFAULT_PERCENT)
}

/// Read the whole input in fixed-size chunks until a zero-length read.
pub fn read_input<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut input = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => return Ok(input),
            Ok(n) => input.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Price the protection line in a cart document.
pub fn transform(doc: &Value) -> CartPatch {
    let Some(items) = doc.pointer("/cart/line_items").and_then(Value::as_array) else {
        return CartPatch::empty();
    };

    let mut protection_id = None;
    let mut percent = default_percent();
    let mut lines = Vec::with_capacity(items.len());

    for item in items {
        let product = item.get("product");
        if input::is_protection(product) {
            if protection_id.is_none() {
                protection_id = input::line_id(item);
            }
            if let Some(p) = input::metafield_percent(product) {
                percent = p;
            }
            continue;
        }
        lines.push(Line::new("", input::unit_price(item), input::quantity(item)));
    }

    match protection_id {
        Some(id) => CartPatch::set_price(id, compute(&lines, &Rates::flat(percent), &HashMap::new())),
        None => CartPatch::empty(),
    }
}

/// Raw input bytes to raw output bytes. Never fails.
pub fn run(input: &[u8]) -> Vec<u8> {
    let patch = std::str::from_utf8(input)
        .ok()
        .and_then(|text| serde_json::from_str::<Value>(text).ok())
        .map(|doc| transform(&doc))
        .unwrap_or_default();
    serde_json::to_vec(&patch).unwrap_or_else(|_| EMPTY_PATCH.to_vec())
}

/// Full sandbox invocation: read everything, transform, write once.
pub fn execute<R: Read, W: Write>(reader: &mut R, writer: &mut W) {
    let input = read_input(reader).unwrap_or_default();
    let output = run(&input);
    // Nowhere to report a failed write.
    let _ = writer.write_all(&output).and_then(|_| writer.flush());
}
