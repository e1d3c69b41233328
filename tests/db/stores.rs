//! Tests for store, settings and category queries.

use std::collections::BTreeMap;

#[path = "../common/mod.rs"]
mod common;
use common::*;

#[test]
fn test_upsert_store_is_idempotent() {
    let conn = setup_test_db();

    let first = queries::upsert_store(&conn, "https://Demo.myshoplaza.com/").unwrap();
    let second = queries::upsert_store(&conn, SHOP).unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.shop_domain, SHOP);
    assert!(first.settings.is_none());
}

#[test]
fn test_upsert_store_rejects_blank_shop() {
    let conn = setup_test_db();
    assert!(queries::upsert_store(&conn, "   ").is_err());
}

#[test]
fn test_settings_round_trip_through_store() {
    let conn = setup_test_db();
    let settings = StoreSettings {
        excluded_category_ids: vec!["gift-cards".to_string()],
        default_at_checkout: true,
        show_brand_logo: false,
        widget_variant: "compact".to_string(),
        ..per_category_settings(5.0, &[("electronics", 8.0), ("apparel", 3.0)])
    };

    let store = create_test_store(&conn, SHOP, &settings);
    let loaded = store.settings.unwrap();

    assert_eq!(loaded.pricing_mode, PricingMode::PerCategory);
    assert_eq!(loaded.category_percents, settings.category_percents);
    assert_eq!(loaded.excluded_category_ids, vec!["gift-cards"]);
    assert!(loaded.default_at_checkout);
    assert!(!loaded.show_brand_logo);
    assert_eq!(loaded.widget_variant, "compact");
    assert_eq!(loaded.protection_product_id(), Some(PROTECTION_PRODUCT));
    assert!(loaded.updated_at > 0);
}

#[test]
fn test_save_settings_replaces_previous() {
    let conn = setup_test_db();
    let store = create_test_store(&conn, SHOP, &flat_settings(5.0));

    queries::save_store_settings(&conn, &store.id, &flat_settings(7.5)).unwrap();

    let loaded = queries::get_store_by_shop(&conn, SHOP)
        .unwrap()
        .unwrap()
        .settings
        .unwrap();
    assert_eq!(loaded.fixed_percent_all, 7.5);
}

#[test]
fn test_legacy_pricing_mode_reads_as_flat() {
    let conn = setup_test_db();
    let store = create_test_store(&conn, SHOP, &flat_settings(5.0));
    conn.execute(
        "UPDATE store_settings SET pricing_mode = 'fixed_percent_all' WHERE store_id = ?1",
        [&store.id],
    )
    .unwrap();

    let loaded = queries::get_store_by_shop(&conn, SHOP)
        .unwrap()
        .unwrap()
        .settings
        .unwrap();
    assert_eq!(loaded.pricing_mode, PricingMode::Flat);
}

#[test]
fn test_malformed_json_columns_degrade_to_empty() {
    let conn = setup_test_db();
    let store = create_test_store(&conn, SHOP, &per_category_settings(5.0, &[("A", 10.0)]));
    conn.execute(
        "UPDATE store_settings SET category_percents = 'nope', excluded_category_ids = '{' WHERE store_id = ?1",
        [&store.id],
    )
    .unwrap();

    let loaded = queries::get_store_by_shop(&conn, SHOP)
        .unwrap()
        .unwrap()
        .settings
        .unwrap();
    assert!(loaded.category_percents.is_empty());
    assert!(loaded.excluded_category_ids.is_empty());
}

#[test]
fn test_out_of_range_stored_percent_is_clamped_on_read() {
    let conn = setup_test_db();
    let store = create_test_store(&conn, SHOP, &flat_settings(5.0));
    conn.execute(
        "UPDATE store_settings SET fixed_percent_all = 400 WHERE store_id = ?1",
        [&store.id],
    )
    .unwrap();

    let loaded = queries::get_store_by_shop(&conn, SHOP)
        .unwrap()
        .unwrap()
        .settings
        .unwrap();
    assert_eq!(loaded.fixed_percent_all, 100.0);
}

#[test]
fn test_product_category_map() {
    let conn = setup_test_db();
    let store = create_test_store(&conn, SHOP, &flat_settings(5.0));
    queries::set_product_category(&conn, &store.id, "a1", "A").unwrap();
    queries::set_product_category(&conn, &store.id, "b1", "B").unwrap();
    queries::set_product_category(&conn, &store.id, "a1", "C").unwrap();

    let ids = vec!["a1".to_string(), "b1".to_string(), "zz".to_string()];
    let map = queries::get_product_category_map(&conn, &store.id, &ids).unwrap();

    assert_eq!(
        map,
        BTreeMap::from([
            ("a1".to_string(), "C".to_string()),
            ("b1".to_string(), "B".to_string()),
        ])
    );
    assert!(
        queries::get_product_category_map(&conn, &store.id, &[])
            .unwrap()
            .is_empty()
    );
}
