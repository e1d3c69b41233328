use rusqlite::Connection;

/// Initialize the database schema
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Installed shops, keyed by normalized domain
        CREATE TABLE IF NOT EXISTS stores (
            id TEXT PRIMARY KEY,
            shop_domain TEXT NOT NULL UNIQUE,
            installed_at INTEGER NOT NULL
        );

        -- One pricing configuration per store
        -- category_percents: JSON object of category id -> percent
        -- excluded_category_ids: JSON array of category ids
        CREATE TABLE IF NOT EXISTS store_settings (
            store_id TEXT PRIMARY KEY REFERENCES stores(id) ON DELETE CASCADE,
            activated INTEGER NOT NULL DEFAULT 0,
            pricing_mode TEXT NOT NULL DEFAULT 'flat'
                CHECK (pricing_mode IN ('flat', 'fixed_percent_all', 'per_category')),
            fixed_percent_all REAL NOT NULL DEFAULT 0,
            category_percents TEXT NOT NULL DEFAULT '{}',
            excluded_category_ids TEXT NOT NULL DEFAULT '[]',
            widget_variant TEXT NOT NULL DEFAULT 'default',
            enable_powered_by_chubb INTEGER NOT NULL DEFAULT 1,
            offer_at_checkout INTEGER NOT NULL DEFAULT 1,
            default_at_checkout INTEGER NOT NULL DEFAULT 0,
            item_protection_product_id TEXT,
            item_protection_variant_id TEXT,
            updated_at INTEGER NOT NULL
        );

        -- Product -> category mapping resolved from platform collections
        CREATE TABLE IF NOT EXISTS product_categories (
            store_id TEXT NOT NULL REFERENCES stores(id) ON DELETE CASCADE,
            product_id TEXT NOT NULL,
            category_id TEXT NOT NULL,
            PRIMARY KEY (store_id, product_id)
        );
        "#,
    )
}
