use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use item_protection::config::Config;
use item_protection::db::{AppState, create_pool, init_db, queries};
use item_protection::handlers;
use item_protection::models::{PricingMode, StoreSettings};

const DEMO_SHOP: &str = "demo-store.myshoplaza.com";

#[derive(Parser, Debug)]
#[command(name = "item-protection")]
#[command(about = "Item protection pricing service for Shoplazza checkouts")]
struct Cli {
    /// Seed the database with a demo store (dev mode only)
    #[arg(long)]
    seed: bool,
}

/// Seeds a demo store with settings and a few categorized products.
/// Only runs in dev mode; saving is idempotent so reseeding is harmless.
fn seed_dev_data(state: &AppState) {
    let conn = state.db.get().expect("Failed to get db connection for seeding");

    let store = queries::upsert_store(&conn, DEMO_SHOP).expect("Failed to create demo store");

    let settings = StoreSettings {
        activated: true,
        pricing_mode: PricingMode::PerCategory,
        fixed_percent_all: 5.0,
        category_percents: [("electronics".to_string(), 8.0), ("apparel".to_string(), 3.0)]
            .into_iter()
            .collect(),
        excluded_category_ids: vec!["gift-cards".to_string()],
        default_at_checkout: true,
        item_protection_product_id: Some("demo-protection".to_string()),
        item_protection_variant_id: Some("demo-protection-variant".to_string()),
        ..StoreSettings::default()
    };
    queries::save_store_settings(&conn, &store.id, &settings)
        .expect("Failed to save demo settings");

    for (product, category) in [
        ("demo-headphones", "electronics"),
        ("demo-tshirt", "apparel"),
        ("demo-gift-card", "gift-cards"),
    ] {
        queries::set_product_category(&conn, &store.id, product, category)
            .expect("Failed to seed product category");
    }

    tracing::info!("============================================");
    tracing::info!("DEV DATA SEEDED");
    tracing::info!("Shop: {} (id: {})", store.shop_domain, store.id);
    tracing::info!("Protection product: demo-protection");
    tracing::info!("============================================");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "item_protection=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode (demo signature bypass enabled for local hosts)");
    }
    if config.signing.client_secret().is_none() && config.signing.webhook_secret().is_none() {
        tracing::warn!("No signing secret configured: signed endpoints will answer 500");
    }

    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState {
        db: db_pool,
        signing: config.signing.clone(),
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set ITEM_PROTECTION_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    let app = handlers::router(state, config.rate_limit).layer(TraceLayer::new_for_http());

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Item protection server listening on {} ({})", addr, config.base_url);

    // Peer addresses feed the per-IP rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
