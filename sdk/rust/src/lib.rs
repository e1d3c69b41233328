//! # Item protection checkout
//!
//! Keeps the item protection toggle on a Shoplazza checkout page in step with
//! the order total.
//!
//! The checkout UI cannot be written to directly. The engine instead pushes
//! every toggle through each channel the page might offer and then asks the
//! host to re-render; the total converges once the platform reprices the
//! cart through the bound cart transform or the pricing callback.
//!
//! ```rust,no_run
//! use item_protection_checkout::{
//!     DetachedHost, HttpStorefront, Session, SyncEngine, SyncOptions,
//! };
//!
//! # async fn run() -> item_protection_checkout::Result<()> {
//! let storefront = HttpStorefront::new("https://app.example.com", "https://demo.myshoplaza.com")?;
//! let session = Session::from_checkout_url(
//!     "demo.myshoplaza.com",
//!     "https://demo.myshoplaza.com/checkout/2407954194541497895892?step=payment_method",
//! )?;
//!
//! let mut engine = SyncEngine::new(storefront, DetachedHost, session, SyncOptions::default());
//! engine.load().await?;
//! let report = engine.toggle().await?;
//! println!("cart channel: {:?}", report.cart);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `rustls-tls` (default): Use rustls for HTTPS
//! - `native-tls`: Use the platform TLS stack instead

pub mod engine;
pub mod error;
pub mod host;
pub mod preview;
pub mod session;
pub mod storefront;
pub mod types;

// Engine
pub use engine::{ChannelOutcome, SyncEngine, SyncOptions, ToggleReport};

// Error types
pub use error::{CheckoutError, CheckoutErrorCode, Result};

// Host and network seams
pub use host::{CheckoutHost, DetachedHost, HintKind, WidgetView};
pub use storefront::{HttpStorefront, Storefront};

// Session
pub use session::{Session, SyncState};

// Types
pub use types::{
    AdditionalPrice, CartAddRequest, CartLine, CartRemoveRequest, CheckoutPrices,
    CheckoutProduct, FeeLine, FeeNotification, PkgSetPayload, PricePayload, PublicSettings,
    ShippingAddress,
};
