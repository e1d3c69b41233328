//! The synchronization engine.
//!
//! A toggle cannot be written to the host's total directly. Instead it is
//! pushed through every channel that might move it: the in-page pricing hook,
//! the cart line API, the legacy package endpoint and a price recalculation
//! carrying the fee, plus a notice to the app. Channels run concurrently and
//! fail independently. Afterwards prices are refetched and handed to whatever
//! refresh hooks the page exposes.

use std::collections::HashSet;
use std::fmt::Display;
use std::time::Duration;

use premium::{Premium, PricingMode};

use crate::error::{CheckoutError, Result};
use crate::host::{CheckoutHost, HintKind, WidgetView};
use crate::preview::{preview_premium, sample_premium};
use crate::session::{Session, SyncState};
use crate::storefront::Storefront;
use crate::types::{
    AdditionalPrice, CartAddRequest, CartRemoveRequest, CheckoutPrices, CheckoutProduct,
    FEE_LABEL, FeeLine, FeeNotification, PkgSetPayload, PricePayload, PublicSettings,
};

/// Window events dispatched after a price refetch.
pub const REFRESH_EVENTS: [&str; 5] = [
    "shoplazza:cart:updated",
    "shoplazza:price:updated",
    "checkout:price:updated",
    "priceUpdated",
    "pricesChange",
];

/// Store object callbacks tried after a price refetch.
pub const STORE_CALLBACKS: [&str; 6] = [
    "refresh",
    "refreshPrices",
    "updatePrices",
    "setPrices",
    "reloadSummary",
    "refreshCart",
];

const DEFAULT_STEP: &str = "contact_information";
const DEFAULT_CURRENCY: &str = "$";

/// Timing knobs for the engine.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Backoff between add-to-cart attempts. Attempts = delays + 1.
    pub retry_delays: Vec<Duration>,
    /// One price refetch per entry, each after its delay.
    pub refresh_delays: Vec<Duration>,
    /// Wait before refetching settings whose protection product is still provisioning.
    pub settings_refetch_delay: Duration,
    /// Verbose logging, in addition to the session's own debug flag.
    pub debug: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            retry_delays: vec![Duration::from_millis(300), Duration::from_millis(900)],
            refresh_delays: vec![Duration::from_millis(400), Duration::from_millis(1200)],
            settings_refetch_delay: Duration::from_secs(2),
            debug: false,
        }
    }
}

impl SyncOptions {
    /// No waiting anywhere: one retry, one refetch.
    pub fn immediate() -> Self {
        Self {
            retry_delays: vec![Duration::ZERO],
            refresh_delays: vec![Duration::ZERO],
            settings_refetch_delay: Duration::ZERO,
            debug: false,
        }
    }
}

/// What one channel did with a toggle.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelOutcome {
    Applied,
    /// Already in the requested state
    Unchanged,
    /// Not attempted
    Skipped(&'static str),
    /// The store does not offer this channel
    Unavailable,
    Failed(CheckoutError),
}

impl ChannelOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ChannelOutcome::Applied)
    }
}

/// Result of one toggle across every channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleReport {
    pub attempt: u64,
    pub enabled: bool,
    pub premium: Premium,
    pub direct_api: ChannelOutcome,
    pub cart: ChannelOutcome,
    pub package: ChannelOutcome,
    pub price_override: ChannelOutcome,
    pub fee_notification: ChannelOutcome,
    /// Some host hook took the refetched prices
    pub refreshed: bool,
}

impl ToggleReport {
    pub fn channels(&self) -> [&ChannelOutcome; 5] {
        [
            &self.direct_api,
            &self.cart,
            &self.package,
            &self.price_override,
            &self.fee_notification,
        ]
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

pub struct SyncEngine<S, H> {
    storefront: S,
    host: H,
    session: Session,
    options: SyncOptions,
}

impl<S: Storefront, H: CheckoutHost> SyncEngine<S, H> {
    pub fn new(storefront: S, host: H, session: Session, options: SyncOptions) -> Self {
        Self {
            storefront,
            host,
            session,
            options,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn storefront(&self) -> &S {
        &self.storefront
    }

    fn debug_enabled(&self) -> bool {
        self.options.debug || self.session.debug
    }

    fn debug_log(&self, message: impl Display) {
        if self.debug_enabled() {
            tracing::debug!(shop = %self.session.shop, attempt = self.session.attempt, "{}", message);
        }
    }

    fn settings(&self) -> Result<&PublicSettings> {
        self.session
            .settings
            .as_ref()
            .ok_or_else(|| CheckoutError::not_configured("Settings not loaded"))
    }

    /// Fetch settings, price the preview and render.
    ///
    /// Returns the report of the automatic toggle when the store turns
    /// protection on by default. A settings failure disables the session.
    pub async fn load(&mut self) -> Result<Option<ToggleReport>> {
        if self.session.state != SyncState::Idle {
            return Err(CheckoutError::invalid_state("Session already loaded"));
        }

        let settings = match self.storefront.fetch_settings(&self.session.shop).await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(shop = %self.session.shop, "Settings not loaded: {}", e);
                self.disable()?;
                return Err(e);
            }
        };
        self.debug_log(format_args!(
            "Settings loaded (activated={}, offer={})",
            settings.activated, settings.offer_at_checkout
        ));

        if !settings.activated || !settings.offer_at_checkout {
            self.session.settings = Some(settings);
            self.disable()?;
            return Ok(None);
        }

        let default_on = settings.default_at_checkout;
        self.session.settings = Some(settings);
        self.session.transition(SyncState::SettingsLoaded)?;

        self.refresh_preview().await;
        self.session.transition(SyncState::Rendered)?;
        self.render();

        let available = self.view().is_some_and(|view| !view.disabled);
        let report = if default_on && available && !self.session.toggle_on {
            Some(self.set_protection(true).await?)
        } else {
            None
        };

        self.refetch_provisioning_settings().await;
        Ok(report)
    }

    fn disable(&mut self) -> Result<()> {
        self.session.transition(SyncState::Disabled)?;
        self.host.render(None);
        Ok(())
    }

    /// An activated store whose protection product is still being created gets
    /// one more settings fetch. Returns true if the refetch brought the ids.
    async fn refetch_provisioning_settings(&mut self) -> bool {
        let provisioning = self
            .session
            .settings
            .as_ref()
            .is_some_and(|s| s.activated && s.protection_product_id().is_none());
        if !provisioning || self.session.settings_refetched {
            return false;
        }
        self.session.settings_refetched = true;

        pause(self.options.settings_refetch_delay).await;
        match self.storefront.fetch_settings(&self.session.shop).await {
            Ok(settings) if settings.protection_ids().is_some() => {
                self.debug_log("Refetched settings: protection product ids now available");
                self.session.settings = Some(settings);
                self.refresh_preview().await;
                self.render();
                true
            }
            Ok(_) => false,
            Err(e) => {
                self.debug_log(format_args!("Settings refetch failed: {}", e));
                false
            }
        }
    }

    /// Recompute the preview premium from the host's current cart.
    async fn refresh_preview(&mut self) {
        let Some(settings) = self.session.settings.clone() else {
            return;
        };

        if !self.host.has_checkout_api() {
            self.session.premium = sample_premium();
            self.debug_log("No checkout API, using sample premium");
            return;
        }

        let products = self.host.products();
        if settings.pricing_mode == PricingMode::PerCategory {
            self.resolve_categories(&products).await;
        }

        let prices = self.host.prices();
        self.session.premium = preview_premium(
            &settings,
            prices.as_ref(),
            &products,
            &self.session.category_map,
        );
        self.debug_log(format_args!("Preview premium {}", self.session.premium));
    }

    /// Look up categories for products this session has not resolved yet.
    /// A failed lookup leaves those products uncategorized, so they price at
    /// the flat percent, and they are tried again on the next refresh.
    async fn resolve_categories(&mut self, products: &[CheckoutProduct]) {
        let mut seen = HashSet::new();
        let ids: Vec<String> = products
            .iter()
            .filter_map(|p| p.product_key())
            .filter(|id| !self.session.categories_resolved.contains(*id) && seen.insert(*id))
            .map(str::to_string)
            .collect();
        if ids.is_empty() {
            return;
        }

        match self
            .storefront
            .fetch_category_map(&self.session.shop, &ids)
            .await
        {
            Ok(map) => {
                self.session.category_map.extend(map);
                self.session.categories_resolved.extend(ids);
            }
            Err(e) => {
                tracing::warn!(shop = %self.session.shop, "Category lookup failed: {}", e);
            }
        }
    }

    /// The widget as it should currently look. `None` when nothing is shown.
    pub fn view(&self) -> Option<WidgetView> {
        if self.session.state == SyncState::Disabled {
            return None;
        }
        let settings = self.session.settings.as_ref()?;
        let premium = self.session.premium;

        Some(WidgetView {
            toggle_on: self.session.toggle_on,
            price_label: if premium.is_zero() {
                "—".to_string()
            } else {
                premium.to_string()
            },
            currency_symbol: self
                .host
                .currency_symbol()
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            disabled: premium.is_zero() && !settings.has_percent(),
            show_brand_logo: settings.enable_powered_by_chubb,
        })
    }

    fn render(&self) {
        self.host.render(self.view().as_ref());
    }

    pub async fn toggle(&mut self) -> Result<ToggleReport> {
        let enabled = !self.session.toggle_on;
        self.set_protection(enabled).await
    }

    /// Turn protection on or off and push the change through every channel.
    pub async fn set_protection(&mut self, enabled: bool) -> Result<ToggleReport> {
        if self.session.state != SyncState::Rendered {
            return Err(CheckoutError::invalid_state(format!(
                "Cannot toggle while {:?}",
                self.session.state
            )));
        }
        if self.view().is_some_and(|view| view.disabled) {
            return Err(CheckoutError::validation(
                "Item protection is not available for this order",
            ));
        }

        self.session.transition(SyncState::Toggling)?;
        self.session.toggle_on = enabled;
        let attempt = self.session.next_attempt();
        self.render();
        self.debug_log(format_args!("Toggle {}", if enabled { "on" } else { "off" }));

        let mut report = self.fan_out(enabled, attempt).await;

        self.session.transition(SyncState::Reconciling)?;
        report.refreshed = self.reconcile().await;
        if !report.refreshed {
            self.host.show_hint(if enabled {
                HintKind::Added
            } else {
                HintKind::Removed
            });
        }

        self.session.transition(SyncState::Rendered)?;
        self.render();
        Ok(report)
    }

    /// The host's prices changed: reprice, and re-apply the fee if protection is on.
    pub async fn on_prices_changed(&mut self) -> Result<Option<ToggleReport>> {
        if self.session.state != SyncState::Rendered {
            return Ok(None);
        }
        self.refresh_preview().await;
        if self.session.toggle_on {
            return self.set_protection(true).await.map(Some);
        }
        self.session.transition(SyncState::Rendered)?;
        self.render();
        Ok(None)
    }

    async fn fan_out(&mut self, enabled: bool, attempt: u64) -> ToggleReport {
        let premium = self.session.premium;

        let direct_api = if !self.host.has_checkout_api() {
            ChannelOutcome::Unavailable
        } else {
            let fees = if enabled {
                vec![FeeLine::protection(premium)]
            } else {
                Vec::new()
            };
            if self.host.set_additional_prices(&fees) {
                ChannelOutcome::Applied
            } else {
                ChannelOutcome::Unavailable
            }
        };

        let (cart, package, price_override, fee_notification) = futures::join!(
            self.sync_cart(enabled),
            self.sync_package(enabled),
            self.override_price(enabled, premium),
            self.notify_fee(enabled, premium),
        );

        if package == ChannelOutcome::Unavailable && !self.session.pkg_missing_warned {
            self.session.pkg_missing_warned = true;
            tracing::warn!(
                shop = %self.session.shop,
                "Checkout package endpoint returned 404; relying on cart and price channels"
            );
        }
        for (name, outcome) in [("cart", &cart), ("price", &price_override)] {
            if let ChannelOutcome::Failed(e) = outcome {
                tracing::warn!(shop = %self.session.shop, attempt, channel = name, "Channel failed: {}", e);
            }
        }

        ToggleReport {
            attempt,
            enabled,
            premium,
            direct_api,
            cart,
            package,
            price_override,
            fee_notification,
            refreshed: false,
        }
    }

    /// Add or remove the protection line, always resolving lines from a live cart read.
    async fn sync_cart(&self, enabled: bool) -> ChannelOutcome {
        let Some((product_id, variant_id)) =
            self.settings().ok().and_then(PublicSettings::protection_ids)
        else {
            if enabled {
                tracing::warn!(
                    shop = %self.session.shop,
                    "Cart channel skipped: no protection product/variant configured"
                );
            }
            return ChannelOutcome::Skipped("no protection product");
        };

        let lines = match self.storefront.get_cart().await {
            Ok(lines) => lines,
            Err(e) => return ChannelOutcome::Failed(e),
        };
        let existing: Vec<_> = lines
            .into_iter()
            .filter(|line| line.product_id.as_deref() == Some(product_id))
            .collect();

        if enabled {
            if !existing.is_empty() {
                self.debug_log("Protection line already in cart");
                return ChannelOutcome::Unchanged;
            }
            return self.add_with_retry(product_id, variant_id).await;
        }

        if existing.is_empty() {
            self.debug_log("No protection line to remove");
            return ChannelOutcome::Unchanged;
        }

        let mut removed = 0;
        for line in existing {
            let Some(line_variant) = line.variant_id else {
                continue;
            };
            let request = CartRemoveRequest {
                id: line.id,
                product_id: product_id.to_string(),
                variant_id: line_variant,
            };
            if let Err(e) = self.storefront.remove_from_cart(&request).await {
                return ChannelOutcome::Failed(e);
            }
            removed += 1;
        }

        if removed > 0 {
            ChannelOutcome::Applied
        } else {
            ChannelOutcome::Unchanged
        }
    }

    async fn add_with_retry(&self, product_id: &str, variant_id: &str) -> ChannelOutcome {
        let request = CartAddRequest::protection(product_id, variant_id);
        let mut delays = self.options.retry_delays.iter();

        loop {
            match self.storefront.add_to_cart(&request).await {
                Ok(()) => {
                    self.debug_log("Protection line added");
                    return ChannelOutcome::Applied;
                }
                Err(e) if e.is_transient() => match delays.next() {
                    Some(delay) => {
                        self.debug_log(format_args!("Add to cart failed, retrying: {}", e));
                        pause(*delay).await;
                    }
                    None => return ChannelOutcome::Failed(e),
                },
                Err(e) => return ChannelOutcome::Failed(e),
            }
        }
    }

    async fn sync_package(&self, enabled: bool) -> ChannelOutcome {
        let Some(order_token) = self.session.order_token.clone() else {
            return ChannelOutcome::Skipped("no order token");
        };
        let payload = PkgSetPayload {
            order_token,
            checked: u8::from(enabled),
        };

        match self.storefront.register_package(&payload).await {
            Ok(()) => ChannelOutcome::Applied,
            Err(e) if e.is_not_found() => ChannelOutcome::Unavailable,
            Err(e) => ChannelOutcome::Failed(e),
        }
    }

    /// Recalculate prices with the fee as an explicit additional price.
    async fn override_price(&self, enabled: bool, premium: Premium) -> ChannelOutcome {
        let Some(payload) = self.price_payload() else {
            return ChannelOutcome::Skipped("no order token");
        };
        let fees = if enabled {
            vec![AdditionalPrice::protection(premium)]
        } else {
            Vec::new()
        };

        match self
            .storefront
            .recalculate_price(&payload.with_additional_prices(fees))
            .await
        {
            Ok(response) => {
                self.host
                    .push_prices(&CheckoutPrices::from_price_response(&response));
                ChannelOutcome::Applied
            }
            Err(e) => ChannelOutcome::Failed(e),
        }
    }

    /// Fire-and-forget notice to the app; failures are only logged in debug.
    async fn notify_fee(&self, enabled: bool, premium: Premium) -> ChannelOutcome {
        let Some(order_token) = self.session.order_token.clone() else {
            return ChannelOutcome::Skipped("no order token");
        };
        let notification = FeeNotification {
            shop: self.session.shop.clone(),
            order_token,
            amount: premium.to_string(),
            label: FEE_LABEL.to_string(),
            enabled,
        };

        match self.storefront.notify_fee(&notification).await {
            Ok(()) => ChannelOutcome::Applied,
            Err(e) => {
                self.debug_log(format_args!("Fee notification failed: {}", e));
                ChannelOutcome::Failed(e)
            }
        }
    }

    fn price_payload(&self) -> Option<PricePayload> {
        let order_token = self.session.order_token.as_deref()?;
        let step = self
            .host
            .step()
            .or_else(|| self.session.step.clone())
            .unwrap_or_else(|| DEFAULT_STEP.to_string());

        let mut payload = PricePayload::new(order_token, step);
        if let Some(tip) = self
            .host
            .prices()
            .map(|p| p.total_tip_received)
            .filter(|tip| !tip.is_empty() && tip != "0")
        {
            payload.total_tip_received = tip;
        }
        payload.shipping_address = self.host.shipping_address().unwrap_or_default();
        payload.shipping_line = self.host.shipping_line();
        Some(payload)
    }

    /// Refetch prices on the configured schedule and offer them to every
    /// refresh hook. Returns true if anything on the page took them.
    async fn reconcile(&self) -> bool {
        let Some(payload) = self.price_payload() else {
            return false;
        };

        let mut responded = false;
        for delay in &self.options.refresh_delays {
            pause(*delay).await;

            let response = match self.storefront.recalculate_price(&payload).await {
                Ok(response) => response,
                Err(e) => {
                    self.debug_log(format_args!("Price refetch failed: {}", e));
                    continue;
                }
            };
            let prices = CheckoutPrices::from_price_response(&response);
            self.debug_log(format_args!("Price refetch total={}", prices.total_price));

            if self.host.push_prices(&prices) {
                responded = true;
            }
            for name in REFRESH_EVENTS {
                if self.host.dispatch_event(name, &prices) {
                    responded = true;
                }
            }
            for name in STORE_CALLBACKS {
                if self.host.call_store_callback(name, &prices) {
                    responded = true;
                }
            }
        }
        responded
    }
}

impl<S, H> std::fmt::Debug for SyncEngine<S, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("session", &self.session)
            .field("options", &self.options)
            .finish()
    }
}
