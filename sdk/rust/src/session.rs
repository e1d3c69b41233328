//! Per-checkout synchronization state.

use std::collections::{HashMap, HashSet};

use premium::Premium;
use url::Url;

use crate::error::{CheckoutError, Result};
use crate::types::PublicSettings;

/// Where a checkout session is in its lifecycle.
///
/// ```text
/// Idle -> SettingsLoaded -> Rendered -> Toggling -> Reconciling -> Rendered
///    \            \
///     `------------`-> Disabled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    SettingsLoaded,
    Rendered,
    Toggling,
    Reconciling,
    /// Settings missing, inactive, or not offered. Terminal.
    Disabled,
}

impl SyncState {
    pub fn can_transition_to(self, next: SyncState) -> bool {
        use SyncState::*;
        matches!(
            (self, next),
            (Idle, SettingsLoaded)
                | (Idle, Disabled)
                | (SettingsLoaded, Rendered)
                | (SettingsLoaded, Disabled)
                | (Rendered, Rendered)
                | (Rendered, Toggling)
                | (Toggling, Reconciling)
                | (Reconciling, Rendered)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == SyncState::Disabled
    }
}

/// State of one checkout page view. Never persisted.
#[derive(Debug, Clone)]
pub struct Session {
    pub(crate) shop: String,
    pub(crate) order_token: Option<String>,
    pub(crate) step: Option<String>,
    pub(crate) debug: bool,
    pub(crate) state: SyncState,
    pub(crate) toggle_on: bool,
    pub(crate) premium: Premium,
    /// Only used to correlate log lines
    pub(crate) attempt: u64,
    pub(crate) settings: Option<PublicSettings>,
    pub(crate) category_map: HashMap<String, String>,
    /// Product ids already sent to the category lookup, mapped or not.
    pub(crate) categories_resolved: HashSet<String>,
    pub(crate) pkg_missing_warned: bool,
    pub(crate) settings_refetched: bool,
}

impl Session {
    pub fn new(shop: impl Into<String>) -> Self {
        Self {
            shop: shop.into(),
            order_token: None,
            step: None,
            debug: false,
            state: SyncState::Idle,
            toggle_on: false,
            premium: Premium::ZERO,
            attempt: 0,
            settings: None,
            category_map: HashMap::new(),
            categories_resolved: HashSet::new(),
            pkg_missing_warned: false,
            settings_refetched: false,
        }
    }

    /// Build a session from the checkout page URL.
    ///
    /// The order token is the path segment after `/checkout/`. `?step=` gives
    /// the checkout step; `?cd_debug=1` or a `#cd_debug` fragment turns on
    /// verbose logging.
    pub fn from_checkout_url(shop: impl Into<String>, checkout_url: &str) -> Result<Self> {
        let url = Url::parse(checkout_url)
            .map_err(|_| CheckoutError::validation("Invalid checkout URL"))?;

        let mut session = Self::new(shop);
        session.order_token = url.path_segments().and_then(|segments| {
            segments
                .skip_while(|segment| *segment != "checkout")
                .nth(1)
                .filter(|token| !token.is_empty())
                .map(str::to_string)
        });

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "step" if !value.is_empty() => session.step = Some(value.into_owned()),
                "cd_debug" if value == "1" => session.debug = true,
                _ => {}
            }
        }
        if url.fragment() == Some("cd_debug") {
            session.debug = true;
        }

        Ok(session)
    }

    pub fn with_order_token(mut self, token: impl Into<String>) -> Self {
        self.order_token = Some(token.into());
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub(crate) fn transition(&mut self, next: SyncState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(CheckoutError::invalid_state(format!(
                "Cannot move from {:?} to {:?}",
                self.state, next
            )));
        }
        if self.debug {
            tracing::debug!(shop = %self.shop, from = ?self.state, to = ?next, "Session state change");
        }
        self.state = next;
        Ok(())
    }

    pub(crate) fn next_attempt(&mut self) -> u64 {
        self.attempt += 1;
        self.attempt
    }

    pub fn shop(&self) -> &str {
        &self.shop
    }

    pub fn order_token(&self) -> Option<&str> {
        self.order_token.as_deref()
    }

    pub fn step(&self) -> Option<&str> {
        self.step.as_deref()
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn toggle_on(&self) -> bool {
        self.toggle_on
    }

    pub fn premium(&self) -> Premium {
        self.premium
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub fn settings(&self) -> Option<&PublicSettings> {
        self.settings.as_ref()
    }

    pub fn category_map(&self) -> &HashMap<String, String> {
        &self.category_map
    }

    /// Whether the missing checkout package has already been reported.
    pub fn pkg_missing_warned(&self) -> bool {
        self.pkg_missing_warned
    }
}
