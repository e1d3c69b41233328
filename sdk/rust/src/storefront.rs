//! HTTP surfaces the engine calls: the app backend and the store's own
//! cart and checkout endpoints.

use std::collections::HashMap;

use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::{CheckoutError, Result, map_status_to_error_code};
use crate::types::{
    CartAddRequest, CartLine, CartRemoveRequest, CartResponse, FeeNotification, PkgSetPayload,
    PricePayload, PublicSettings,
};

/// Network operations the engine depends on.
///
/// Implemented over HTTP by [`HttpStorefront`]; tests and embedders may
/// provide their own.
#[allow(async_fn_in_trait)]
pub trait Storefront {
    async fn fetch_settings(&self, shop: &str) -> Result<PublicSettings>;

    async fn fetch_category_map(
        &self,
        shop: &str,
        product_ids: &[String],
    ) -> Result<HashMap<String, String>>;

    async fn notify_fee(&self, notification: &FeeNotification) -> Result<()>;

    /// Current cart lines, read live from the store.
    async fn get_cart(&self) -> Result<Vec<CartLine>>;

    async fn add_to_cart(&self, request: &CartAddRequest) -> Result<()>;

    async fn remove_from_cart(&self, request: &CartRemoveRequest) -> Result<()>;

    /// Legacy checkout package toggle. 404s on stores without a registered package.
    async fn register_package(&self, payload: &PkgSetPayload) -> Result<()>;

    /// Ask the store to recompute checkout prices. Returns the raw response.
    async fn recalculate_price(&self, payload: &PricePayload) -> Result<Value>;
}

/// Storefront over HTTP.
pub struct HttpStorefront {
    app_base_url: String,
    store_origin: String,
    http: HttpClient,
}

fn normalize_base(raw: &str, what: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    Url::parse(trimmed).map_err(|_| CheckoutError::validation(format!("Invalid {}", what)))?;
    Ok(trimmed.to_string())
}

impl HttpStorefront {
    /// # Arguments
    /// * `app_base_url` - Where the item protection app is served
    /// * `store_origin` - Origin of the store's checkout page
    pub fn new(app_base_url: &str, store_origin: &str) -> Result<Self> {
        let app_base_url = normalize_base(app_base_url, "app base URL")?;
        let store_origin = normalize_base(store_origin, "store origin")?;

        let http = HttpClient::builder()
            .user_agent(concat!("item-protection-checkout/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CheckoutError::network(e.to_string()))?;

        Ok(Self {
            app_base_url,
            store_origin,
            http,
        })
    }

    fn cart_url(&self) -> String {
        format!("{}/api/cart", self.store_origin)
    }

    /// Cart URL for one variant, with the id percent-encoded as a path segment.
    fn variant_url(&self, variant_id: &str) -> Result<Url> {
        let mut url =
            Url::parse(&self.cart_url()).map_err(|e| CheckoutError::validation(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| CheckoutError::validation("Store origin cannot carry a path"))?
            .push(variant_id);
        Ok(url)
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, url: &str, body: &B) -> Result<T> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| CheckoutError::network(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Turn a non-success status into an error carrying the server's message.
    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status().as_u16();

        if response.status().is_success() {
            return Ok(response);
        }

        #[derive(Deserialize)]
        struct ErrorResponse {
            error: Option<String>,
            details: Option<String>,
        }

        let error_body: ErrorResponse = response.json().await.unwrap_or(ErrorResponse {
            error: None,
            details: None,
        });

        let message = match (&error_body.error, &error_body.details) {
            (Some(err), Some(details)) => format!("{}: {}", err, details),
            (Some(err), None) => err.clone(),
            (None, Some(details)) => details.clone(),
            (None, None) => format!("Request failed: {}", status),
        };

        Err(CheckoutError::with_status(
            map_status_to_error_code(status),
            message,
            status,
        ))
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        self.check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| CheckoutError::decode(e.to_string()))
    }
}

impl Storefront for HttpStorefront {
    async fn fetch_settings(&self, shop: &str) -> Result<PublicSettings> {
        let response = self
            .http
            .get(format!("{}/public-settings", self.app_base_url))
            .query(&[("shop", shop)])
            .send()
            .await
            .map_err(|e| CheckoutError::network(e.to_string()))?;

        self.handle_response(response).await
    }

    async fn fetch_category_map(
        &self,
        shop: &str,
        product_ids: &[String],
    ) -> Result<HashMap<String, String>> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let response = self
            .http
            .get(format!("{}/product-categories", self.app_base_url))
            .query(&[("shop", shop), ("productIds", product_ids.join(",").as_str())])
            .send()
            .await
            .map_err(|e| CheckoutError::network(e.to_string()))?;

        self.handle_response(response).await
    }

    async fn notify_fee(&self, notification: &FeeNotification) -> Result<()> {
        let _: Value = self
            .post(&format!("{}/apply-fee", self.app_base_url), notification)
            .await?;
        Ok(())
    }

    async fn get_cart(&self) -> Result<Vec<CartLine>> {
        let response = self
            .http
            .get(self.cart_url())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| CheckoutError::network(e.to_string()))?;

        let body: CartResponse = self.handle_response(response).await?;
        Ok(body.cart.map(|cart| cart.line_items).unwrap_or_default())
    }

    async fn add_to_cart(&self, request: &CartAddRequest) -> Result<()> {
        let response = self
            .http
            .post(self.cart_url())
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| CheckoutError::network(e.to_string()))?;

        self.check_status(response).await?;
        Ok(())
    }

    async fn remove_from_cart(&self, request: &CartRemoveRequest) -> Result<()> {
        let response = self
            .http
            .delete(self.variant_url(&request.variant_id)?)
            .json(request)
            .send()
            .await
            .map_err(|e| CheckoutError::network(e.to_string()))?;

        self.check_status(response).await?;
        Ok(())
    }

    async fn register_package(&self, payload: &PkgSetPayload) -> Result<()> {
        let response = self
            .http
            .post(format!("{}/api/checkout/pkg_set", self.store_origin))
            .json(payload)
            .send()
            .await
            .map_err(|e| CheckoutError::network(e.to_string()))?;

        self.check_status(response).await?;
        Ok(())
    }

    async fn recalculate_price(&self, payload: &PricePayload) -> Result<Value> {
        self.post(&format!("{}/api/checkout/price", self.store_origin), payload)
            .await
    }
}

impl std::fmt::Debug for HttpStorefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStorefront")
            .field("app_base_url", &self.app_base_url)
            .field("store_origin", &self.store_origin)
            .finish()
    }
}
