//! Extractors that reject with `AppError` JSON instead of axum's plain text.
//!
//! The pricing callback and the storefront endpoints are called by machines
//! that parse the error body, so every rejection keeps the same shape.

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::{AppError, msg};
use crate::util::{MAX_SHOP_LEN, normalize_shop_domain};

/// JSON extractor that returns `AppError` on failure.
///
/// Use this instead of `axum::Json` to get JSON error responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let result = axum::Json::<T>::from_request(req, state).await?;
        Ok(Json(result.0))
    }
}

impl<T> std::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> std::ops::DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Query extractor that returns `AppError` on failure.
///
/// Use this instead of `axum::extract::Query` to get JSON error responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

impl<S, T> FromRequestParts<S> for Query<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let result = axum::extract::Query::<T>::from_request_parts(parts, state).await?;
        Ok(Query(result.0))
    }
}

impl<T> std::ops::Deref for Query<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> std::ops::DerefMut for Query<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// The `shop` query parameter, length-checked and normalized.
///
/// Rejects with 400 when the parameter is missing, blank, or longer than
/// 256 characters.
#[derive(Debug, Clone)]
pub struct ShopParam(pub String);

impl<S> FromRequestParts<S> for ShopParam
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        #[derive(Deserialize)]
        struct Params {
            shop: Option<String>,
        }

        let Query(params) = Query::<Params>::from_request_parts(parts, state).await?;
        let raw = params.shop.unwrap_or_default();
        if raw.chars().count() > MAX_SHOP_LEN {
            return Err(AppError::BadRequest(msg::SHOP_TOO_LONG.into()));
        }

        let shop = normalize_shop_domain(&raw);
        if shop.is_empty() {
            return Err(AppError::BadRequest(msg::SHOP_REQUIRED.into()));
        }
        Ok(ShopParam(shop))
    }
}
