//! Error types for the checkout engine

use thiserror::Error;

/// Error codes for checkout operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutErrorCode {
    /// Request never produced a response
    Network,
    /// Non-success HTTP status
    Http,
    /// Response body was not the expected shape
    Decode,
    /// Invalid input
    Validation,
    /// Settings or ids the operation needs are missing
    NotConfigured,
    /// Operation not allowed in the session's current state
    InvalidState,
}

/// Checkout engine error
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct CheckoutError {
    /// Error code
    pub code: CheckoutErrorCode,
    /// Human-readable message
    pub message: String,
    /// HTTP status code (if applicable)
    pub status: Option<u16>,
}

impl CheckoutError {
    pub fn new(code: CheckoutErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(code: CheckoutErrorCode, message: impl Into<String>, status: u16) -> Self {
        Self {
            code,
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(CheckoutErrorCode::Network, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(CheckoutErrorCode::Decode, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(CheckoutErrorCode::Validation, message)
    }

    pub fn not_configured(message: impl Into<String>) -> Self {
        Self::new(CheckoutErrorCode::NotConfigured, message)
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(CheckoutErrorCode::InvalidState, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    /// Worth retrying: no response at all, rate limiting, or a server error.
    pub fn is_transient(&self) -> bool {
        match self.code {
            CheckoutErrorCode::Network => true,
            CheckoutErrorCode::Http => matches!(self.status, Some(429) | Some(500..=599)),
            _ => false,
        }
    }
}

/// Map HTTP status codes to error codes
pub fn map_status_to_error_code(status: u16) -> CheckoutErrorCode {
    match status {
        400 | 422 => CheckoutErrorCode::Validation,
        _ => CheckoutErrorCode::Http,
    }
}

/// Result type for checkout operations
pub type Result<T> = std::result::Result<T, CheckoutError>;
