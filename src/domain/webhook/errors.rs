//! Webhook error types.
//!
//! Providers retry anything that is not a 2xx, so almost every condition is
//! acknowledged with 200. Only authenticity failures are refused.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature or shared-secret check failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The provider is not configured on this instance.
    #[error("Provider not configured: {0}")]
    ProviderDisabled(&'static str),

    /// Body is empty or not parseable.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required field missing from webhook payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),
}

impl WebhookError {
    /// Status returned to the provider.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::ProviderDisabled(_) => StatusCode::NOT_FOUND,
            WebhookError::ParseError(_) | WebhookError::MissingField(_) => StatusCode::OK,
        }
    }

    /// Short label for the delivery journal.
    pub fn label(&self) -> &'static str {
        match self {
            WebhookError::InvalidSignature => "invalid_signature",
            WebhookError::ProviderDisabled(_) => "provider_disabled",
            WebhookError::ParseError(_) | WebhookError::MissingField(_) => "malformed",
        }
    }
}
