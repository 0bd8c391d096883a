//! Canonical notification.

use rust_decimal::Decimal;
use serde_json::Value;

use crate::domain::payment::PaymentProvider;

use super::WebhookError;

/// Coarse meaning of a provider status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusBucket {
    /// Money arrived; move to PAID and fulfill.
    Success,
    /// Payment definitively failed; move to FAILED if still pending.
    Failure,
    /// Intermediate or unknown status; acknowledge and do nothing.
    Ignored,
}

impl StatusBucket {
    /// Buckets an upper-cased status against fixed sets.
    pub fn classify(status: &str, success: &[&str], failure: &[&str]) -> Self {
        let upper = status.trim().to_uppercase();
        if success.contains(&upper.as_str()) {
            StatusBucket::Success
        } else if failure.contains(&upper.as_str()) {
            StatusBucket::Failure
        } else {
            StatusBucket::Ignored
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusBucket::Success => "success",
            StatusBucket::Failure => "failure",
            StatusBucket::Ignored => "ignored",
        }
    }
}

/// Provider-independent view of one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedNotification {
    pub provider: PaymentProvider,
    /// Upper-cased provider status.
    pub status: String,
    pub bucket: StatusBucket,
    /// Provider transaction id, when the payload carries one.
    pub transaction_id: Option<String>,
    /// Identifiers to try against local payments, most specific first.
    pub correlation_candidates: Vec<String>,
    /// Amount the provider reports as received, when it reports one.
    pub paid_amount: Option<Decimal>,
}

/// Pure extraction of a [`NormalizedNotification`] from a provider body.
///
/// Form-encoded bodies are passed as a flat JSON object of strings.
pub trait NotificationNormalizer: Send + Sync {
    fn provider(&self) -> PaymentProvider;

    fn normalize(&self, body: &Value) -> Result<NormalizedNotification, WebhookError>;
}

/// Shared guard: the body must be a non-empty JSON object.
pub(super) fn require_object(body: &Value) -> Result<(), WebhookError> {
    match body.as_object() {
        Some(map) if !map.is_empty() => Ok(()),
        Some(_) => Err(WebhookError::ParseError("empty body".to_string())),
        None => Err(WebhookError::ParseError("body is not an object".to_string())),
    }
}

/// Parses a decimal amount from a string such as `"500.00"`.
pub(super) fn parse_amount(raw: Option<String>) -> Option<Decimal> {
    raw.and_then(|s| s.replace(',', ".").parse::<Decimal>().ok())
}
