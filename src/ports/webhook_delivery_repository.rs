//! WebhookDeliveryRepository port - journal of inbound provider notifications.
//!
//! Providers deliver at least once and sometimes many times; the journal keeps
//! one row per delivery with the outcome reached, for operator visibility.
//! It is write-only from the reconciliation path and never gates processing:
//! idempotency comes from the conditional writes on the payment row.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, PaymentId, Timestamp};
use crate::domain::payment::PaymentProvider;

/// One received notification and what became of it.
#[derive(Debug, Clone)]
pub struct WebhookDeliveryRecord {
    pub id: Uuid,
    pub provider: PaymentProvider,
    pub transaction_id: Option<String>,

    /// Resolved local payment, when lookup succeeded.
    pub payment_id: Option<PaymentId>,

    /// Outcome label, e.g. "fulfilled", "duplicate", "not_found".
    pub outcome: String,

    /// Error text or reason accompanying the outcome.
    pub detail: Option<String>,

    /// Original body for debugging.
    pub payload: Value,

    pub received_at: Timestamp,
}

impl WebhookDeliveryRecord {
    pub fn new(provider: PaymentProvider, outcome: impl Into<String>, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider,
            transaction_id: None,
            payment_id: None,
            outcome: outcome.into(),
            detail: None,
            payload,
            received_at: Timestamp::now(),
        }
    }

    pub fn with_transaction_id(mut self, transaction_id: Option<String>) -> Self {
        self.transaction_id = transaction_id;
        self
    }

    pub fn with_payment(mut self, payment_id: PaymentId) -> Self {
        self.payment_id = Some(payment_id);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[async_trait]
pub trait WebhookDeliveryRepository: Send + Sync {
    async fn record(&self, record: WebhookDeliveryRecord) -> Result<(), DomainError>;

    /// Delete records received before `timestamp`.
    ///
    /// Returns the number of records deleted.
    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, DomainError>;
}
