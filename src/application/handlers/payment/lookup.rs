//! PaymentLookup - resolves a local payment from notification identifiers.

use std::sync::Arc;

use crate::domain::foundation::DomainError;
use crate::domain::payment::{Payment, PaymentProvider};
use crate::ports::PaymentRepository;

/// Tries each candidate, in order, first as a provider-scoped external id and
/// then as an order id of the same provider. The first hit wins.
pub struct PaymentLookup {
    payments: Arc<dyn PaymentRepository>,
}

impl PaymentLookup {
    pub fn new(payments: Arc<dyn PaymentRepository>) -> Self {
        Self { payments }
    }

    pub async fn resolve(
        &self,
        provider: PaymentProvider,
        candidates: &[String],
    ) -> Result<Option<Payment>, DomainError> {
        for candidate in candidates {
            if let Some(payment) = self.payments.find_by_external_id(provider, candidate).await? {
                return Ok(Some(payment));
            }
            if let Some(payment) = self.payments.find_by_order_id(provider, candidate).await? {
                return Ok(Some(payment));
            }
        }
        Ok(None)
    }
}
