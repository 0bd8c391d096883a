//! Payment repository port.
//!
//! Every write is conditional. The payment row is the lock object for
//! reconciliation, so implementations must never overwrite the full row or
//! the full metadata blob from a stale read.
//!
//! # Contract
//!
//! - `try_transition` updates only where `status = 'pending'` and reports the
//!   number of rows changed (0 or 1). A balance credit attached to the
//!   transition is applied in the same transaction, and only when the row
//!   changed.
//! - `compare_and_set_activation` replaces exactly the activation keys of the
//!   metadata, and only when the stored `version` equals `expected_version`.
//!   Other metadata keys are preserved.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, PaymentId, Timestamp};
use crate::domain::payment::{ActivationState, Payment, PaymentProvider, PaymentTransition};

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError>;

    /// Provider-scoped lookup by provider transaction id.
    async fn find_by_external_id(
        &self,
        provider: PaymentProvider,
        external_id: &str,
    ) -> Result<Option<Payment>, DomainError>;

    /// Lookup by internal order id, restricted to payments of `provider`.
    async fn find_by_order_id(
        &self,
        provider: PaymentProvider,
        order_id: &str,
    ) -> Result<Option<Payment>, DomainError>;

    /// Conditional PENDING → target update. Returns rows changed.
    async fn try_transition(&self, transition: &PaymentTransition) -> Result<u64, DomainError>;

    /// Version-guarded write of the activation keys.
    ///
    /// Returns the new version on success, `None` when the version moved.
    async fn compare_and_set_activation(
        &self,
        id: &PaymentId,
        expected_version: i64,
        state: &ActivationState,
    ) -> Result<Option<i64>, DomainError>;

    /// PAID payments with a product subject and no `activationAppliedAt`,
    /// paid before `paid_before`, oldest first.
    async fn find_unfulfilled_paid(
        &self,
        paid_before: Timestamp,
        limit: u32,
    ) -> Result<Vec<Payment>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn PaymentRepository) {}
    }
}
