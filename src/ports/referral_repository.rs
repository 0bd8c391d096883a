//! Referral repository port.

use async_trait::async_trait;

use crate::domain::foundation::{ClientId, DomainError};
use crate::domain::referral::ReferralCredit;

/// Result of recording a referral credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditResult {
    /// Row inserted and referrer balance incremented.
    Inserted,
    /// A credit for the same (referrer, payment, level) already exists; nothing changed.
    AlreadyCredited,
}

#[async_trait]
pub trait ReferralRepository: Send + Sync {
    /// The client who referred `client_id`, if any.
    async fn find_referrer(&self, client_id: &ClientId) -> Result<Option<ClientId>, DomainError>;

    /// Inserts the credit if absent and, only then, increments the referrer's
    /// balance by the credit amount. Both happen in one transaction.
    async fn record_credit(&self, credit: &ReferralCredit) -> Result<CreditResult, DomainError>;
}
