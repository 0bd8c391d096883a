//! Referral credit row.

use rust_decimal::Decimal;

use crate::domain::foundation::{ClientId, PaymentId, ReferralCreditId, Timestamp};

use super::ReferralLevel;

/// One reward paid to `referrer_id` for `payment_id` at `level`.
///
/// At most one row exists per `(referrer_id, payment_id, level)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralCredit {
    pub id: ReferralCreditId,
    pub referrer_id: ClientId,
    /// Client whose payment produced the reward.
    pub source_client_id: ClientId,
    pub payment_id: PaymentId,
    pub level: ReferralLevel,
    pub amount: Decimal,
    pub created_at: Timestamp,
}

impl ReferralCredit {
    pub fn new(
        referrer_id: ClientId,
        source_client_id: ClientId,
        payment_id: PaymentId,
        level: ReferralLevel,
        amount: Decimal,
    ) -> Self {
        Self {
            id: ReferralCreditId::new(),
            referrer_id,
            source_client_id,
            payment_id,
            level,
            amount,
            created_at: Timestamp::now(),
        }
    }

    /// Uniqueness key.
    pub fn key(&self) -> (ClientId, PaymentId, ReferralLevel) {
        (self.referrer_id, self.payment_id, self.level)
    }
}
