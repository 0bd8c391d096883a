//! Conditional status changes.

use rust_decimal::Decimal;

use crate::domain::foundation::{ClientId, PaymentId, Timestamp};

use super::PaymentStatus;

/// Balance increment applied in the same transaction as a top-up's PAID move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceCredit {
    pub client_id: ClientId,
    pub amount: Decimal,
}

/// Request to move a payment out of PENDING.
///
/// Storage applies it as a compare-and-swap on `status = 'pending'`, so
/// racing deliveries see exactly one winner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentTransition {
    pub payment_id: PaymentId,
    pub target: PaymentStatus,
    /// Provider transaction id, stored as `external_id` when not yet set.
    pub transaction_id: Option<String>,
    pub at: Timestamp,
    pub balance_credit: Option<BalanceCredit>,
}

/// Result of applying a [`PaymentTransition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// This call moved the payment.
    Changed,
    /// The payment had already left PENDING; nothing was written.
    AlreadyTerminal,
}

impl TransitionOutcome {
    pub fn from_rows(rows_affected: u64) -> Self {
        if rows_affected > 0 {
            TransitionOutcome::Changed
        } else {
            TransitionOutcome::AlreadyTerminal
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, TransitionOutcome::Changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_map_to_outcome() {
        assert_eq!(TransitionOutcome::from_rows(1), TransitionOutcome::Changed);
        assert_eq!(TransitionOutcome::from_rows(0), TransitionOutcome::AlreadyTerminal);
        assert!(!TransitionOutcome::AlreadyTerminal.changed());
    }
}
