//! Payment aggregate.
//!
//! A payment is created PENDING by the (external) checkout flow and moved to
//! PAID or FAILED by webhook reconciliation. Its subject never changes after
//! creation.
//!
//! # Design Decisions
//!
//! - **Decimal money**: amounts are `rust_decimal::Decimal`, never floats
//! - **Explicit version**: every write bumps `version`; metadata writes are
//!   conditional on it
//! - **Claim in metadata**: activation bookkeeping is typed
//!   ([`ActivationState`]) but persisted inside the metadata blob

use chrono::Duration;
use rust_decimal::Decimal;

use crate::domain::foundation::{
    ClientId, OrderId, PaymentId, StateMachine, Timestamp, ValidationError,
};

use super::{
    ActivationState, BalanceCredit, ClaimRejection, NotApplicableReason, PaymentError,
    PaymentMetadata, PaymentProvider, PaymentStatus, PaymentSubject, PaymentTransition,
};

/// Payment record.
///
/// # Invariants
///
/// - `status` leaves PENDING at most once
/// - `paid_at` is set iff `status == Paid`
/// - `amount > 0`
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub id: PaymentId,
    pub client_id: ClientId,
    pub provider: PaymentProvider,

    /// Provider transaction id; unknown until the provider reports it.
    pub external_id: Option<String>,

    /// Internally generated correlation token shown to the provider.
    pub order_id: OrderId,

    pub amount: Decimal,
    pub currency: String,
    pub subject: PaymentSubject,
    pub status: PaymentStatus,
    pub metadata: PaymentMetadata,
    pub created_at: Timestamp,
    pub paid_at: Option<Timestamp>,

    /// Optimistic concurrency token.
    pub version: i64,
}

/// Input for creating a pending payment.
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub client_id: ClientId,
    pub provider: PaymentProvider,
    pub order_id: OrderId,
    pub external_id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub subject: PaymentSubject,
}

impl Payment {
    /// Creates a PENDING payment.
    pub fn new_pending(input: NewPayment) -> Result<Self, PaymentError> {
        if input.amount <= Decimal::ZERO {
            return Err(ValidationError::out_of_range("amount", "must be positive").into());
        }
        let currency = input.currency.trim().to_uppercase();
        if currency.is_empty() {
            return Err(ValidationError::empty_field("currency").into());
        }

        let mut metadata = PaymentMetadata::default();
        if let PaymentSubject::ExtraOption(option) = &input.subject {
            metadata.extra_option = Some(option.clone());
        }

        Ok(Self {
            id: PaymentId::new(),
            client_id: input.client_id,
            provider: input.provider,
            external_id: input.external_id,
            order_id: input.order_id,
            amount: input.amount,
            currency,
            subject: input.subject,
            status: PaymentStatus::Pending,
            metadata,
            created_at: Timestamp::now(),
            paid_at: None,
            version: 0,
        })
    }

    pub fn activation(&self) -> &ActivationState {
        &self.metadata.activation
    }

    /// Decides whether a claim may be taken at `now` and returns the new
    /// activation state if so. Pure; the caller persists it conditionally.
    pub fn claim_activation(
        &self,
        now: Timestamp,
        stale_after: Duration,
    ) -> Result<ActivationState, ClaimRejection> {
        if self.status != PaymentStatus::Paid {
            return Err(ClaimRejection::NotApplicable(NotApplicableReason::NotPaid));
        }
        if !self.subject.requires_activation() {
            return Err(ClaimRejection::NotApplicable(NotApplicableReason::TopUpOnly));
        }
        self.activation().claim(now, stale_after)
    }

    /// PENDING → PAID request. Top-ups carry their balance credit so storage
    /// applies both in one transaction.
    pub fn paid_transition(
        &self,
        transaction_id: Option<String>,
        now: Timestamp,
    ) -> Result<PaymentTransition, PaymentError> {
        self.check_transition(PaymentStatus::Paid)?;

        let balance_credit = match self.subject {
            PaymentSubject::TopUp => Some(BalanceCredit {
                client_id: self.client_id,
                amount: self.amount,
            }),
            _ => None,
        };

        Ok(PaymentTransition {
            payment_id: self.id,
            target: PaymentStatus::Paid,
            transaction_id,
            at: now,
            balance_credit,
        })
    }

    /// PENDING → FAILED request.
    pub fn failed_transition(
        &self,
        transaction_id: Option<String>,
        now: Timestamp,
    ) -> Result<PaymentTransition, PaymentError> {
        self.check_transition(PaymentStatus::Failed)?;

        Ok(PaymentTransition {
            payment_id: self.id,
            target: PaymentStatus::Failed,
            transaction_id,
            at: now,
            balance_credit: None,
        })
    }

    fn check_transition(&self, target: PaymentStatus) -> Result<(), PaymentError> {
        if self.status.can_transition_to(&target) {
            Ok(())
        } else {
            Err(PaymentError::invalid_transition(self.status, target))
        }
    }
}
