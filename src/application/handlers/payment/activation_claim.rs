//! ActivationClaimLock - at-most-once fulfillment per payment.
//!
//! The claim is taken with a version-guarded write of the activation keys:
//! load the payment, decide with [`Payment::claim_activation`], then
//! compare-and-set against the version that was read. Only the writer whose
//! CAS succeeds proceeds to fulfillment. A lost CAS reloads and decides again,
//! at most [`MAX_CAS_RETRIES`] times.

use std::sync::Arc;

use chrono::Duration;

use crate::domain::foundation::{DomainError, ErrorCode, PaymentId, Timestamp};
use crate::domain::payment::{ActivationState, ClaimRejection, ClaimTicket, Payment, PaymentError};
use crate::ports::PaymentRepository;

const MAX_CAS_RETRIES: u32 = 3;

/// A claim this process holds. The payment reflects the claimed state.
#[derive(Debug, Clone)]
pub struct HeldClaim {
    pub ticket: ClaimTicket,
    pub payment: Payment,
}

#[derive(Debug, Clone)]
pub enum ClaimDecision {
    Claimed(HeldClaim),
    Rejected(ClaimRejection),
    /// Every CAS attempt lost to a concurrent writer.
    Contended,
}

/// Result of writing the final state of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    /// The claim went stale and another attempt reclaimed it; left as is.
    ClaimLost,
    /// Already marked applied by someone else.
    AlreadyApplied,
}

pub struct ActivationClaimLock {
    payments: Arc<dyn PaymentRepository>,
    stale_after: Duration,
}

impl ActivationClaimLock {
    pub fn new(payments: Arc<dyn PaymentRepository>, stale_after: Duration) -> Self {
        Self {
            payments,
            stale_after,
        }
    }

    pub async fn claim(&self, payment_id: &PaymentId) -> Result<ClaimDecision, DomainError> {
        for _ in 0..MAX_CAS_RETRIES {
            let payment = self.load(payment_id).await?;
            let now = Timestamp::now();

            let next = match payment.claim_activation(now, self.stale_after) {
                Ok(next) => next,
                Err(rejection) => return Ok(ClaimDecision::Rejected(rejection)),
            };

            if let Some(version) = self
                .payments
                .compare_and_set_activation(payment_id, payment.version, &next)
                .await?
            {
                if let Some(stale) = payment.activation().in_progress_at {
                    tracing::warn!(
                        payment_id = %payment_id,
                        stale_since = %stale,
                        attempt = next.attempts,
                        "Reclaimed abandoned activation claim"
                    );
                }

                let ticket = ClaimTicket {
                    payment_id: *payment_id,
                    claimed_at: now,
                    attempt: next.attempts,
                };
                let mut payment = payment;
                payment.metadata = payment.metadata.with_activation(next);
                payment.version = version;

                return Ok(ClaimDecision::Claimed(HeldClaim { ticket, payment }));
            }

            tracing::debug!(payment_id = %payment_id, "Activation claim CAS lost, reloading");
        }

        Ok(ClaimDecision::Contended)
    }

    /// Marks fulfillment done. Written even if the claim went stale, since
    /// the fulfillment did happen.
    pub async fn complete(&self, claim: &HeldClaim) -> Result<ReleaseOutcome, DomainError> {
        self.release(claim, |state| state.completed(Timestamp::now()), false)
            .await
    }

    /// Drops the claim after a failed attempt, keeping the counter and noting
    /// the error. Does nothing if another attempt has since reclaimed.
    pub async fn release_failure(
        &self,
        claim: &HeldClaim,
        error: &str,
    ) -> Result<ReleaseOutcome, DomainError> {
        self.release(claim, |state| state.released_with_error(error), true)
            .await
    }

    /// Like [`release_failure`](Self::release_failure), also recording the
    /// proxy slots that exist so far.
    pub async fn release_partial(
        &self,
        claim: &HeldClaim,
        error: &str,
        proxy_slots: &[String],
    ) -> Result<ReleaseOutcome, DomainError> {
        self.release(
            claim,
            |state| {
                state
                    .released_with_error(error)
                    .with_proxy_slots(proxy_slots.to_vec())
            },
            true,
        )
        .await
    }

    async fn release<F>(
        &self,
        claim: &HeldClaim,
        next_state: F,
        require_ownership: bool,
    ) -> Result<ReleaseOutcome, DomainError>
    where
        F: Fn(&ActivationState) -> ActivationState,
    {
        let payment_id = &claim.ticket.payment_id;
        let mut current = claim.payment.clone();

        for attempt in 0..MAX_CAS_RETRIES {
            if attempt > 0 {
                current = self.load(payment_id).await?;
            }

            let state = current.activation();
            if state.is_applied() {
                return Ok(ReleaseOutcome::AlreadyApplied);
            }
            if require_ownership && !state.is_held_by(&claim.ticket) {
                tracing::warn!(
                    payment_id = %payment_id,
                    attempt = claim.ticket.attempt,
                    "Activation claim was reclaimed before release"
                );
                return Ok(ReleaseOutcome::ClaimLost);
            }

            let next = next_state(state);
            if self
                .payments
                .compare_and_set_activation(payment_id, current.version, &next)
                .await?
                .is_some()
            {
                return Ok(ReleaseOutcome::Released);
            }
        }

        Err(DomainError::new(
            ErrorCode::ConcurrencyConflict,
            format!("Could not release activation claim for payment {}", payment_id),
        ))
    }

    async fn load(&self, payment_id: &PaymentId) -> Result<Payment, DomainError> {
        self.payments
            .find_by_id(payment_id)
            .await?
            .ok_or_else(|| PaymentError::not_found(*payment_id).into())
    }
}
