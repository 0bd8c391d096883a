//! FulfillPaymentHandler - claim, dispatch, release.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, PaymentId};
use crate::domain::fulfillment::{FulfillmentOutcome, FulfillmentReceipt};
use crate::domain::payment::{ClaimRejection, Payment};

use super::{
    ActivationClaimLock, ClaimDecision, FulfillmentDispatcher, NotificationSink, ReferralCascade,
};

/// Command to fulfill one PAID payment.
#[derive(Debug, Clone)]
pub struct FulfillPaymentCommand {
    pub payment_id: PaymentId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FulfillPaymentResult {
    /// This call performed the fulfillment.
    Fulfilled(FulfillmentReceipt),
    /// Fulfillment had completed earlier.
    AlreadyApplied,
    /// Another attempt holds a fresh claim, or every CAS lost.
    InProgress,
    /// Not PAID, or a top-up.
    NotApplicable,
    /// The attempt failed; the claim was released for a later retry.
    Failed { error: String },
}

/// Runs fulfillment for a PAID payment at most once, then the referral
/// cascade and client notification.
pub struct FulfillPaymentHandler {
    claims: ActivationClaimLock,
    dispatcher: FulfillmentDispatcher,
    referrals: Arc<ReferralCascade>,
    notifications: NotificationSink,
}

impl FulfillPaymentHandler {
    pub fn new(
        claims: ActivationClaimLock,
        dispatcher: FulfillmentDispatcher,
        referrals: Arc<ReferralCascade>,
        notifications: NotificationSink,
    ) -> Self {
        Self {
            claims,
            dispatcher,
            referrals,
            notifications,
        }
    }

    pub async fn handle(
        &self,
        cmd: FulfillPaymentCommand,
    ) -> Result<FulfillPaymentResult, DomainError> {
        let claim = match self.claims.claim(&cmd.payment_id).await? {
            ClaimDecision::Claimed(claim) => claim,
            ClaimDecision::Rejected(ClaimRejection::AlreadyApplied { .. }) => {
                return Ok(FulfillPaymentResult::AlreadyApplied)
            }
            ClaimDecision::Rejected(ClaimRejection::InProgress { since }) => {
                tracing::info!(
                    payment_id = %cmd.payment_id,
                    since = %since,
                    "Activation in progress elsewhere, deferring"
                );
                return Ok(FulfillPaymentResult::InProgress);
            }
            ClaimDecision::Rejected(ClaimRejection::NotApplicable(reason)) => {
                tracing::debug!(payment_id = %cmd.payment_id, ?reason, "Activation not applicable");
                return Ok(FulfillPaymentResult::NotApplicable);
            }
            ClaimDecision::Contended => return Ok(FulfillPaymentResult::InProgress),
        };

        match self.dispatcher.dispatch(&claim.payment).await {
            FulfillmentOutcome::Applied(receipt) => {
                self.claims.complete(&claim).await?;
                self.after_fulfillment(&claim.payment, &receipt).await;
                Ok(FulfillPaymentResult::Fulfilled(receipt))
            }
            FulfillmentOutcome::Failed { error } => {
                tracing::warn!(
                    payment_id = %cmd.payment_id,
                    subject = %claim.payment.subject.kind(),
                    attempt = claim.ticket.attempt,
                    error = %error,
                    "Fulfillment failed, claim released for retry"
                );
                self.claims.release_failure(&claim, &error).await?;
                Ok(FulfillPaymentResult::Failed { error })
            }
            FulfillmentOutcome::Partial { error, proxy_slots } => {
                tracing::warn!(
                    payment_id = %cmd.payment_id,
                    attempt = claim.ticket.attempt,
                    created = proxy_slots.len(),
                    error = %error,
                    "Proxy provisioning fell short, keeping created slots for retry"
                );
                self.claims
                    .release_partial(&claim, &error, &proxy_slots)
                    .await?;
                Ok(FulfillPaymentResult::Failed { error })
            }
        }
    }

    /// Referral cascade and client notification for a freshly fulfilled payment.
    async fn after_fulfillment(&self, payment: &Payment, receipt: &FulfillmentReceipt) {
        self.referrals.distribute(payment).await;
        self.notifications
            .send(&payment.client_id, receipt.template, receipt.data.clone())
            .await;
    }
}
