//! ReconcileWebhookHandler - one provider notification, end to end.
//!
//! normalize → lookup → transition → claim and fulfill → referral cascade →
//! notify. Every stage may short-circuit. The handler never fails: whatever
//! happens is reported as a [`ReconcileOutcome`], journaled, and the HTTP
//! layer acknowledges the provider. Failure details live in persisted state
//! for the next delivery (or the sweeper) to pick up.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::domain::foundation::{DomainError, PaymentId};
use crate::domain::fulfillment::NotificationTemplate;
use crate::domain::payment::{
    Payment, PaymentProvider, PaymentStatus, PaymentSubject, TransitionOutcome,
};
use crate::domain::webhook::{normalizer_for, NormalizedNotification, StatusBucket};
use crate::ports::{PaymentRepository, WebhookDeliveryRecord, WebhookDeliveryRepository};

use super::{
    FulfillPaymentCommand, FulfillPaymentHandler, FulfillPaymentResult, NotificationSink,
    PaymentLookup, ReferralCascade, TransitionPaymentHandler,
};

/// Command carrying an already authenticated notification body.
///
/// Form-encoded bodies arrive as a flat JSON object of strings.
#[derive(Debug, Clone)]
pub struct ReconcileWebhookCommand {
    pub provider: PaymentProvider,
    pub payload: Value,
}

/// Where processing of one delivery ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// Body empty or unusable.
    Malformed { reason: String },
    /// No local payment for this provider matches.
    NotFound,
    /// Intermediate or unknown status.
    Ignored { status: String },
    /// Reported amount is below the payment amount.
    AmountMismatch { payment_id: PaymentId },
    /// PENDING → FAILED applied by this delivery.
    MarkedFailed { payment_id: PaymentId },
    /// Top-up credited by this delivery.
    TopUpCredited { payment_id: PaymentId },
    /// Fulfillment performed by this delivery.
    Fulfilled { payment_id: PaymentId },
    /// Nothing left to do; an earlier delivery finished the work.
    AlreadyProcessed { payment_id: PaymentId },
    /// Another delivery holds the activation claim.
    Deferred { payment_id: PaymentId },
    /// Fulfillment attempt failed; the claim was released.
    FulfillmentFailed { payment_id: PaymentId, error: String },
    /// Store unavailable; a later delivery retries.
    StoreError { error: String },
}

impl ReconcileOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            ReconcileOutcome::Malformed { .. } => "malformed",
            ReconcileOutcome::NotFound => "not_found",
            ReconcileOutcome::Ignored { .. } => "ignored",
            ReconcileOutcome::AmountMismatch { .. } => "amount_mismatch",
            ReconcileOutcome::MarkedFailed { .. } => "marked_failed",
            ReconcileOutcome::TopUpCredited { .. } => "top_up_credited",
            ReconcileOutcome::Fulfilled { .. } => "fulfilled",
            ReconcileOutcome::AlreadyProcessed { .. } => "already_processed",
            ReconcileOutcome::Deferred { .. } => "deferred",
            ReconcileOutcome::FulfillmentFailed { .. } => "fulfillment_failed",
            ReconcileOutcome::StoreError { .. } => "store_error",
        }
    }

    pub fn payment_id(&self) -> Option<PaymentId> {
        match self {
            ReconcileOutcome::AmountMismatch { payment_id }
            | ReconcileOutcome::MarkedFailed { payment_id }
            | ReconcileOutcome::TopUpCredited { payment_id }
            | ReconcileOutcome::Fulfilled { payment_id }
            | ReconcileOutcome::AlreadyProcessed { payment_id }
            | ReconcileOutcome::Deferred { payment_id }
            | ReconcileOutcome::FulfillmentFailed { payment_id, .. } => Some(*payment_id),
            _ => None,
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            ReconcileOutcome::Malformed { reason } => Some(reason.clone()),
            ReconcileOutcome::Ignored { status } => Some(status.clone()),
            ReconcileOutcome::FulfillmentFailed { error, .. }
            | ReconcileOutcome::StoreError { error } => Some(error.clone()),
            _ => None,
        }
    }
}

pub struct ReconcileWebhookHandler {
    payments: Arc<dyn PaymentRepository>,
    lookup: PaymentLookup,
    transitions: TransitionPaymentHandler,
    fulfillment: Arc<FulfillPaymentHandler>,
    referrals: Arc<ReferralCascade>,
    notifications: NotificationSink,
    journal: Option<Arc<dyn WebhookDeliveryRepository>>,
}

impl ReconcileWebhookHandler {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        fulfillment: Arc<FulfillPaymentHandler>,
        referrals: Arc<ReferralCascade>,
        notifications: NotificationSink,
    ) -> Self {
        Self {
            lookup: PaymentLookup::new(payments.clone()),
            transitions: TransitionPaymentHandler::new(payments.clone()),
            payments,
            fulfillment,
            referrals,
            notifications,
            journal: None,
        }
    }

    pub fn with_journal(mut self, journal: Arc<dyn WebhookDeliveryRepository>) -> Self {
        self.journal = Some(journal);
        self
    }

    pub async fn handle(&self, cmd: ReconcileWebhookCommand) -> ReconcileOutcome {
        let normalized = normalizer_for(cmd.provider).normalize(&cmd.payload);
        let transaction_id = normalized
            .as_ref()
            .ok()
            .and_then(|n| n.transaction_id.clone());

        let outcome = match normalized {
            Ok(notification) => match self.reconcile(&notification).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(
                        provider = %cmd.provider,
                        error = %e,
                        "Store error during webhook reconciliation"
                    );
                    ReconcileOutcome::StoreError { error: e.to_string() }
                }
            },
            Err(e) => {
                tracing::debug!(provider = %cmd.provider, error = %e, "Unusable webhook body");
                ReconcileOutcome::Malformed { reason: e.to_string() }
            }
        };

        self.journal(cmd.provider, transaction_id, &outcome, cmd.payload)
            .await;
        outcome
    }

    async fn reconcile(
        &self,
        notification: &NormalizedNotification,
    ) -> Result<ReconcileOutcome, DomainError> {
        let Some(payment) = self
            .lookup
            .resolve(notification.provider, &notification.correlation_candidates)
            .await?
        else {
            tracing::info!(
                provider = %notification.provider,
                candidates = ?notification.correlation_candidates,
                "No payment matches webhook"
            );
            return Ok(ReconcileOutcome::NotFound);
        };

        match notification.bucket {
            StatusBucket::Failure => self.fail(&payment, notification).await,
            StatusBucket::Ignored => {
                tracing::debug!(
                    payment_id = %payment.id,
                    status = %notification.status,
                    "Ignoring intermediate status"
                );
                Ok(ReconcileOutcome::Ignored {
                    status: notification.status.clone(),
                })
            }
            StatusBucket::Success => self.succeed(payment, notification).await,
        }
    }

    async fn fail(
        &self,
        payment: &Payment,
        notification: &NormalizedNotification,
    ) -> Result<ReconcileOutcome, DomainError> {
        let outcome = self
            .transitions
            .mark_failed(payment, notification.transaction_id.clone())
            .await?;

        if outcome == TransitionOutcome::AlreadyTerminal {
            return Ok(ReconcileOutcome::AlreadyProcessed {
                payment_id: payment.id,
            });
        }

        self.notifications
            .send(
                &payment.client_id,
                NotificationTemplate::PaymentFailed,
                json!({
                    "amount": payment.amount.to_string(),
                    "currency": payment.currency,
                    "orderId": payment.order_id.as_str(),
                }),
            )
            .await;

        Ok(ReconcileOutcome::MarkedFailed {
            payment_id: payment.id,
        })
    }

    async fn succeed(
        &self,
        payment: Payment,
        notification: &NormalizedNotification,
    ) -> Result<ReconcileOutcome, DomainError> {
        if notification.provider == PaymentProvider::YooMoney {
            if let Some(paid) = notification.paid_amount {
                if paid < payment.amount {
                    tracing::warn!(
                        payment_id = %payment.id,
                        expected = %payment.amount,
                        paid = %paid,
                        "Paid amount below payment amount"
                    );
                    return Ok(ReconcileOutcome::AmountMismatch {
                        payment_id: payment.id,
                    });
                }
            }
        }

        let transition = self
            .transitions
            .mark_paid(&payment, notification.transaction_id.clone())
            .await?;

        // Re-read: a duplicate delivery must see what the winner wrote.
        let payment = self.payments.find_by_id(&payment.id).await?.unwrap_or(payment);

        if payment.status != PaymentStatus::Paid {
            return Ok(ReconcileOutcome::AlreadyProcessed {
                payment_id: payment.id,
            });
        }

        if payment.subject == PaymentSubject::TopUp {
            self.referrals.distribute(&payment).await;
            if transition.changed() {
                self.notifications
                    .send(
                        &payment.client_id,
                        NotificationTemplate::TopUpCredited,
                        json!({
                            "amount": payment.amount.to_string(),
                            "currency": payment.currency,
                        }),
                    )
                    .await;
                return Ok(ReconcileOutcome::TopUpCredited {
                    payment_id: payment.id,
                });
            }
            return Ok(ReconcileOutcome::AlreadyProcessed {
                payment_id: payment.id,
            });
        }

        let result = self
            .fulfillment
            .handle(FulfillPaymentCommand {
                payment_id: payment.id,
            })
            .await?;

        Ok(match result {
            FulfillPaymentResult::Fulfilled(_) => ReconcileOutcome::Fulfilled {
                payment_id: payment.id,
            },
            FulfillPaymentResult::AlreadyApplied => {
                // Heals a crash between fulfillment and the cascade.
                self.referrals.distribute(&payment).await;
                ReconcileOutcome::AlreadyProcessed {
                    payment_id: payment.id,
                }
            }
            FulfillPaymentResult::InProgress => ReconcileOutcome::Deferred {
                payment_id: payment.id,
            },
            FulfillPaymentResult::NotApplicable => ReconcileOutcome::AlreadyProcessed {
                payment_id: payment.id,
            },
            FulfillPaymentResult::Failed { error } => ReconcileOutcome::FulfillmentFailed {
                payment_id: payment.id,
                error,
            },
        })
    }

    async fn journal(
        &self,
        provider: PaymentProvider,
        transaction_id: Option<String>,
        outcome: &ReconcileOutcome,
        payload: Value,
    ) {
        let Some(journal) = &self.journal else {
            return;
        };

        let mut record = WebhookDeliveryRecord::new(provider, outcome.label(), payload)
            .with_transaction_id(transaction_id);
        if let Some(payment_id) = outcome.payment_id() {
            record = record.with_payment(payment_id);
        }
        if let Some(detail) = outcome.detail() {
            record = record.with_detail(detail);
        }

        if let Err(e) = journal.record(record).await {
            tracing::warn!(provider = %provider, error = %e, "Failed to journal webhook delivery");
        }
    }
}
