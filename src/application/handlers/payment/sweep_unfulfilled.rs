//! SweepUnfulfilledHandler - fulfills PAID payments nobody finished.
//!
//! Providers stop re-delivering after a while. A payment that was marked
//! PAID but whose fulfillment failed or crashed would then wait forever; the
//! sweep picks such payments up once their last claim is past the staleness
//! window and runs the same claim-and-fulfill path as a webhook delivery.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::PaymentRepository;

use super::{FulfillPaymentCommand, FulfillPaymentHandler, FulfillPaymentResult};

/// Counts from one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub fulfilled: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub struct SweepUnfulfilledHandler {
    payments: Arc<dyn PaymentRepository>,
    fulfillment: Arc<FulfillPaymentHandler>,
    stale_after: chrono::Duration,
    batch_size: u32,
}

impl SweepUnfulfilledHandler {
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        fulfillment: Arc<FulfillPaymentHandler>,
        stale_after: chrono::Duration,
        batch_size: u32,
    ) -> Self {
        Self {
            payments,
            fulfillment,
            stale_after,
            batch_size,
        }
    }

    pub async fn sweep_once(&self) -> Result<SweepReport, DomainError> {
        let paid_before = Timestamp::now().minus(self.stale_after);
        let candidates = self
            .payments
            .find_unfulfilled_paid(paid_before, self.batch_size)
            .await?;

        let mut report = SweepReport {
            scanned: candidates.len(),
            ..Default::default()
        };

        for payment in candidates {
            let result = self
                .fulfillment
                .handle(FulfillPaymentCommand {
                    payment_id: payment.id,
                })
                .await;

            match result {
                Ok(FulfillPaymentResult::Fulfilled(_)) => report.fulfilled += 1,
                Ok(FulfillPaymentResult::Failed { .. }) => report.failed += 1,
                Ok(_) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!(payment_id = %payment.id, error = %e, "Sweep fulfillment errored");
                    report.failed += 1;
                }
            }
        }

        if report.scanned > 0 {
            tracing::info!(
                scanned = report.scanned,
                fulfilled = report.fulfilled,
                failed = report.failed,
                skipped = report.skipped,
                "Unfulfilled payment sweep finished"
            );
        }

        Ok(report)
    }
}
