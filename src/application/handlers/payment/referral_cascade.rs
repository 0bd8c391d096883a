//! ReferralCascade - multi-level referral rewards for a paid payment.
//!
//! Naturally idempotent: each credit row is insert-if-absent on
//! `(referrer, payment, level)`, so the cascade runs on every delivery for a
//! PAID payment without double crediting. Each level commits on its own; a
//! failure at one level is logged and the walk continues.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;

use crate::domain::foundation::ClientId;
use crate::domain::fulfillment::NotificationTemplate;
use crate::domain::payment::Payment;
use crate::domain::referral::{ReferralCredit, ReferralLevel, ReferralLevels};
use crate::ports::{CreditResult, ReferralRepository};

use super::NotificationSink;

/// What one cascade run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeReport {
    pub credited: Vec<ReferralCredit>,
    pub already_credited: usize,
    pub failed_levels: Vec<ReferralLevel>,
}

pub struct ReferralCascade {
    referrals: Arc<dyn ReferralRepository>,
    levels: ReferralLevels,
    notifications: Option<NotificationSink>,
}

impl ReferralCascade {
    pub fn new(referrals: Arc<dyn ReferralRepository>, levels: ReferralLevels) -> Self {
        Self {
            referrals,
            levels,
            notifications: None,
        }
    }

    /// Notify referrers about newly inserted credits.
    pub fn with_notifications(mut self, sink: NotificationSink) -> Self {
        self.notifications = Some(sink);
        self
    }

    pub async fn distribute(&self, payment: &Payment) -> CascadeReport {
        let mut report = CascadeReport::default();
        let depth = self.levels.depth();
        if depth == 0 {
            return report;
        }

        let mut visited: HashSet<ClientId> = HashSet::from([payment.client_id]);
        let mut current = payment.client_id;

        for level in ReferralLevel::all().take(usize::from(depth)) {
            let referrer = match self.referrals.find_referrer(&current).await {
                Ok(Some(referrer)) => referrer,
                Ok(None) => break,
                Err(e) => {
                    // Without the referrer the chain above is unknown.
                    tracing::warn!(
                        payment_id = %payment.id,
                        level = %level,
                        error = %e,
                        "Referrer lookup failed, stopping cascade"
                    );
                    report.failed_levels.push(level);
                    break;
                }
            };

            if !visited.insert(referrer) {
                tracing::warn!(
                    payment_id = %payment.id,
                    referrer_id = %referrer,
                    "Referral chain loops back, stopping cascade"
                );
                break;
            }
            current = referrer;

            let Some(amount) = self.levels.reward(level, payment.amount) else {
                continue;
            };

            let credit =
                ReferralCredit::new(referrer, payment.client_id, payment.id, level, amount);

            match self.referrals.record_credit(&credit).await {
                Ok(CreditResult::Inserted) => {
                    tracing::info!(
                        payment_id = %payment.id,
                        referrer_id = %referrer,
                        level = %level,
                        amount = %amount,
                        "Referral reward credited"
                    );
                    self.notify_referrer(payment, &credit).await;
                    report.credited.push(credit);
                }
                Ok(CreditResult::AlreadyCredited) => report.already_credited += 1,
                Err(e) => {
                    tracing::warn!(
                        payment_id = %payment.id,
                        referrer_id = %referrer,
                        level = %level,
                        error = %e,
                        "Referral credit failed"
                    );
                    report.failed_levels.push(level);
                }
            }
        }

        report
    }

    async fn notify_referrer(&self, payment: &Payment, credit: &ReferralCredit) {
        if let Some(sink) = &self.notifications {
            sink.send(
                &credit.referrer_id,
                NotificationTemplate::ReferralRewardCredited,
                json!({
                    "amount": credit.amount.to_string(),
                    "currency": payment.currency,
                    "level": credit.level.value(),
                }),
            )
            .await;
        }
    }
}
