//! Result of one fulfillment attempt.

use serde_json::Value;

use super::NotificationTemplate;

/// What a successful fulfillment tells the client.
#[derive(Debug, Clone, PartialEq)]
pub struct FulfillmentReceipt {
    pub template: NotificationTemplate,
    pub data: Value,
}

/// Outcome of dispatching a paid payment to its fulfillment service.
///
/// A failure ends only this attempt; the claim is released and a later
/// delivery or sweep retries.
#[derive(Debug, Clone, PartialEq)]
pub enum FulfillmentOutcome {
    Applied(FulfillmentReceipt),
    Failed { error: String },
    /// The control plane created fewer proxy slots than requested. The ids
    /// created so far are kept so the retry requests only the remainder.
    Partial { error: String, proxy_slots: Vec<String> },
}

impl FulfillmentOutcome {
    pub fn applied(template: NotificationTemplate, data: Value) -> Self {
        FulfillmentOutcome::Applied(FulfillmentReceipt { template, data })
    }

    pub fn failed(error: impl Into<String>) -> Self {
        FulfillmentOutcome::Failed {
            error: error.into(),
        }
    }

    pub fn partial(error: impl Into<String>, proxy_slots: Vec<String>) -> Self {
        FulfillmentOutcome::Partial {
            error: error.into(),
            proxy_slots,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, FulfillmentOutcome::Applied(_))
    }
}
