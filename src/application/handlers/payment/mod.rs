//! Payment handlers.
//!
//! Reconciliation of provider notifications and fulfillment of paid payments.
//!
//! ## Building blocks
//! - `PaymentLookup` - correlation candidates → payment
//! - `TransitionPaymentHandler` - conditional PENDING → PAID / FAILED
//! - `ActivationClaimLock` - at-most-once fulfillment claim
//! - `FulfillmentDispatcher` with the tariff, proxy and extra-option services
//! - `ReferralCascade` - idempotent multi-level rewards
//! - `NotificationSink` - best-effort client messages
//!
//! ## Commands
//! - `ReconcileWebhookHandler` - one webhook delivery end to end
//! - `FulfillPaymentHandler` - claim, dispatch, release
//! - `SweepUnfulfilledHandler` - periodic retry of stuck fulfillments

mod activate_tariff;
mod activation_claim;
mod deadline;
mod dispatcher;
mod fulfill_payment;
mod grant_extra_option;
mod lookup;
mod notification_sink;
mod provision_proxy_slots;
mod reconcile_webhook;
mod referral_cascade;
mod sweep_unfulfilled;
mod transition_payment;

pub use activate_tariff::ActivateTariffService;
pub use activation_claim::{ActivationClaimLock, ClaimDecision, HeldClaim, ReleaseOutcome};
pub use dispatcher::FulfillmentDispatcher;
pub use fulfill_payment::{FulfillPaymentCommand, FulfillPaymentHandler, FulfillPaymentResult};
pub use grant_extra_option::GrantExtraOptionService;
pub use lookup::PaymentLookup;
pub use notification_sink::NotificationSink;
pub use provision_proxy_slots::ProvisionProxySlotsService;
pub use reconcile_webhook::{ReconcileOutcome, ReconcileWebhookCommand, ReconcileWebhookHandler};
pub use referral_cascade::{CascadeReport, ReferralCascade};
pub use sweep_unfulfilled::{SweepReport, SweepUnfulfilledHandler};
pub use transition_payment::TransitionPaymentHandler;
