//! Foundation module - Shared domain primitives.
//!
//! Identifiers, timestamps, the state machine trait and the error vocabulary
//! shared by the payment, webhook, referral and fulfillment modules.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{ClientId, OrderId, PaymentId, ProxyTariffId, ReferralCreditId, TariffId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
