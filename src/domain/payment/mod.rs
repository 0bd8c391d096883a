//! Payment domain module.
//!
//! The payment record, its PENDING → PAID / FAILED lifecycle, the product it
//! pays for, and the activation claim that serializes fulfillment.
//!
//! # Module Structure
//!
//! - `aggregate` - Payment entity
//! - `status` - PaymentStatus state machine
//! - `subject` - What the payment buys (top-up, tariff, proxy tariff, extra option)
//! - `activation` - Activation claim fields and claim/complete/release rules
//! - `metadata` - Typed view over the metadata JSON blob
//! - `transition` - Conditional state change requests
//! - `provider` - Supported payment providers

mod activation;
mod aggregate;
mod errors;
mod metadata;
mod provider;
mod status;
mod subject;
mod transition;

pub use activation::{ActivationState, ClaimRejection, ClaimTicket, NotApplicableReason};
pub use aggregate::{NewPayment, Payment};
pub use errors::PaymentError;
pub use metadata::PaymentMetadata;
pub use provider::PaymentProvider;
pub use status::PaymentStatus;
pub use subject::{ExtraOption, PaymentSubject, SubjectKind};
pub use transition::{BalanceCredit, PaymentTransition, TransitionOutcome};
