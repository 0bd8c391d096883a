//! Domain layer: pure types and rules, no I/O.

pub mod foundation;
pub mod fulfillment;
pub mod payment;
pub mod referral;
pub mod webhook;
