//! Referral domain module.
//!
//! Percent table per referral level and the credit rows it produces.

mod credit;
mod levels;

pub use credit::ReferralCredit;
pub use levels::{ReferralLevel, ReferralLevels};
