//! Fulfillment domain module.
//!
//! What a paid payment grants: tariff and proxy-tariff definitions, the
//! client's control-plane entitlement and the merge rules applied to it, the
//! outcome of one fulfillment attempt and the notifications it produces.

mod entitlement;
mod outcome;
mod tariff;
mod template;

pub use entitlement::{Entitlement, BYTES_PER_GB};
pub use outcome::{FulfillmentOutcome, FulfillmentReceipt};
pub use tariff::{ProxySlotId, ProxySlotRequest, ProxyTariff, Tariff};
pub use template::NotificationTemplate;
