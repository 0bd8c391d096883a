//! VPN panel billing - payment reconciliation and fulfillment.
//!
//! Turns at-least-once, unordered provider webhooks (Platega, YooKassa,
//! YooMoney) into exactly-once effects: balance credit, tariff activation,
//! proxy provisioning, extra-option grants, referral rewards and client
//! notifications.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
