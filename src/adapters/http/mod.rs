//! HTTP adapters - inbound endpoints.
//!
//! Only the provider webhook surface and a health probe are exposed.

pub mod webhooks;

pub use webhooks::{webhook_router, WebhooksAppState};
