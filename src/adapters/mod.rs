//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - payment, referral, catalog and journal persistence
//! - `control_plane` - VPN panel API client
//! - `notification` - client messaging gateway
//! - `http` - provider webhook endpoints (axum)
//! - `jobs` - background activation sweeper
//! - `memory` - in-memory repositories for tests and local runs

pub mod control_plane;
pub mod http;
pub mod jobs;
pub mod memory;
pub mod notification;
pub mod postgres;

pub use control_plane::{ControlPlaneConfig, HttpControlPlane, MockControlPlane};
pub use http::{webhook_router, WebhooksAppState};
pub use jobs::{ActivationSweeper, ActivationSweeperConfig};
pub use memory::{InMemoryPaymentStore, InMemoryTariffCatalog};
pub use notification::{HttpNotifier, LogNotifier, MockNotifier, NotifierConfig};
pub use postgres::{
    PostgresPaymentRepository, PostgresReferralRepository, PostgresTariffCatalog,
    PostgresWebhookDeliveryRepository,
};
