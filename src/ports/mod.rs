//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `PaymentRepository` - Conditional payment transitions and activation writes
//! - `ReferralRepository` - Referrer chain and idempotent credit rows
//! - `WebhookDeliveryRepository` - Journal of inbound notifications
//! - `TariffCatalog` - Tariff and proxy-tariff definitions
//!
//! ## Collaborator Ports
//!
//! - `ControlPlane` - VPN entitlements and proxy credentials
//! - `Notifier` - Client messaging

mod control_plane;
mod notifier;
mod payment_repository;
mod referral_repository;
mod tariff_catalog;
mod webhook_delivery_repository;

pub use control_plane::ControlPlane;
pub use notifier::Notifier;
pub use payment_repository::PaymentRepository;
pub use referral_repository::{CreditResult, ReferralRepository};
pub use tariff_catalog::TariffCatalog;
pub use webhook_delivery_repository::{WebhookDeliveryRecord, WebhookDeliveryRepository};
