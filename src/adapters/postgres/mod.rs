//! PostgreSQL adapters.
//!
//! Status transitions, activation writes and referral credits are each a
//! single conditional statement (or one transaction), so concurrent webhook
//! deliveries and sweeper passes race safely on the database.

mod payment_repository;
mod referral_repository;
mod tariff_catalog;
mod webhook_delivery_repository;

pub use payment_repository::PostgresPaymentRepository;
pub use referral_repository::PostgresReferralRepository;
pub use tariff_catalog::PostgresTariffCatalog;
pub use webhook_delivery_repository::PostgresWebhookDeliveryRepository;
