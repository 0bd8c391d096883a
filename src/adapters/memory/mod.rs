//! In-memory adapters for tests and local runs without a database.

mod payment_store;
mod tariff_catalog;

pub use payment_store::InMemoryPaymentStore;
pub use tariff_catalog::InMemoryTariffCatalog;
