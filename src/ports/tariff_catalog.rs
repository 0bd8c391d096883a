//! Read access to tariff definitions.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ProxyTariffId, TariffId};
use crate::domain::fulfillment::{ProxyTariff, Tariff};

#[async_trait]
pub trait TariffCatalog: Send + Sync {
    async fn find_tariff(&self, id: &TariffId) -> Result<Option<Tariff>, DomainError>;

    async fn find_proxy_tariff(&self, id: &ProxyTariffId)
        -> Result<Option<ProxyTariff>, DomainError>;
}
