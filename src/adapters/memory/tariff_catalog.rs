//! In-memory tariff catalog.
//!
//! # Panics
//!
//! Methods may panic if internal locks are poisoned. Intended for tests and
//! local runs only.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, ProxyTariffId, TariffId};
use crate::domain::fulfillment::{ProxyTariff, Tariff};
use crate::ports::TariffCatalog;

#[derive(Default)]
pub struct InMemoryTariffCatalog {
    tariffs: RwLock<HashMap<TariffId, Tariff>>,
    proxy_tariffs: RwLock<HashMap<ProxyTariffId, ProxyTariff>>,
}

impl InMemoryTariffCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tariff(&self, tariff: Tariff) {
        self.tariffs
            .write()
            .expect("InMemoryTariffCatalog: tariffs lock poisoned")
            .insert(tariff.id, tariff);
    }

    pub fn add_proxy_tariff(&self, tariff: ProxyTariff) {
        self.proxy_tariffs
            .write()
            .expect("InMemoryTariffCatalog: proxy tariffs lock poisoned")
            .insert(tariff.id, tariff);
    }
}

#[async_trait]
impl TariffCatalog for InMemoryTariffCatalog {
    async fn find_tariff(&self, id: &TariffId) -> Result<Option<Tariff>, DomainError> {
        Ok(self
            .tariffs
            .read()
            .expect("InMemoryTariffCatalog: tariffs lock poisoned")
            .get(id)
            .cloned())
    }

    async fn find_proxy_tariff(
        &self,
        id: &ProxyTariffId,
    ) -> Result<Option<ProxyTariff>, DomainError> {
        Ok(self
            .proxy_tariffs
            .read()
            .expect("InMemoryTariffCatalog: proxy tariffs lock poisoned")
            .get(id)
            .cloned())
    }
}
