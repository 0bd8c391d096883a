//! FulfillmentDispatcher - routes a claimed payment to its fulfillment service.

use crate::domain::fulfillment::FulfillmentOutcome;
use crate::domain::payment::{Payment, PaymentSubject};

use super::{ActivateTariffService, GrantExtraOptionService, ProvisionProxySlotsService};

pub struct FulfillmentDispatcher {
    tariffs: ActivateTariffService,
    proxies: ProvisionProxySlotsService,
    extras: GrantExtraOptionService,
}

impl FulfillmentDispatcher {
    pub fn new(
        tariffs: ActivateTariffService,
        proxies: ProvisionProxySlotsService,
        extras: GrantExtraOptionService,
    ) -> Self {
        Self {
            tariffs,
            proxies,
            extras,
        }
    }

    /// Invokes exactly one service. Must only run under a held claim.
    pub async fn dispatch(&self, payment: &Payment) -> FulfillmentOutcome {
        match &payment.subject {
            PaymentSubject::ExtraOption(option) => self.extras.grant(payment, option).await,
            PaymentSubject::ProxyTariff(id) => self.proxies.provision(payment, id).await,
            PaymentSubject::Tariff(id) => self.tariffs.activate(payment, id).await,
            PaymentSubject::TopUp => {
                FulfillmentOutcome::failed("top-up is settled with the PAID transition")
            }
        }
    }
}
