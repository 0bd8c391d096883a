//! ProvisionProxySlotsService - creates proxy credentials for a proxy tariff.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::domain::foundation::{DomainError, ErrorCode, ProxyTariffId, Timestamp};
use crate::domain::fulfillment::{FulfillmentOutcome, NotificationTemplate};
use crate::domain::payment::Payment;
use crate::ports::{ControlPlane, TariffCatalog};

use super::deadline::with_deadline;

pub struct ProvisionProxySlotsService {
    catalog: Arc<dyn TariffCatalog>,
    control_plane: Arc<dyn ControlPlane>,
    timeout: Duration,
}

impl ProvisionProxySlotsService {
    pub fn new(
        catalog: Arc<dyn TariffCatalog>,
        control_plane: Arc<dyn ControlPlane>,
        timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            control_plane,
            timeout,
        }
    }

    pub async fn provision(&self, payment: &Payment, tariff_id: &ProxyTariffId) -> FulfillmentOutcome {
        match self.try_provision(payment, tariff_id).await {
            Ok(outcome) => outcome,
            Err(e) => FulfillmentOutcome::failed(e.to_string()),
        }
    }

    async fn try_provision(
        &self,
        payment: &Payment,
        tariff_id: &ProxyTariffId,
    ) -> Result<FulfillmentOutcome, DomainError> {
        let tariff = self.catalog.find_proxy_tariff(tariff_id).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::TariffNotFound,
                format!("Proxy tariff not found: {}", tariff_id),
            )
        })?;

        let mut request = tariff.slot_request(Timestamp::now());
        let mut slots = payment.activation().proxy_slots.clone();
        let wanted = request.count as usize;

        if slots.len() < wanted {
            request.count = (wanted - slots.len()) as u32;
            let created = with_deadline(
                self.timeout,
                "provision_proxy_slots",
                self.control_plane.provision_proxy_slots(&payment.client_id, &request),
            )
            .await?;
            slots.extend(created.into_iter().map(|slot| slot.0));
        }

        if slots.len() < wanted {
            return Ok(FulfillmentOutcome::partial(
                format!(
                    "Requested {} proxy slots, control plane has created {}",
                    wanted,
                    slots.len()
                ),
                slots,
            ));
        }

        tracing::info!(
            payment_id = %payment.id,
            client_id = %payment.client_id,
            proxy_tariff_id = %tariff.id,
            slots = slots.len(),
            "Proxy slots provisioned"
        );

        Ok(FulfillmentOutcome::applied(
            NotificationTemplate::ProxySlotsProvisioned,
            json!({
                "tariff": tariff.name,
                "slots": slots,
                "expiresAt": request.expires_at,
            }),
        ))
    }
}
