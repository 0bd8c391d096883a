//! ActivateTariffService - grants or extends a VPN subscription.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::domain::foundation::{DomainError, ErrorCode, TariffId, Timestamp};
use crate::domain::fulfillment::{FulfillmentOutcome, NotificationTemplate};
use crate::domain::payment::Payment;
use crate::ports::{ControlPlane, TariffCatalog};

use super::deadline::with_deadline;

pub struct ActivateTariffService {
    catalog: Arc<dyn TariffCatalog>,
    control_plane: Arc<dyn ControlPlane>,
    timeout: Duration,
}

impl ActivateTariffService {
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

    pub async fn activate(&self, payment: &Payment, tariff_id: &TariffId) -> FulfillmentOutcome {
        match self.try_activate(payment, tariff_id).await {
            Ok(outcome) => outcome,
            Err(e) => FulfillmentOutcome::failed(e.to_string()),
        }
    }

    async fn try_activate(
        &self,
        payment: &Payment,
        tariff_id: &TariffId,
    ) -> Result<FulfillmentOutcome, DomainError> {
        let tariff = self.catalog.find_tariff(tariff_id).await?.ok_or_else(|| {
            DomainError::new(ErrorCode::TariffNotFound, format!("Tariff not found: {}", tariff_id))
        })?;

        let current = with_deadline(
            self.timeout,
            "get_entitlement",
            self.control_plane.get_entitlement(&payment.client_id),
        )
        .await?;

        let next = current.extended_by(&tariff, Timestamp::now());

        with_deadline(
            self.timeout,
            "grant_entitlement",
            self.control_plane.grant_entitlement(&payment.client_id, &next),
        )
        .await?;

        tracing::info!(
            payment_id = %payment.id,
            client_id = %payment.client_id,
            tariff_id = %tariff.id,
            "Tariff activated"
        );

        Ok(FulfillmentOutcome::applied(
            NotificationTemplate::TariffActivated,
            json!({
                "tariff": tariff.name,
                "expiresAt": next.expires_at,
                "deviceLimit": next.device_limit,
                "trafficLimitBytes": next.traffic_limit_bytes,
            }),
        ))
    }
}
