//! GrantExtraOptionService - adds traffic, devices or server groups.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use crate::domain::foundation::DomainError;
use crate::domain::fulfillment::{FulfillmentOutcome, NotificationTemplate};
use crate::domain::payment::{ExtraOption, Payment};
use crate::ports::ControlPlane;

use super::deadline::with_deadline;

/// Reads the current entitlement and writes it back with the option added,
/// so limits granted elsewhere are never lowered.
pub struct GrantExtraOptionService {
    control_plane: Arc<dyn ControlPlane>,
    timeout: Duration,
}

impl GrantExtraOptionService {
    pub fn new(control_plane: Arc<dyn ControlPlane>, timeout: Duration) -> Self {
        Self {
            control_plane,
            timeout,
        }
    }

    pub async fn grant(&self, payment: &Payment, option: &ExtraOption) -> FulfillmentOutcome {
        match self.try_grant(payment, option).await {
            Ok(outcome) => outcome,
            Err(e) => FulfillmentOutcome::failed(e.to_string()),
        }
    }

    async fn try_grant(
        &self,
        payment: &Payment,
        option: &ExtraOption,
    ) -> Result<FulfillmentOutcome, DomainError> {
        let current = with_deadline(
            self.timeout,
            "get_entitlement",
            self.control_plane.get_entitlement(&payment.client_id),
        )
        .await?;

        let next = current.with_extra(option);

        with_deadline(
            self.timeout,
            "grant_entitlement",
            self.control_plane.grant_entitlement(&payment.client_id, &next),
        )
        .await?;

        tracing::info!(
            payment_id = %payment.id,
            client_id = %payment.client_id,
            kind = option.kind(),
            "Extra option granted"
        );

        Ok(FulfillmentOutcome::applied(
            NotificationTemplate::ExtraOptionGranted,
            json!({
                "option": option,
                "deviceLimit": next.device_limit,
                "trafficLimitBytes": next.traffic_limit_bytes,
                "serverGroups": next.server_groups,
            }),
        ))
    }
}
