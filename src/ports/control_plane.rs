//! VPN control-plane port.
//!
//! The control plane owns client entitlements and proxy credentials. Its
//! calls are slow, fallible and not idempotent; callers serialize them per
//! payment with the activation claim and bound each call with a timeout.

use async_trait::async_trait;

use crate::domain::foundation::{ClientId, DomainError};
use crate::domain::fulfillment::{Entitlement, ProxySlotId, ProxySlotRequest};

#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Current limits, expiry and server groups of the client.
    async fn get_entitlement(&self, client_id: &ClientId) -> Result<Entitlement, DomainError>;

    /// Replaces the client's entitlement.
    async fn grant_entitlement(
        &self,
        client_id: &ClientId,
        entitlement: &Entitlement,
    ) -> Result<(), DomainError>;

    /// Creates `request.count` proxy credentials on available nodes.
    async fn provision_proxy_slots(
        &self,
        client_id: &ClientId,
        request: &ProxySlotRequest,
    ) -> Result<Vec<ProxySlotId>, DomainError>;
}
