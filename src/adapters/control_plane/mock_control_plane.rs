//! Mock control plane for testing.
//!
//! Records every call, keeps entitlements in memory and can be told to fail
//! or to respond slowly. Each call yields to the scheduler before touching
//! state so concurrent callers genuinely interleave.
//!
//! # Panics
//!
//! Methods may panic if the internal lock is poisoned. Test use only.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::foundation::{ClientId, DomainError};
use crate::domain::fulfillment::{Entitlement, ProxySlotId, ProxySlotRequest};
use crate::ports::ControlPlane;

#[derive(Default)]
struct MockState {
    entitlements: HashMap<ClientId, Entitlement>,
    slots: HashMap<ClientId, Vec<ProxySlotId>>,
    grant_calls: usize,
    provision_calls: usize,
    failing_grants: u32,
    short_provisions: u32,
    delay: Option<Duration>,
}

#[derive(Default)]
pub struct MockControlPlane {
    state: Mutex<MockState>,
}

impl MockControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().expect("MockControlPlane: lock poisoned")
    }

    // === Test Helpers ===

    /// Number of `grant_entitlement` calls, failed ones included.
    pub fn grant_calls(&self) -> usize {
        self.lock().grant_calls
    }

    pub fn provision_calls(&self) -> usize {
        self.lock().provision_calls
    }

    pub fn entitlement(&self, client_id: &ClientId) -> Option<Entitlement> {
        self.lock().entitlements.get(client_id).cloned()
    }

    pub fn set_entitlement(&self, client_id: ClientId, entitlement: Entitlement) {
        self.lock().entitlements.insert(client_id, entitlement);
    }

    pub fn slots_for(&self, client_id: &ClientId) -> Vec<ProxySlotId> {
        self.lock().slots.get(client_id).cloned().unwrap_or_default()
    }

    /// The next `count` grant calls return an error.
    pub fn fail_next_grants(&self, count: u32) {
        self.lock().failing_grants = count;
    }

    /// The next provisioning call creates `missing` fewer slots than requested.
    pub fn short_next_provision(&self, missing: u32) {
        self.lock().short_provisions = missing;
    }

    /// Every call sleeps for `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    async fn pause(&self) {
        let delay = self.lock().delay;
        match delay {
            Some(delay) => tokio::time::sleep(delay).await,
            None => tokio::task::yield_now().await,
        }
    }
}

#[async_trait]
impl ControlPlane for MockControlPlane {
    async fn get_entitlement(&self, client_id: &ClientId) -> Result<Entitlement, DomainError> {
        self.pause().await;
        Ok(self
            .lock()
            .entitlements
            .get(client_id)
            .cloned()
            .unwrap_or_else(Entitlement::none))
    }

    async fn grant_entitlement(
        &self,
        client_id: &ClientId,
        entitlement: &Entitlement,
    ) -> Result<(), DomainError> {
        self.pause().await;
        let mut state = self.lock();
        state.grant_calls += 1;
        if state.failing_grants > 0 {
            state.failing_grants -= 1;
            return Err(DomainError::control_plane("Simulated control plane failure"));
        }
        state.entitlements.insert(*client_id, entitlement.clone());
        Ok(())
    }

    async fn provision_proxy_slots(
        &self,
        client_id: &ClientId,
        request: &ProxySlotRequest,
    ) -> Result<Vec<ProxySlotId>, DomainError> {
        self.pause().await;
        let mut state = self.lock();
        state.provision_calls += 1;
        let count = request.count.saturating_sub(std::mem::take(&mut state.short_provisions));
        let slots: Vec<ProxySlotId> = (0..count)
            .map(|_| ProxySlotId(uuid::Uuid::new_v4().to_string()))
            .collect();
        state
            .slots
            .entry(*client_id)
            .or_default()
            .extend(slots.iter().cloned());
        Ok(slots)
    }
}
