//! In-memory payment, client and referral storage.
//!
//! One store backs `PaymentRepository`, `ReferralRepository` and
//! `WebhookDeliveryRepository` so that a status transition and its balance
//! credit, or a referral row and its balance increment, happen under a single
//! lock exactly like the PostgreSQL transactions do.
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(InMemoryPaymentStore::new());
//! store.insert_client(client_id, None).await;
//! store.insert_payment(payment).await;
//!
//! let handler = TransitionPaymentHandler::new(store.clone());
//! ```

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

use crate::domain::foundation::{ClientId, DomainError, ErrorCode, PaymentId, Timestamp};
use crate::domain::payment::{
    ActivationState, Payment, PaymentProvider, PaymentStatus, PaymentTransition,
};
use crate::domain::referral::ReferralCredit;
use crate::ports::{
    CreditResult, PaymentRepository, ReferralRepository, WebhookDeliveryRecord,
    WebhookDeliveryRepository,
};

#[derive(Debug, Clone, Default)]
struct ClientRecord {
    balance: Decimal,
    referred_by: Option<ClientId>,
}

#[derive(Default)]
struct State {
    payments: HashMap<PaymentId, Payment>,
    clients: HashMap<ClientId, ClientRecord>,
    credits: Vec<ReferralCredit>,
    failing_referrers: HashSet<ClientId>,
    deliveries: Vec<WebhookDeliveryRecord>,
}

#[derive(Default)]
pub struct InMemoryPaymentStore {
    state: Mutex<State>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    pub async fn insert_payment(&self, payment: Payment) {
        self.state.lock().await.payments.insert(payment.id, payment);
    }

    /// Registers a client with zero balance.
    pub async fn insert_client(&self, client_id: ClientId, referred_by: Option<ClientId>) {
        self.state.lock().await.clients.insert(
            client_id,
            ClientRecord {
                balance: Decimal::ZERO,
                referred_by,
            },
        );
    }

    /// Balance of a client; unknown clients read as zero.
    pub async fn balance(&self, client_id: &ClientId) -> Decimal {
        self.state
            .lock()
            .await
            .clients
            .get(client_id)
            .map_or(Decimal::ZERO, |c| c.balance)
    }

    pub async fn payment(&self, id: &PaymentId) -> Option<Payment> {
        self.state.lock().await.payments.get(id).cloned()
    }

    pub async fn referral_credits(&self) -> Vec<ReferralCredit> {
        self.state.lock().await.credits.clone()
    }

    pub async fn deliveries(&self) -> Vec<WebhookDeliveryRecord> {
        self.state.lock().await.deliveries.clone()
    }

    /// Overwrites the activation fields as another worker would.
    pub async fn set_activation(&self, id: &PaymentId, activation: ActivationState) {
        let mut state = self.state.lock().await;
        if let Some(payment) = state.payments.get_mut(id) {
            payment.metadata = payment.metadata.with_activation(activation);
            payment.version += 1;
        }
    }

    /// Makes every credit for `referrer` fail with a database error.
    pub async fn fail_credits_for(&self, referrer: ClientId) {
        self.state.lock().await.failing_referrers.insert(referrer);
    }

    async fn find_where<F>(&self, predicate: F) -> Option<Payment>
    where
        F: Fn(&Payment) -> bool,
    {
        self.state
            .lock()
            .await
            .payments
            .values()
            .find(|p| predicate(p))
            .cloned()
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentStore {
    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
        Ok(self.payment(id).await)
    }

    async fn find_by_external_id(
        &self,
        provider: PaymentProvider,
        external_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .find_where(|p| p.provider == provider && p.external_id.as_deref() == Some(external_id))
            .await)
    }

    async fn find_by_order_id(
        &self,
        provider: PaymentProvider,
        order_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        Ok(self
            .find_where(|p| p.provider == provider && p.order_id.as_str() == order_id)
            .await)
    }

    async fn try_transition(&self, transition: &PaymentTransition) -> Result<u64, DomainError> {
        let mut state = self.state.lock().await;

        let pending = state
            .payments
            .get(&transition.payment_id)
            .map_or(false, |p| p.status == PaymentStatus::Pending);
        if !pending {
            return Ok(0);
        }

        if let Some(credit) = &transition.balance_credit {
            let client = state.clients.get_mut(&credit.client_id).ok_or_else(|| {
                DomainError::new(
                    ErrorCode::ClientNotFound,
                    format!("Client not found: {}", credit.client_id),
                )
            })?;
            client.balance += credit.amount;
        }

        if let Some(payment) = state.payments.get_mut(&transition.payment_id) {
            payment.status = transition.target;
            if transition.target == PaymentStatus::Paid {
                payment.paid_at = Some(transition.at);
            }
            if payment.external_id.is_none() {
                payment.external_id = transition.transaction_id.clone();
            }
            payment.version += 1;
        }

        Ok(1)
    }

    async fn compare_and_set_activation(
        &self,
        id: &PaymentId,
        expected_version: i64,
        activation: &ActivationState,
    ) -> Result<Option<i64>, DomainError> {
        let mut state = self.state.lock().await;

        match state.payments.get_mut(id) {
            Some(payment) if payment.version == expected_version => {
                payment.metadata = payment.metadata.with_activation(activation.clone());
                payment.version += 1;
                Ok(Some(payment.version))
            }
            _ => Ok(None),
        }
    }

    async fn find_unfulfilled_paid(
        &self,
        paid_before: Timestamp,
        limit: u32,
    ) -> Result<Vec<Payment>, DomainError> {
        let state = self.state.lock().await;

        let mut due: Vec<Payment> = state
            .payments
            .values()
            .filter(|p| p.status == PaymentStatus::Paid)
            .filter(|p| p.subject.requires_activation() && !p.activation().is_applied())
            .filter(|p| p.paid_at.map_or(false, |at| at.is_before(&paid_before)))
            .cloned()
            .collect();
        due.sort_by_key(|p| p.paid_at);
        due.truncate(limit as usize);

        Ok(due)
    }
}

#[async_trait]
impl ReferralRepository for InMemoryPaymentStore {
    async fn find_referrer(&self, client_id: &ClientId) -> Result<Option<ClientId>, DomainError> {
        Ok(self
            .state
            .lock()
            .await
            .clients
            .get(client_id)
            .and_then(|c| c.referred_by))
    }

    async fn record_credit(&self, credit: &ReferralCredit) -> Result<CreditResult, DomainError> {
        let mut state = self.state.lock().await;

        if state.failing_referrers.contains(&credit.referrer_id) {
            return Err(DomainError::database("Simulated referral credit failure"));
        }

        if state.credits.iter().any(|c| c.key() == credit.key()) {
            return Ok(CreditResult::AlreadyCredited);
        }

        let referrer = state.clients.get_mut(&credit.referrer_id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::ClientNotFound,
                format!("Referrer not found: {}", credit.referrer_id),
            )
        })?;
        referrer.balance += credit.amount;
        state.credits.push(credit.clone());

        Ok(CreditResult::Inserted)
    }
}

#[async_trait]
impl WebhookDeliveryRepository for InMemoryPaymentStore {
    async fn record(&self, record: WebhookDeliveryRecord) -> Result<(), DomainError> {
        self.state.lock().await.deliveries.push(record);
        Ok(())
    }

    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, DomainError> {
        let mut state = self.state.lock().await;
        let before = state.deliveries.len();
        state
            .deliveries
            .retain(|d| !d.received_at.is_before(&timestamp));
        Ok((before - state.deliveries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{OrderId, TariffId};
    use crate::domain::payment::{NewPayment, PaymentSubject};
    use serde_json::json;

    fn pending(client_id: ClientId, subject: PaymentSubject) -> Payment {
        Payment::new_pending(NewPayment {
            client_id,
            provider: PaymentProvider::Platega,
            order_id: OrderId::generate(),
            external_id: None,
            amount: Decimal::new(300, 0),
            currency: "RUB".to_string(),
            subject,
        })
        .unwrap()
    }

    // ══════════════════════════════════════════════════════════════
    // Transitions
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn paid_transition_sets_paid_at_and_bumps_version() {
        let store = InMemoryPaymentStore::new();
        let client = ClientId::new();
        let payment = pending(client, PaymentSubject::TopUp);
        store.insert_client(client, None).await;
        store.insert_payment(payment.clone()).await;

        let transition = payment.paid_transition(Some("tx-1".into()), Timestamp::now()).unwrap();
        assert_eq!(store.try_transition(&transition).await.unwrap(), 1);

        let stored = store.payment(&payment.id).await.unwrap();
        assert_eq!(stored.status, PaymentStatus::Paid);
        assert!(stored.paid_at.is_some());
        assert_eq!(stored.external_id.as_deref(), Some("tx-1"));
        assert_eq!(stored.version, payment.version + 1);
        assert_eq!(store.balance(&client).await, Decimal::new(300, 0));
    }

    #[tokio::test]
    async fn credit_to_unknown_client_leaves_payment_pending() {
        let store = InMemoryPaymentStore::new();
        let payment = pending(ClientId::new(), PaymentSubject::TopUp);
        store.insert_payment(payment.clone()).await;

        let transition = payment.paid_transition(None, Timestamp::now()).unwrap();
        assert!(store.try_transition(&transition).await.is_err());

        let stored = store.payment(&payment.id).await.unwrap();
        assert_eq!(stored.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let store = InMemoryPaymentStore::new();
        let payment = pending(ClientId::new(), PaymentSubject::TopUp);
        store.insert_payment(payment.clone()).await;

        let state = ActivationState::default();
        let first = store
            .compare_and_set_activation(&payment.id, payment.version, &state)
            .await
            .unwrap();
        let second = store
            .compare_and_set_activation(&payment.id, payment.version, &state)
            .await
            .unwrap();

        assert_eq!(first, Some(payment.version + 1));
        assert_eq!(second, None);
    }

    #[tokio::test]
    async fn unfulfilled_listing_holds_only_paid_activations() {
        let store = InMemoryPaymentStore::new();
        let client = ClientId::new();
        store.insert_client(client, None).await;
        let tariff = pending(client, PaymentSubject::Tariff(TariffId::new()));
        let top_up = pending(client, PaymentSubject::TopUp);
        let waiting = pending(client, PaymentSubject::Tariff(TariffId::new()));
        for payment in [&tariff, &top_up] {
            store.insert_payment(payment.clone()).await;
            let transition = payment.paid_transition(None, Timestamp::now()).unwrap();
            store.try_transition(&transition).await.unwrap();
        }
        store.insert_payment(waiting).await;

        let due = store
            .find_unfulfilled_paid(Timestamp::now().plus(chrono::Duration::seconds(1)), 10)
            .await
            .unwrap();

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, tariff.id);
    }

    // ══════════════════════════════════════════════════════════════
    // Journal
    // ══════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn delete_before_prunes_only_older_deliveries() {
        let store = InMemoryPaymentStore::new();
        let mut old = WebhookDeliveryRecord::new(PaymentProvider::YooKassa, "ignored", json!({}));
        old.received_at = Timestamp::now().minus(chrono::Duration::days(60));
        store.record(old).await.unwrap();
        store
            .record(WebhookDeliveryRecord::new(PaymentProvider::YooKassa, "fulfilled", json!({})))
            .await
            .unwrap();

        let removed = store
            .delete_before(Timestamp::now().minus(chrono::Duration::days(30)))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert_eq!(store.deliveries().await.len(), 1);
    }
}
