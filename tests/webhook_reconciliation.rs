//! Integration tests for webhook reconciliation.
//!
//! These tests drive `ReconcileWebhookHandler` end to end over the in-memory
//! store, mock control plane and mock notifier:
//! 1. Duplicate and concurrent deliveries produce a single side effect
//! 2. A crashed claim is reclaimed once stale, a fresh one is not
//! 3. Referral rewards are credited once per (referrer, payment, level)
//! 4. Terminal payments are never downgraded

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use vpn_panel_billing::adapters::control_plane::MockControlPlane;
use vpn_panel_billing::adapters::memory::{InMemoryPaymentStore, InMemoryTariffCatalog};
use vpn_panel_billing::adapters::notification::MockNotifier;
use vpn_panel_billing::application::handlers::payment::{
    ActivateTariffService, ActivationClaimLock, FulfillmentDispatcher, GrantExtraOptionService,
    NotificationSink, ProvisionProxySlotsService, ReferralCascade,
};
use vpn_panel_billing::application::{
    FulfillPaymentHandler, ReconcileOutcome, ReconcileWebhookCommand, ReconcileWebhookHandler,
    SweepUnfulfilledHandler,
};
use vpn_panel_billing::domain::foundation::{
    ClientId, OrderId, ProxyTariffId, TariffId, Timestamp,
};
use vpn_panel_billing::domain::fulfillment::{NotificationTemplate, ProxyTariff, Tariff};
use vpn_panel_billing::domain::payment::{
    ActivationState, ExtraOption, NewPayment, Payment, PaymentProvider, PaymentStatus,
    PaymentSubject,
};
use vpn_panel_billing::domain::referral::{ReferralLevel, ReferralLevels};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Harness {
    store: Arc<InMemoryPaymentStore>,
    catalog: Arc<InMemoryTariffCatalog>,
    control_plane: Arc<MockControlPlane>,
    notifier: Arc<MockNotifier>,
    fulfillment: Arc<FulfillPaymentHandler>,
    reconciler: Arc<ReconcileWebhookHandler>,
}

impl Harness {
    fn new() -> Self {
        Self::with_levels(ReferralLevels::default())
    }

    fn with_levels(levels: ReferralLevels) -> Self {
        let store = Arc::new(InMemoryPaymentStore::new());
        let catalog = Arc::new(InMemoryTariffCatalog::new());
        let control_plane = Arc::new(MockControlPlane::new());
        let notifier = Arc::new(MockNotifier::new());
        let notifications = NotificationSink::new(notifier.clone(), Duration::from_secs(1));
        let timeout = Duration::from_secs(2);

        let referrals = Arc::new(
            ReferralCascade::new(store.clone(), levels).with_notifications(notifications.clone()),
        );
        let fulfillment = Arc::new(FulfillPaymentHandler::new(
            ActivationClaimLock::new(store.clone(), chrono::Duration::minutes(10)),
            FulfillmentDispatcher::new(
                ActivateTariffService::new(catalog.clone(), control_plane.clone(), timeout),
                ProvisionProxySlotsService::new(catalog.clone(), control_plane.clone(), timeout),
                GrantExtraOptionService::new(control_plane.clone(), timeout),
            ),
            referrals.clone(),
            notifications.clone(),
        ));
        let reconciler = Arc::new(
            ReconcileWebhookHandler::new(store.clone(), fulfillment.clone(), referrals, notifications)
                .with_journal(store.clone()),
        );

        Self {
            store,
            catalog,
            control_plane,
            notifier,
            fulfillment,
            reconciler,
        }
    }

    async fn client(&self, referred_by: Option<ClientId>) -> ClientId {
        let id = ClientId::new();
        self.store.insert_client(id, referred_by).await;
        id
    }

    async fn pending(
        &self,
        client_id: ClientId,
        provider: PaymentProvider,
        order: &str,
        external_id: Option<&str>,
        amount: Decimal,
        subject: PaymentSubject,
    ) -> Payment {
        let payment = Payment::new_pending(NewPayment {
            client_id,
            provider,
            order_id: OrderId::new(order).unwrap(),
            external_id: external_id.map(str::to_string),
            amount,
            currency: "RUB".to_string(),
            subject,
        })
        .unwrap();
        self.store.insert_payment(payment.clone()).await;
        payment
    }

    fn monthly_tariff(&self) -> TariffId {
        let id = TariffId::new();
        self.catalog.add_tariff(Tariff {
            id,
            name: "Month".to_string(),
            duration_days: 30,
            traffic_limit_gb: Some(100),
            device_limit: Some(3),
            server_groups: vec!["eu".to_string()],
        });
        id
    }

    async fn deliver(&self, provider: PaymentProvider, payload: Value) -> ReconcileOutcome {
        self.reconciler
            .handle(ReconcileWebhookCommand { provider, payload })
            .await
    }
}

fn rub(amount: i64) -> Decimal {
    Decimal::new(amount, 0)
}

fn platega_confirmed(transaction_id: &str, order: &str) -> Value {
    json!({"id": transaction_id, "status": "CONFIRMED", "payload": order})
}

fn yookassa_event(event: &str, status: &str, payment_id: &str, order: &str) -> Value {
    json!({
        "type": "notification",
        "event": event,
        "object": {
            "id": payment_id,
            "status": status,
            "amount": {"value": "990.00", "currency": "RUB"},
            "metadata": {"orderId": order}
        }
    })
}

// =============================================================================
// Top-up
// =============================================================================

#[tokio::test]
async fn platega_top_up_credits_balance_once() {
    let h = Harness::new();
    let client = h.client(None).await;
    let payment = h
        .pending(client, PaymentProvider::Platega, "ord-topup", None, rub(500), PaymentSubject::TopUp)
        .await;

    let first = h
        .deliver(PaymentProvider::Platega, platega_confirmed("tx-1", "ord-topup"))
        .await;
    let second = h
        .deliver(PaymentProvider::Platega, platega_confirmed("tx-1", "ord-topup"))
        .await;

    assert_eq!(first, ReconcileOutcome::TopUpCredited { payment_id: payment.id });
    assert_eq!(second, ReconcileOutcome::AlreadyProcessed { payment_id: payment.id });
    assert_eq!(h.store.balance(&client).await, rub(500));

    let stored = h.store.payment(&payment.id).await.unwrap();
    assert_eq!(stored.status, PaymentStatus::Paid);
    assert_eq!(stored.external_id.as_deref(), Some("tx-1"));
    assert_eq!(h.notifier.sent_to(&client), vec![NotificationTemplate::TopUpCredited]);
}

#[tokio::test]
async fn concurrent_top_up_deliveries_credit_once() {
    let h = Harness::new();
    let client = h.client(None).await;
    h.pending(client, PaymentProvider::Platega, "ord-race", None, rub(250), PaymentSubject::TopUp)
        .await;

    let deliveries = (0..8).map(|_| {
        let reconciler = h.reconciler.clone();
        tokio::spawn(async move {
            reconciler
                .handle(ReconcileWebhookCommand {
                    provider: PaymentProvider::Platega,
                    payload: platega_confirmed("tx-race", "ord-race"),
                })
                .await
        })
    });
    let outcomes: Vec<ReconcileOutcome> = join_all(deliveries)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    let credited = outcomes
        .iter()
        .filter(|o| matches!(o, ReconcileOutcome::TopUpCredited { .. }))
        .count();
    assert_eq!(credited, 1);
    assert_eq!(h.store.balance(&client).await, rub(250));
}

// =============================================================================
// Activation
// =============================================================================

#[tokio::test]
async fn concurrent_tariff_deliveries_grant_once() {
    let h = Harness::new();
    let client = h.client(None).await;
    let tariff = h.monthly_tariff();
    let payment = h
        .pending(
            client,
            PaymentProvider::YooKassa,
            "ord-tariff",
            Some("kassa-1"),
            rub(990),
            PaymentSubject::Tariff(tariff),
        )
        .await;
    h.control_plane.set_delay(Duration::from_millis(50));

    let deliveries = (0..10).map(|_| {
        let reconciler = h.reconciler.clone();
        tokio::spawn(async move {
            reconciler
                .handle(ReconcileWebhookCommand {
                    provider: PaymentProvider::YooKassa,
                    payload: yookassa_event("payment.succeeded", "succeeded", "kassa-1", "ord-tariff"),
                })
                .await
        })
    });
    let outcomes: Vec<ReconcileOutcome> = join_all(deliveries)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(h.control_plane.grant_calls(), 1);
    let fulfilled = outcomes
        .iter()
        .filter(|o| matches!(o, ReconcileOutcome::Fulfilled { .. }))
        .count();
    assert_eq!(fulfilled, 1);

    let stored = h.store.payment(&payment.id).await.unwrap();
    assert!(stored.activation().is_applied());
    assert_eq!(h.notifier.sent_to(&client), vec![NotificationTemplate::TariffActivated]);
}

#[tokio::test]
async fn stale_claim_is_reclaimed() {
    let h = Harness::new();
    let client = h.client(None).await;
    let tariff = h.monthly_tariff();
    let payment = h
        .pending(
            client,
            PaymentProvider::YooKassa,
            "ord-stale",
            Some("kassa-stale"),
            rub(990),
            PaymentSubject::Tariff(tariff),
        )
        .await;
    h.store
        .set_activation(
            &payment.id,
            ActivationState {
                in_progress_at: Some(Timestamp::now().minus(chrono::Duration::minutes(20))),
                attempts: 1,
                ..Default::default()
            },
        )
        .await;

    let outcome = h
        .deliver(
            PaymentProvider::YooKassa,
            yookassa_event("payment.succeeded", "succeeded", "kassa-stale", "ord-stale"),
        )
        .await;

    assert_eq!(outcome, ReconcileOutcome::Fulfilled { payment_id: payment.id });
    assert_eq!(h.control_plane.grant_calls(), 1);
    let activation = h.store.payment(&payment.id).await.unwrap().activation().clone();
    assert!(activation.is_applied());
    assert_eq!(activation.attempts, 2);
}

#[tokio::test]
async fn fresh_claim_defers_delivery() {
    let h = Harness::new();
    let client = h.client(None).await;
    let tariff = h.monthly_tariff();
    let payment = h
        .pending(
            client,
            PaymentProvider::YooKassa,
            "ord-busy",
            Some("kassa-busy"),
            rub(990),
            PaymentSubject::Tariff(tariff),
        )
        .await;
    h.store
        .set_activation(
            &payment.id,
            ActivationState {
                in_progress_at: Some(Timestamp::now().minus(chrono::Duration::minutes(1))),
                attempts: 1,
                ..Default::default()
            },
        )
        .await;

    let outcome = h
        .deliver(
            PaymentProvider::YooKassa,
            yookassa_event("payment.succeeded", "succeeded", "kassa-busy", "ord-busy"),
        )
        .await;

    assert_eq!(outcome, ReconcileOutcome::Deferred { payment_id: payment.id });
    assert_eq!(h.control_plane.grant_calls(), 0);
}

#[tokio::test]
async fn yookassa_proxy_tariff_provisions_all_slots() {
    let h = Harness::new();
    let client = h.client(None).await;
    let proxy_tariff = ProxyTariffId::new();
    h.catalog.add_proxy_tariff(ProxyTariff {
        id: proxy_tariff,
        name: "Proxy x3".to_string(),
        slot_count: 3,
        duration_days: 30,
    });
    let payment = h
        .pending(
            client,
            PaymentProvider::YooKassa,
            "ord-proxy",
            Some("kassa-proxy"),
            rub(300),
            PaymentSubject::ProxyTariff(proxy_tariff),
        )
        .await;

    let outcome = h
        .deliver(
            PaymentProvider::YooKassa,
            yookassa_event("payment.succeeded", "succeeded", "kassa-proxy", "ord-proxy"),
        )
        .await;
    let duplicate = h
        .deliver(
            PaymentProvider::YooKassa,
            yookassa_event("payment.succeeded", "succeeded", "kassa-proxy", "ord-proxy"),
        )
        .await;

    assert_eq!(outcome, ReconcileOutcome::Fulfilled { payment_id: payment.id });
    assert_eq!(duplicate, ReconcileOutcome::AlreadyProcessed { payment_id: payment.id });
    assert_eq!(h.control_plane.slots_for(&client).len(), 3);
    assert_eq!(h.control_plane.provision_calls(), 1);
}

#[tokio::test]
async fn short_proxy_provisioning_retries_only_the_remainder() {
    let h = Harness::new();
    let client = h.client(None).await;
    let proxy_tariff = ProxyTariffId::new();
    h.catalog.add_proxy_tariff(ProxyTariff {
        id: proxy_tariff,
        name: "Proxy x3".to_string(),
        slot_count: 3,
        duration_days: 30,
    });
    let payment = h
        .pending(
            client,
            PaymentProvider::YooKassa,
            "ord-short",
            Some("kassa-short"),
            rub(300),
            PaymentSubject::ProxyTariff(proxy_tariff),
        )
        .await;
    h.control_plane.short_next_provision(1);

    let first = h
        .deliver(
            PaymentProvider::YooKassa,
            yookassa_event("payment.succeeded", "succeeded", "kassa-short", "ord-short"),
        )
        .await;
    assert!(matches!(first, ReconcileOutcome::FulfillmentFailed { .. }));
    let stored = h.store.payment(&payment.id).await.unwrap();
    assert!(!stored.activation().is_applied());
    assert_eq!(stored.activation().proxy_slots.len(), 2);
    assert!(stored.activation().last_error.is_some());

    let second = h
        .deliver(
            PaymentProvider::YooKassa,
            yookassa_event("payment.succeeded", "succeeded", "kassa-short", "ord-short"),
        )
        .await;

    assert_eq!(second, ReconcileOutcome::Fulfilled { payment_id: payment.id });
    assert_eq!(h.control_plane.slots_for(&client).len(), 3);
    assert_eq!(h.control_plane.provision_calls(), 2);
    let stored = h.store.payment(&payment.id).await.unwrap();
    assert!(stored.activation().is_applied());
    let notified: Vec<String> = h.control_plane.slots_for(&client).into_iter().map(|s| s.0).collect();
    assert_eq!(stored.activation().proxy_slots.len(), 2);
    assert!(stored
        .activation()
        .proxy_slots
        .iter()
        .all(|slot| notified.contains(slot)));
}

#[tokio::test]
async fn extra_devices_add_to_current_entitlement() {
    let h = Harness::new();
    let client = h.client(None).await;
    let tariff = h.monthly_tariff();
    let activation = h
        .pending(
            client,
            PaymentProvider::Platega,
            "ord-base",
            None,
            rub(990),
            PaymentSubject::Tariff(tariff),
        )
        .await;
    h.deliver(PaymentProvider::Platega, platega_confirmed("tx-base", "ord-base"))
        .await;
    assert!(h.store.payment(&activation.id).await.unwrap().activation().is_applied());

    let extra = h
        .pending(
            client,
            PaymentProvider::Platega,
            "ord-devices",
            None,
            rub(100),
            PaymentSubject::ExtraOption(ExtraOption::Devices { devices: 2 }),
        )
        .await;
    let outcome = h
        .deliver(PaymentProvider::Platega, platega_confirmed("tx-devices", "ord-devices"))
        .await;

    assert_eq!(outcome, ReconcileOutcome::Fulfilled { payment_id: extra.id });
    let entitlement = h.control_plane.entitlement(&client).unwrap();
    assert_eq!(entitlement.device_limit, Some(5));
}

#[tokio::test]
async fn failed_grant_is_retried_by_sweeper() {
    let h = Harness::new();
    let client = h.client(None).await;
    let tariff = h.monthly_tariff();
    let payment = h
        .pending(
            client,
            PaymentProvider::Platega,
            "ord-retry",
            None,
            rub(990),
            PaymentSubject::Tariff(tariff),
        )
        .await;
    h.control_plane.fail_next_grants(1);

    let outcome = h
        .deliver(PaymentProvider::Platega, platega_confirmed("tx-retry", "ord-retry"))
        .await;
    assert!(matches!(outcome, ReconcileOutcome::FulfillmentFailed { .. }));

    let stored = h.store.payment(&payment.id).await.unwrap();
    assert_eq!(stored.status, PaymentStatus::Paid);
    assert!(!stored.activation().is_applied());
    assert!(stored.activation().last_error.is_some());

    let sweeper = SweepUnfulfilledHandler::new(
        h.store.clone(),
        h.fulfillment.clone(),
        chrono::Duration::zero(),
        10,
    );
    tokio::time::sleep(Duration::from_millis(5)).await;
    let report = sweeper.sweep_once().await.unwrap();

    assert_eq!(report.fulfilled, 1);
    assert!(h.store.payment(&payment.id).await.unwrap().activation().is_applied());
    assert_eq!(h.control_plane.grant_calls(), 2);
}

// =============================================================================
// Referrals
// =============================================================================

#[tokio::test]
async fn referral_rewards_are_credited_once_per_level() {
    let h = Harness::with_levels(ReferralLevels::new(rub(10), rub(5), Decimal::ZERO).unwrap());
    let grandparent = h.client(None).await;
    let parent = h.client(Some(grandparent)).await;
    let buyer = h.client(Some(parent)).await;
    let payment = h
        .pending(buyer, PaymentProvider::Platega, "ord-ref", None, rub(1000), PaymentSubject::TopUp)
        .await;

    for _ in 0..3 {
        h.deliver(PaymentProvider::Platega, platega_confirmed("tx-ref", "ord-ref"))
            .await;
    }

    assert_eq!(h.store.balance(&parent).await, rub(100));
    assert_eq!(h.store.balance(&grandparent).await, rub(50));
    assert_eq!(h.store.balance(&buyer).await, rub(1000));

    let credits = h.store.referral_credits().await;
    assert_eq!(credits.len(), 2);
    assert!(credits.iter().all(|c| c.payment_id == payment.id));
    assert!(credits
        .iter()
        .any(|c| c.referrer_id == parent && c.level == ReferralLevel::new(1).unwrap()));
    assert!(credits
        .iter()
        .any(|c| c.referrer_id == grandparent && c.level == ReferralLevel::new(2).unwrap()));
}

#[tokio::test]
async fn referral_failure_does_not_block_payment() {
    let h = Harness::with_levels(ReferralLevels::new(rub(10), Decimal::ZERO, Decimal::ZERO).unwrap());
    let parent = h.client(None).await;
    let buyer = h.client(Some(parent)).await;
    h.store.fail_credits_for(parent).await;
    let payment = h
        .pending(buyer, PaymentProvider::Platega, "ord-reffail", None, rub(200), PaymentSubject::TopUp)
        .await;

    let outcome = h
        .deliver(PaymentProvider::Platega, platega_confirmed("tx-reffail", "ord-reffail"))
        .await;

    assert_eq!(outcome, ReconcileOutcome::TopUpCredited { payment_id: payment.id });
    assert_eq!(h.store.balance(&buyer).await, rub(200));
    assert!(h.store.referral_credits().await.is_empty());
}

// =============================================================================
// Status Transitions
// =============================================================================

#[tokio::test]
async fn paid_payment_is_not_downgraded() {
    let h = Harness::new();
    let client = h.client(None).await;
    let payment = h
        .pending(
            client,
            PaymentProvider::YooKassa,
            "ord-final",
            Some("kassa-final"),
            rub(990),
            PaymentSubject::TopUp,
        )
        .await;

    h.deliver(
        PaymentProvider::YooKassa,
        yookassa_event("payment.succeeded", "succeeded", "kassa-final", "ord-final"),
    )
    .await;
    let late = h
        .deliver(
            PaymentProvider::YooKassa,
            yookassa_event("payment.canceled", "canceled", "kassa-final", "ord-final"),
        )
        .await;

    assert_eq!(late, ReconcileOutcome::AlreadyProcessed { payment_id: payment.id });
    let stored = h.store.payment(&payment.id).await.unwrap();
    assert_eq!(stored.status, PaymentStatus::Paid);
    assert!(!h.notifier.sent_to(&client).contains(&NotificationTemplate::PaymentFailed));
}

#[tokio::test]
async fn canceled_payment_is_marked_failed_and_notified_once() {
    let h = Harness::new();
    let client = h.client(None).await;
    let payment = h
        .pending(
            client,
            PaymentProvider::YooKassa,
            "ord-cancel",
            Some("kassa-cancel"),
            rub(990),
            PaymentSubject::TopUp,
        )
        .await;

    let first = h
        .deliver(
            PaymentProvider::YooKassa,
            yookassa_event("payment.canceled", "canceled", "kassa-cancel", "ord-cancel"),
        )
        .await;
    let second = h
        .deliver(
            PaymentProvider::YooKassa,
            yookassa_event("payment.canceled", "canceled", "kassa-cancel", "ord-cancel"),
        )
        .await;

    assert_eq!(first, ReconcileOutcome::MarkedFailed { payment_id: payment.id });
    assert_eq!(second, ReconcileOutcome::AlreadyProcessed { payment_id: payment.id });
    assert_eq!(h.notifier.sent_to(&client), vec![NotificationTemplate::PaymentFailed]);
    assert_eq!(h.store.balance(&client).await, Decimal::ZERO);
}

#[tokio::test]
async fn intermediate_status_is_ignored() {
    let h = Harness::new();
    let client = h.client(None).await;
    let payment = h
        .pending(
            client,
            PaymentProvider::YooKassa,
            "ord-wait",
            Some("kassa-wait"),
            rub(990),
            PaymentSubject::TopUp,
        )
        .await;

    let outcome = h
        .deliver(
            PaymentProvider::YooKassa,
            yookassa_event("payment.waiting_for_capture", "waiting_for_capture", "kassa-wait", "ord-wait"),
        )
        .await;

    assert!(matches!(outcome, ReconcileOutcome::Ignored { .. }));
    let stored = h.store.payment(&payment.id).await.unwrap();
    assert_eq!(stored.status, PaymentStatus::Pending);
}

// =============================================================================
// Correlation
// =============================================================================

#[tokio::test]
async fn transaction_id_wins_over_order_id() {
    let h = Harness::new();
    let client = h.client(None).await;
    let by_transaction = h
        .pending(
            client,
            PaymentProvider::YooKassa,
            "ord-one",
            Some("kassa-shared"),
            rub(990),
            PaymentSubject::TopUp,
        )
        .await;
    let by_order = h
        .pending(client, PaymentProvider::YooKassa, "ord-two", None, rub(990), PaymentSubject::TopUp)
        .await;

    let outcome = h
        .deliver(
            PaymentProvider::YooKassa,
            yookassa_event("payment.succeeded", "succeeded", "kassa-shared", "ord-two"),
        )
        .await;

    assert_eq!(outcome, ReconcileOutcome::TopUpCredited { payment_id: by_transaction.id });
    assert_eq!(
        h.store.payment(&by_order.id).await.unwrap().status,
        PaymentStatus::Pending
    );
}

#[tokio::test]
async fn other_provider_payment_is_not_matched() {
    let h = Harness::new();
    let client = h.client(None).await;
    h.pending(client, PaymentProvider::Platega, "ord-cross", None, rub(500), PaymentSubject::TopUp)
        .await;

    let outcome = h
        .deliver(
            PaymentProvider::YooKassa,
            yookassa_event("payment.succeeded", "succeeded", "kassa-x", "ord-cross"),
        )
        .await;

    assert_eq!(outcome, ReconcileOutcome::NotFound);
    assert_eq!(h.store.balance(&client).await, Decimal::ZERO);
}

#[tokio::test]
async fn every_delivery_is_journaled() {
    let h = Harness::new();
    let client = h.client(None).await;
    h.pending(client, PaymentProvider::Platega, "ord-journal", None, rub(500), PaymentSubject::TopUp)
        .await;

    h.deliver(PaymentProvider::Platega, platega_confirmed("tx-j", "ord-journal"))
        .await;
    h.deliver(PaymentProvider::Platega, platega_confirmed("tx-j", "ord-journal"))
        .await;
    h.deliver(PaymentProvider::Platega, json!("not an object")).await;

    let outcomes: Vec<String> = h
        .store
        .deliveries()
        .await
        .into_iter()
        .map(|d| d.outcome)
        .collect();
    assert_eq!(outcomes, vec!["top_up_credited", "already_processed", "malformed"]);
}
