//! TransitionPaymentHandler - conditional PENDING → PAID / FAILED moves.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::payment::{Payment, PaymentTransition, TransitionOutcome};
use crate::ports::PaymentRepository;

pub struct TransitionPaymentHandler {
    payments: Arc<dyn PaymentRepository>,
}

impl TransitionPaymentHandler {
    pub fn new(payments: Arc<dyn PaymentRepository>) -> Self {
        Self { payments }
    }

    /// Moves the payment to PAID, crediting the balance for top-ups in the
    /// same write. `AlreadyTerminal` is the normal duplicate-delivery result.
    pub async fn mark_paid(
        &self,
        payment: &Payment,
        transaction_id: Option<String>,
    ) -> Result<TransitionOutcome, DomainError> {
        match payment.paid_transition(transaction_id, Timestamp::now()) {
            Ok(transition) => self.apply(payment, transition).await,
            Err(_) => Ok(TransitionOutcome::AlreadyTerminal),
        }
    }

    /// Moves the payment to FAILED. A PAID payment is left untouched.
    pub async fn mark_failed(
        &self,
        payment: &Payment,
        transaction_id: Option<String>,
    ) -> Result<TransitionOutcome, DomainError> {
        match payment.failed_transition(transaction_id, Timestamp::now()) {
            Ok(transition) => self.apply(payment, transition).await,
            Err(_) => Ok(TransitionOutcome::AlreadyTerminal),
        }
    }

    async fn apply(
        &self,
        payment: &Payment,
        transition: PaymentTransition,
    ) -> Result<TransitionOutcome, DomainError> {
        let rows = self.payments.try_transition(&transition).await?;
        let outcome = TransitionOutcome::from_rows(rows);

        tracing::info!(
            payment_id = %payment.id,
            provider = %payment.provider,
            target = %transition.target,
            changed = outcome.changed(),
            "Payment transition applied"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPaymentStore;
    use crate::domain::foundation::{ClientId, OrderId};
    use crate::domain::payment::{NewPayment, PaymentProvider, PaymentStatus, PaymentSubject};
    use rust_decimal::Decimal;

    async fn setup(subject: PaymentSubject) -> (Arc<InMemoryPaymentStore>, Payment) {
        let store = Arc::new(InMemoryPaymentStore::new());
        let client_id = ClientId::new();
        store.insert_client(client_id, None).await;
        let payment = Payment::new_pending(NewPayment {
            client_id,
            provider: PaymentProvider::Platega,
            order_id: OrderId::generate(),
            external_id: None,
            amount: Decimal::new(500, 0),
            currency: "RUB".into(),
            subject,
        })
        .unwrap();
        store.insert_payment(payment.clone()).await;
        (store, payment)
    }

    #[tokio::test]
    async fn second_paid_transition_is_noop() {
        let (store, payment) = setup(PaymentSubject::TopUp).await;
        let handler = TransitionPaymentHandler::new(store.clone());

        let first = handler.mark_paid(&payment, Some("txn-1".into())).await.unwrap();
        let second = handler.mark_paid(&payment, Some("txn-1".into())).await.unwrap();

        assert_eq!(first, TransitionOutcome::Changed);
        assert_eq!(second, TransitionOutcome::AlreadyTerminal);
        assert_eq!(store.balance(&payment.client_id).await, Decimal::new(500, 0));

        let stored = store.payment(&payment.id).await.unwrap();
        assert_eq!(stored.status, PaymentStatus::Paid);
        assert_eq!(stored.external_id.as_deref(), Some("txn-1"));
        assert!(stored.paid_at.is_some());
    }

    #[tokio::test]
    async fn failed_after_paid_does_not_downgrade() {
        let (store, payment) = setup(PaymentSubject::TopUp).await;
        let handler = TransitionPaymentHandler::new(store.clone());
        handler.mark_paid(&payment, None).await.unwrap();

        // Stale copy still says pending; the store must refuse.
        let outcome = handler.mark_failed(&payment, None).await.unwrap();

        assert_eq!(outcome, TransitionOutcome::AlreadyTerminal);
        let stored = store.payment(&payment.id).await.unwrap();
        assert_eq!(stored.status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn locally_terminal_payment_skips_the_store() {
        let (store, mut payment) = setup(PaymentSubject::TopUp).await;
        payment.status = PaymentStatus::Failed;
        let handler = TransitionPaymentHandler::new(store);

        let outcome = handler.mark_paid(&payment, None).await.unwrap();

        assert_eq!(outcome, TransitionOutcome::AlreadyTerminal);
    }
}
