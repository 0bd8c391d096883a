//! PostgreSQL implementation of PaymentRepository.
//!
//! All writes are conditional updates: status moves on `status = 'pending'`,
//! activation writes on the `version` read by the caller. Activation writes
//! strip only the activation keys from the metadata JSONB before merging the
//! new values, leaving every other key as stored.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    ClientId, DomainError, ErrorCode, OrderId, PaymentId, ProxyTariffId, TariffId, Timestamp,
};
use crate::domain::payment::{
    ActivationState, Payment, PaymentError, PaymentMetadata, PaymentProvider, PaymentStatus,
    PaymentSubject, PaymentTransition,
};
use crate::ports::PaymentRepository;

const PAYMENT_COLUMNS: &str = "id, client_id, provider, external_id, order_id, amount, currency, \
     tariff_id, proxy_tariff_id, status, metadata, created_at, paid_at, version";

pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        provider: Option<PaymentProvider>,
        key: &str,
    ) -> Result<Option<Payment>, DomainError> {
        let sql = format!("SELECT {} FROM payments WHERE {}", PAYMENT_COLUMNS, clause);
        let mut query = sqlx::query_as::<_, PaymentRow>(&sql);
        if let Some(provider) = provider {
            query = query.bind(provider.as_str());
        }
        let row = query
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to find payment: {}", e)))?;

        row.map(Payment::try_from).transpose()
    }
}

/// Database row representation of a payment.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    client_id: Uuid,
    provider: String,
    external_id: Option<String>,
    order_id: String,
    amount: Decimal,
    currency: String,
    tariff_id: Option<Uuid>,
    proxy_tariff_id: Option<Uuid>,
    status: String,
    metadata: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    paid_at: Option<DateTime<Utc>>,
    version: i64,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let id = PaymentId::from_uuid(row.id);
        let provider: PaymentProvider = row.provider.parse().map_err(|e| {
            DomainError::database(format!("Invalid provider on payment {}: {}", id, e))
        })?;
        let status = PaymentStatus::parse(&row.status).map_err(|e| {
            DomainError::database(format!("Invalid status on payment {}: {}", id, e))
        })?;
        let (metadata, repaired) = PaymentMetadata::from_stored_value(row.metadata.unwrap_or_default())
            .map_err(|e| {
                tracing::error!(payment_id = %id, error = %e, "Unreadable payment metadata");
                DomainError::from(PaymentError::malformed_metadata(id, e.to_string()))
            })?;
        if !repaired.is_empty() {
            tracing::error!(
                payment_id = %id,
                keys = ?repaired,
                "Malformed activation metadata reset on read"
            );
        }
        let order_id = OrderId::new(row.order_id).map_err(|e| {
            DomainError::database(format!("Invalid order_id on payment {}: {}", id, e))
        })?;

        let subject = PaymentSubject::resolve(
            row.tariff_id.map(TariffId::from_uuid),
            row.proxy_tariff_id.map(ProxyTariffId::from_uuid),
            metadata.extra_option.clone(),
        );

        Ok(Payment {
            id,
            client_id: ClientId::from_uuid(row.client_id),
            provider,
            external_id: row.external_id,
            order_id,
            amount: row.amount,
            currency: row.currency,
            subject,
            status,
            metadata,
            created_at: Timestamp::from_datetime(row.created_at),
            paid_at: row.paid_at.map(Timestamp::from_datetime),
            version: row.version,
        })
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn find_by_id(&self, id: &PaymentId) -> Result<Option<Payment>, DomainError> {
        let sql = format!("SELECT {} FROM payments WHERE id = $1", PAYMENT_COLUMNS);
        let row: Option<PaymentRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to find payment: {}", e)))?;

        row.map(Payment::try_from).transpose()
    }

    async fn find_by_external_id(
        &self,
        provider: PaymentProvider,
        external_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        self.fetch_one_where("provider = $1 AND external_id = $2", Some(provider), external_id)
            .await
    }

    async fn find_by_order_id(
        &self,
        provider: PaymentProvider,
        order_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        self.fetch_one_where("provider = $1 AND order_id = $2", Some(provider), order_id)
            .await
    }

    async fn try_transition(&self, transition: &PaymentTransition) -> Result<u64, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(format!("Failed to begin transaction: {}", e)))?;

        let paid_at = (transition.target == PaymentStatus::Paid).then(|| *transition.at.as_datetime());

        let result = sqlx::query(
            r#"
            UPDATE payments SET
                status = $2,
                paid_at = COALESCE($3, paid_at),
                external_id = COALESCE(external_id, $4),
                version = version + 1
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(transition.payment_id.as_uuid())
        .bind(transition.target.as_str())
        .bind(paid_at)
        .bind(&transition.transaction_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database(format!("Failed to transition payment: {}", e)))?;

        let rows = result.rows_affected();

        if rows > 0 {
            if let Some(credit) = &transition.balance_credit {
                let credited = sqlx::query("UPDATE clients SET balance = balance + $2 WHERE id = $1")
                    .bind(credit.client_id.as_uuid())
                    .bind(credit.amount)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| DomainError::database(format!("Failed to credit balance: {}", e)))?;

                if credited.rows_affected() == 0 {
                    // Dropping the transaction rolls back the status change too.
                    return Err(DomainError::new(
                        ErrorCode::ClientNotFound,
                        format!("Client not found: {}", credit.client_id),
                    ));
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::database(format!("Failed to commit transition: {}", e)))?;

        Ok(rows)
    }

    async fn compare_and_set_activation(
        &self,
        id: &PaymentId,
        expected_version: i64,
        state: &ActivationState,
    ) -> Result<Option<i64>, DomainError> {
        let keys: Vec<String> = ActivationState::KEYS.iter().map(|k| k.to_string()).collect();

        sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE payments SET
                metadata = (COALESCE(metadata, '{}'::jsonb) - $3::text[]) || $4::jsonb,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING version
            "#,
        )
        .bind(id.as_uuid())
        .bind(expected_version)
        .bind(keys)
        .bind(PaymentMetadata::activation_patch(state))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to write activation state: {}", e)))
    }

    async fn find_unfulfilled_paid(
        &self,
        paid_before: Timestamp,
        limit: u32,
    ) -> Result<Vec<Payment>, DomainError> {
        let sql = format!(
            r#"
            SELECT {} FROM payments
            WHERE status = 'paid'
              AND paid_at < $1
              AND (tariff_id IS NOT NULL
                   OR proxy_tariff_id IS NOT NULL
                   OR metadata -> 'extraOption' IS NOT NULL)
              AND metadata ->> 'activationAppliedAt' IS NULL
            ORDER BY paid_at
            LIMIT $2
            "#,
            PAYMENT_COLUMNS
        );

        let rows: Vec<PaymentRow> = sqlx::query_as(&sql)
            .bind(paid_before.as_datetime())
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to list unfulfilled payments: {}", e)))?;

        rows.into_iter().map(Payment::try_from).collect()
    }
}
