//! PostgreSQL implementation of WebhookDeliveryRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::{WebhookDeliveryRecord, WebhookDeliveryRepository};

pub struct PostgresWebhookDeliveryRepository {
    pool: PgPool,
}

impl PostgresWebhookDeliveryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookDeliveryRepository for PostgresWebhookDeliveryRepository {
    async fn record(&self, record: WebhookDeliveryRecord) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO webhook_deliveries (
                id, provider, transaction_id, payment_id, outcome, detail, payload, received_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(record.provider.as_str())
        .bind(&record.transaction_id)
        .bind(record.payment_id.map(|id| *id.as_uuid()))
        .bind(&record.outcome)
        .bind(&record.detail)
        .bind(&record.payload)
        .bind(record.received_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to record webhook delivery: {}", e)))?;

        Ok(())
    }

    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM webhook_deliveries WHERE received_at < $1")
            .bind(timestamp.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to prune webhook deliveries: {}", e)))?;

        Ok(result.rows_affected())
    }
}
