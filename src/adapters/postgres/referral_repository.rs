//! PostgreSQL implementation of ReferralRepository.
//!
//! The credit row and the referrer's balance increment share a transaction;
//! the `(referrer_id, payment_id, level)` unique key turns a repeated credit
//! into a no-op.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{ClientId, DomainError, ErrorCode};
use crate::domain::referral::ReferralCredit;
use crate::ports::{CreditResult, ReferralRepository};

pub struct PostgresReferralRepository {
    pool: PgPool,
}

impl PostgresReferralRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferralRepository for PostgresReferralRepository {
    async fn find_referrer(&self, client_id: &ClientId) -> Result<Option<ClientId>, DomainError> {
        let referrer: Option<Option<Uuid>> =
            sqlx::query_scalar("SELECT referred_by FROM clients WHERE id = $1")
                .bind(client_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| DomainError::database(format!("Failed to find referrer: {}", e)))?;

        Ok(referrer.flatten().map(ClientId::from_uuid))
    }

    async fn record_credit(&self, credit: &ReferralCredit) -> Result<CreditResult, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(format!("Failed to begin transaction: {}", e)))?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO referral_credits (
                id, referrer_id, source_client_id, payment_id, level, amount, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (referrer_id, payment_id, level) DO NOTHING
            "#,
        )
        .bind(credit.id.as_uuid())
        .bind(credit.referrer_id.as_uuid())
        .bind(credit.source_client_id.as_uuid())
        .bind(credit.payment_id.as_uuid())
        .bind(i16::from(credit.level.value()))
        .bind(credit.amount)
        .bind(credit.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert referral credit: {}", e)))?;

        if inserted.rows_affected() == 0 {
            return Ok(CreditResult::AlreadyCredited);
        }

        let credited = sqlx::query("UPDATE clients SET balance = balance + $2 WHERE id = $1")
            .bind(credit.referrer_id.as_uuid())
            .bind(credit.amount)
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::database(format!("Failed to credit referrer: {}", e)))?;

        if credited.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::ClientNotFound,
                format!("Referrer not found: {}", credit.referrer_id),
            ));
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::database(format!("Failed to commit referral credit: {}", e)))?;

        Ok(CreditResult::Inserted)
    }
}
