//! PostgreSQL implementation of TariffCatalog.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ProxyTariffId, TariffId};
use crate::domain::fulfillment::{ProxyTariff, Tariff};
use crate::ports::TariffCatalog;

pub struct PostgresTariffCatalog {
    pool: PgPool,
}

impl PostgresTariffCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TariffRow {
    id: Uuid,
    name: String,
    duration_days: i32,
    traffic_limit_gb: Option<i64>,
    device_limit: Option<i32>,
    server_groups: Vec<String>,
}

impl TryFrom<TariffRow> for Tariff {
    type Error = DomainError;

    fn try_from(row: TariffRow) -> Result<Self, Self::Error> {
        Ok(Tariff {
            id: TariffId::from_uuid(row.id),
            name: row.name,
            duration_days: non_negative(row.duration_days, "duration_days")?,
            traffic_limit_gb: row
                .traffic_limit_gb
                .map(|gb| {
                    u64::try_from(gb).map_err(|_| {
                        DomainError::database(format!("Invalid traffic_limit_gb: {}", gb))
                    })
                })
                .transpose()?,
            device_limit: row
                .device_limit
                .map(|d| non_negative(d, "device_limit"))
                .transpose()?,
            server_groups: row.server_groups,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProxyTariffRow {
    id: Uuid,
    name: String,
    slot_count: i32,
    duration_days: i32,
}

impl TryFrom<ProxyTariffRow> for ProxyTariff {
    type Error = DomainError;

    fn try_from(row: ProxyTariffRow) -> Result<Self, Self::Error> {
        Ok(ProxyTariff {
            id: ProxyTariffId::from_uuid(row.id),
            name: row.name,
            slot_count: non_negative(row.slot_count, "slot_count")?,
            duration_days: non_negative(row.duration_days, "duration_days")?,
        })
    }
}

fn non_negative(value: i32, column: &str) -> Result<u32, DomainError> {
    u32::try_from(value).map_err(|_| DomainError::database(format!("Invalid {}: {}", column, value)))
}

#[async_trait]
impl TariffCatalog for PostgresTariffCatalog {
    async fn find_tariff(&self, id: &TariffId) -> Result<Option<Tariff>, DomainError> {
        let row: Option<TariffRow> = sqlx::query_as(
            r#"
            SELECT id, name, duration_days, traffic_limit_gb, device_limit, server_groups
            FROM tariffs
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find tariff: {}", e)))?;

        row.map(Tariff::try_from).transpose()
    }

    async fn find_proxy_tariff(
        &self,
        id: &ProxyTariffId,
    ) -> Result<Option<ProxyTariff>, DomainError> {
        let row: Option<ProxyTariffRow> = sqlx::query_as(
            "SELECT id, name, slot_count, duration_days FROM proxy_tariffs WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find proxy tariff: {}", e)))?;

        row.map(ProxyTariff::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tariff_row() -> TariffRow {
        TariffRow {
            id: Uuid::new_v4(),
            name: "Monthly".to_string(),
            duration_days: 30,
            traffic_limit_gb: Some(100),
            device_limit: None,
            server_groups: vec!["eu".to_string()],
        }
    }

    #[test]
    fn tariff_row_converts() {
        let tariff = Tariff::try_from(tariff_row()).unwrap();
        assert_eq!(tariff.duration_days, 30);
        assert_eq!(tariff.traffic_limit_gb, Some(100));
        assert_eq!(tariff.device_limit, None);
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut row = tariff_row();
        row.duration_days = -1;
        assert!(Tariff::try_from(row).is_err());
    }

    #[test]
    fn negative_slot_count_is_rejected() {
        let row = ProxyTariffRow {
            id: Uuid::new_v4(),
            name: "Proxy".to_string(),
            slot_count: -3,
            duration_days: 30,
        };
        assert!(ProxyTariff::try_from(row).is_err());
    }
}
