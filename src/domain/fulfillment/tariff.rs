//! Tariff definitions.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ProxyTariffId, TariffId, Timestamp};

/// VPN subscription tariff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tariff {
    pub id: TariffId,
    pub name: String,
    pub duration_days: u32,
    /// `None` = unlimited.
    pub traffic_limit_gb: Option<u64>,
    /// `None` = unlimited.
    pub device_limit: Option<u32>,
    pub server_groups: Vec<String>,
}

/// Proxy package: a number of proxy credentials valid for a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyTariff {
    pub id: ProxyTariffId,
    pub name: String,
    pub slot_count: u32,
    pub duration_days: u32,
}

impl ProxyTariff {
    pub fn slot_request(&self, now: Timestamp) -> ProxySlotRequest {
        ProxySlotRequest {
            proxy_tariff_id: self.id,
            count: self.slot_count,
            expires_at: now.add_days(i64::from(self.duration_days)),
        }
    }
}

/// Control-plane request to create proxy credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxySlotRequest {
    pub proxy_tariff_id: ProxyTariffId,
    pub count: u32,
    pub expires_at: Timestamp,
}

/// Identifier of a provisioned proxy credential, assigned by the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxySlotId(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn slot_request_expires_after_duration() {
        let tariff = ProxyTariff {
            id: ProxyTariffId::new(),
            name: "3 proxies / 30 days".into(),
            slot_count: 3,
            duration_days: 30,
        };
        let now = Timestamp::now();

        let request = tariff.slot_request(now);

        assert_eq!(request.count, 3);
        assert_eq!(request.proxy_tariff_id, tariff.id);
        assert_eq!(request.expires_at.duration_since(&now), Duration::days(30));
    }
}
