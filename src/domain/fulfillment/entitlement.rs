//! Client entitlement as held by the control plane.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::foundation::Timestamp;
use crate::domain::payment::ExtraOption;

use super::Tariff;

pub const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

/// Limits and membership of one client.
///
/// `None` limits mean unlimited; [`Entitlement::none`] is the empty grant.
///
/// Merges never lower a limit: unlimited stays unlimited and finite limits
/// only grow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entitlement {
    pub traffic_limit_bytes: Option<u64>,
    pub device_limit: Option<u32>,
    pub expires_at: Option<Timestamp>,
    #[serde(default)]
    pub server_groups: BTreeSet<String>,
}

impl Entitlement {
    /// A client with no subscription: zero limits, no expiry.
    pub fn none() -> Self {
        Self {
            traffic_limit_bytes: Some(0),
            device_limit: Some(0),
            expires_at: None,
            server_groups: BTreeSet::new(),
        }
    }

    pub fn is_active(&self, now: Timestamp) -> bool {
        self.expires_at.map_or(false, |expiry| expiry.is_after(&now))
    }

    /// Entitlement after buying `tariff` at `now`.
    ///
    /// An active subscription is extended from its current expiry, keeps the
    /// larger of each limit and gains the tariff's server groups. An expired
    /// one starts over from `now` with exactly the tariff's terms.
    pub fn extended_by(&self, tariff: &Tariff, now: Timestamp) -> Self {
        let tariff_traffic = tariff
            .traffic_limit_gb
            .map(|gb| gb.saturating_mul(BYTES_PER_GB));
        let tariff_groups: BTreeSet<String> = tariff.server_groups.iter().cloned().collect();

        if !self.is_active(now) {
            return Self {
                traffic_limit_bytes: tariff_traffic,
                device_limit: tariff.device_limit,
                expires_at: Some(now.add_days(i64::from(tariff.duration_days))),
                server_groups: tariff_groups,
            };
        }

        let base = self.expires_at.map_or(now, |current| current.max(now));
        let mut server_groups = self.server_groups.clone();
        server_groups.extend(tariff_groups);

        Self {
            traffic_limit_bytes: max_limit(self.traffic_limit_bytes, tariff_traffic),
            device_limit: max_limit(self.device_limit, tariff.device_limit),
            expires_at: Some(base.add_days(i64::from(tariff.duration_days))),
            server_groups,
        }
    }

    /// Entitlement after adding an extra option on top of the current one.
    pub fn with_extra(&self, option: &ExtraOption) -> Self {
        let mut next = self.clone();
        match option {
            ExtraOption::Traffic { traffic_gb } => {
                next.traffic_limit_bytes = self
                    .traffic_limit_bytes
                    .map(|bytes| bytes.saturating_add(traffic_gb.saturating_mul(BYTES_PER_GB)));
            }
            ExtraOption::Devices { devices } => {
                next.device_limit = self.device_limit.map(|n| n.saturating_add(*devices));
            }
            ExtraOption::Servers { server_groups } => {
                next.server_groups.extend(server_groups.iter().cloned());
            }
        }
        next
    }
}

/// Larger of two limits where `None` is unlimited.
fn max_limit<T: Ord>(current: Option<T>, offered: Option<T>) -> Option<T> {
    match (current, offered) {
        (Some(a), Some(b)) => Some(a.max(b)),
        _ => None,
    }
}
