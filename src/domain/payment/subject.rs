//! What a payment buys.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{ProxyTariffId, TariffId};

/// Extra-option descriptor embedded in payment metadata under `extraOption`.
///
/// Each kind adds to the client's existing entitlement rather than replacing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExtraOption {
    /// Additional traffic quota in gigabytes.
    Traffic {
        #[serde(rename = "trafficGb")]
        traffic_gb: u64,
    },
    /// Additional simultaneous devices.
    Devices { devices: u32 },
    /// Additional server groups (squads) to join.
    Servers {
        #[serde(rename = "serverGroups")]
        server_groups: Vec<String>,
    },
}

impl ExtraOption {
    pub fn kind(&self) -> &'static str {
        match self {
            ExtraOption::Traffic { .. } => "traffic",
            ExtraOption::Devices { .. } => "devices",
            ExtraOption::Servers { .. } => "servers",
        }
    }
}

/// The product a payment is attached to. Fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentSubject {
    /// Plain balance top-up; credited together with the PAID transition.
    TopUp,
    Tariff(TariffId),
    ProxyTariff(ProxyTariffId),
    ExtraOption(ExtraOption),
}

/// Discriminant of [`PaymentSubject`] for logging and routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubjectKind {
    TopUp,
    Tariff,
    ProxyTariff,
    ExtraOption,
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubjectKind::TopUp => "top_up",
            SubjectKind::Tariff => "tariff",
            SubjectKind::ProxyTariff => "proxy_tariff",
            SubjectKind::ExtraOption => "extra_option",
        };
        f.write_str(s)
    }
}

impl PaymentSubject {
    /// Builds the subject from the stored references.
    ///
    /// Priority when more than one reference is present:
    /// extra option > proxy tariff > tariff > top-up.
    pub fn resolve(
        tariff_id: Option<TariffId>,
        proxy_tariff_id: Option<ProxyTariffId>,
        extra_option: Option<ExtraOption>,
    ) -> Self {
        if let Some(option) = extra_option {
            PaymentSubject::ExtraOption(option)
        } else if let Some(id) = proxy_tariff_id {
            PaymentSubject::ProxyTariff(id)
        } else if let Some(id) = tariff_id {
            PaymentSubject::Tariff(id)
        } else {
            PaymentSubject::TopUp
        }
    }

    pub fn kind(&self) -> SubjectKind {
        match self {
            PaymentSubject::TopUp => SubjectKind::TopUp,
            PaymentSubject::Tariff(_) => SubjectKind::Tariff,
            PaymentSubject::ProxyTariff(_) => SubjectKind::ProxyTariff,
            PaymentSubject::ExtraOption(_) => SubjectKind::ExtraOption,
        }
    }

    /// Whether fulfillment goes through the activation claim.
    pub fn requires_activation(&self) -> bool {
        !matches!(self, PaymentSubject::TopUp)
    }

    pub fn tariff_id(&self) -> Option<TariffId> {
        match self {
            PaymentSubject::Tariff(id) => Some(*id),
            _ => None,
        }
    }

    pub fn proxy_tariff_id(&self) -> Option<ProxyTariffId> {
        match self {
            PaymentSubject::ProxyTariff(id) => Some(*id),
            _ => None,
        }
    }
}
