//! Client notification templates.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    TopUpCredited,
    TariffActivated,
    ProxySlotsProvisioned,
    ExtraOptionGranted,
    PaymentFailed,
    ReferralRewardCredited,
}

impl NotificationTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationTemplate::TopUpCredited => "top_up_credited",
            NotificationTemplate::TariffActivated => "tariff_activated",
            NotificationTemplate::ProxySlotsProvisioned => "proxy_slots_provisioned",
            NotificationTemplate::ExtraOptionGranted => "extra_option_granted",
            NotificationTemplate::PaymentFailed => "payment_failed",
            NotificationTemplate::ReferralRewardCredited => "referral_reward_credited",
        }
    }
}

impl fmt::Display for NotificationTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
