//! Referral reward configuration

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::referral::ReferralLevels;

use super::error::ValidationError;

/// Reward percentages per referral level; 0 disables a level.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReferralConfig {
    #[serde(default)]
    pub level1_percent: Decimal,
    #[serde(default)]
    pub level2_percent: Decimal,
    #[serde(default)]
    pub level3_percent: Decimal,
}

impl ReferralConfig {
    pub fn levels(&self) -> Result<ReferralLevels, ValidationError> {
        self.validate()?;
        ReferralLevels::new(self.level1_percent, self.level2_percent, self.level3_percent)
            .map_err(|_| ValidationError::InvalidReferralPercent("referral"))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let checks = [
            ("referral.level1_percent", self.level1_percent),
            ("referral.level2_percent", self.level2_percent),
            ("referral.level3_percent", self.level3_percent),
        ];
        for (name, percent) in checks {
            if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
                return Err(ValidationError::InvalidReferralPercent(name));
            }
        }
        Ok(())
    }
}
