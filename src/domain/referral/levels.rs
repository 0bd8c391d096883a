//! Referral percent table.

use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Position in the referrer chain, 1 = direct referrer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferralLevel(u8);

impl ReferralLevel {
    pub const MAX: u8 = 3;

    pub fn new(level: u8) -> Result<Self, ValidationError> {
        if (1..=Self::MAX).contains(&level) {
            Ok(Self(level))
        } else {
            Err(ValidationError::out_of_range(
                "referral_level",
                format!("must be between 1 and {}", Self::MAX),
            ))
        }
    }

    pub fn all() -> impl Iterator<Item = ReferralLevel> {
        (1..=Self::MAX).map(ReferralLevel)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    fn index(&self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl fmt::Display for ReferralLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configured reward percentage for each level. Zero disables a level.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReferralLevels {
    percents: [Decimal; ReferralLevel::MAX as usize],
}

impl ReferralLevels {
    pub fn new(level1: Decimal, level2: Decimal, level3: Decimal) -> Result<Self, ValidationError> {
        let percents = [level1, level2, level3];
        for (i, percent) in percents.iter().enumerate() {
            if *percent < Decimal::ZERO || *percent > Decimal::ONE_HUNDRED {
                return Err(ValidationError::out_of_range(
                    format!("level{}_percent", i + 1),
                    "must be between 0 and 100",
                ));
            }
        }
        Ok(Self { percents })
    }

    /// Percentage for `level`, or `None` when the level is disabled.
    pub fn percent(&self, level: ReferralLevel) -> Option<Decimal> {
        let percent = self.percents[level.index()];
        (percent > Decimal::ZERO).then_some(percent)
    }

    /// Deepest enabled level; walking the chain further is pointless.
    pub fn depth(&self) -> u8 {
        ReferralLevel::all()
            .filter(|level| self.percent(*level).is_some())
            .map(|level| level.value())
            .max()
            .unwrap_or(0)
    }

    /// `amount * percent / 100`, rounded half away from zero to kopecks.
    /// `None` when the level is disabled or the reward rounds to zero.
    pub fn reward(&self, level: ReferralLevel, amount: Decimal) -> Option<Decimal> {
        let percent = self.percent(level)?;
        let reward = (amount * percent / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        (reward > Decimal::ZERO).then_some(reward)
    }
}
