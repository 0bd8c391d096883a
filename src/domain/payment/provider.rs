//! Supported payment providers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// External payment provider that delivers webhook notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    Platega,
    YooKassa,
    YooMoney,
}

impl PaymentProvider {
    /// Storage and routing name.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentProvider::Platega => "platega",
            PaymentProvider::YooKassa => "yookassa",
            PaymentProvider::YooMoney => "yoomoney",
        }
    }
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentProvider {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "platega" => Ok(PaymentProvider::Platega),
            "yookassa" => Ok(PaymentProvider::YooKassa),
            "yoomoney" => Ok(PaymentProvider::YooMoney),
            other => Err(ValidationError::invalid_format(
                "provider",
                format!("unknown payment provider '{}'", other),
            )),
        }
    }
}
