//! Payment provider configuration
//!
//! Each provider is optional. A provider without credentials is disabled and
//! its webhook endpoint answers 404.

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Platega merchant id, echoed in `X-MerchantId`
    pub platega_merchant_id: Option<String>,

    /// Platega API secret, echoed in `X-Secret`
    pub platega_secret: Option<Secret<String>>,

    /// YooMoney wallet notification secret used in `sha1_hash`
    pub yoomoney_notification_secret: Option<Secret<String>>,

    /// YooKassa shop id; informational, YooKassa webhooks are unsigned
    pub yookassa_shop_id: Option<String>,
}

impl PaymentConfig {
    /// Merchant id and secret when Platega is configured.
    pub fn platega_credentials(&self) -> Option<(&str, &str)> {
        match (&self.platega_merchant_id, &self.platega_secret) {
            (Some(merchant), Some(secret)) => Some((merchant.as_str(), secret.expose_secret().as_str())),
            _ => None,
        }
    }

    pub fn yoomoney_secret(&self) -> Option<&str> {
        self.yoomoney_notification_secret
            .as_ref()
            .map(|s| s.expose_secret().as_str())
            .filter(|s| !s.is_empty())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match (&self.platega_merchant_id, &self.platega_secret) {
            (Some(_), None) => Err(ValidationError::IncompletePair(
                "payment.platega_merchant_id",
                "payment.platega_secret",
            )),
            (None, Some(_)) => Err(ValidationError::IncompletePair(
                "payment.platega_secret",
                "payment.platega_merchant_id",
            )),
            _ => Ok(()),
        }
    }
}
