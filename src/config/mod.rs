//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables through the
//! `config` and `dotenvy` crates. Variables use the `VPN_PANEL` prefix and
//! `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use vpn_panel_billing::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod control_plane;
mod database;
mod error;
mod fulfillment;
mod notification;
mod payment;
mod referral;
mod server;

pub use control_plane::ControlPlaneSettings;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use fulfillment::FulfillmentConfig;
pub use notification::NotificationConfig;
pub use payment::PaymentConfig;
pub use referral::ReferralConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    pub database: DatabaseConfig,

    /// Provider webhook credentials
    #[serde(default)]
    pub payment: PaymentConfig,

    #[serde(default)]
    pub fulfillment: FulfillmentConfig,

    #[serde(default)]
    pub referral: ReferralConfig,

    pub control_plane: ControlPlaneSettings,

    #[serde(default)]
    pub notification: NotificationConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` if present
    /// 2. Reads variables with the `VPN_PANEL` prefix
    /// 3. Splits nested keys on `__`
    ///
    /// # Environment Variable Format
    ///
    /// - `VPN_PANEL__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `VPN_PANEL__REFERRAL__LEVEL1_PERCENT=10` -> `referral.level1_percent = 10`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("VPN_PANEL")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.payment.validate()?;
        self.fulfillment.validate()?;
        self.referral.validate()?;
        self.control_plane.validate(&self.server.environment)?;
        self.notification.validate()?;

        let required = self.fulfillment.webhook_budget_secs();
        if self.server.request_timeout_secs < required {
            return Err(ValidationError::RequestTimeoutTooShort {
                configured: self.server.request_timeout_secs,
                required,
            });
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global; tests touching them take this lock.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "VPN_PANEL__DATABASE__URL",
        "VPN_PANEL__CONTROL_PLANE__BASE_URL",
        "VPN_PANEL__CONTROL_PLANE__API_TOKEN",
        "VPN_PANEL__SERVER__PORT",
        "VPN_PANEL__SERVER__ENVIRONMENT",
        "VPN_PANEL__REFERRAL__LEVEL1_PERCENT",
        "VPN_PANEL__FULFILLMENT__CLAIM_STALE_AFTER_SECS",
        "VPN_PANEL__PAYMENT__PLATEGA_MERCHANT_ID",
        "VPN_PANEL__PAYMENT__PLATEGA_SECRET",
    ];

    fn set_minimal_env() {
        env::set_var("VPN_PANEL__DATABASE__URL", "postgresql://test@localhost/panel");
        env::set_var("VPN_PANEL__CONTROL_PLANE__BASE_URL", "https://panel.example.com");
        env::set_var("VPN_PANEL__CONTROL_PLANE__API_TOKEN", "cp-token");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("config should load");
        assert_eq!(config.database.url, "postgresql://test@localhost/panel");
        assert_eq!(config.control_plane.api_token(), "cp-token");
        assert_eq!(config.fulfillment.claim_stale_after_secs, 600);
        assert!(config.payment.platega_credentials().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nested_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("VPN_PANEL__SERVER__PORT", "9000");
        env::set_var("VPN_PANEL__REFERRAL__LEVEL1_PERCENT", "10");
        env::set_var("VPN_PANEL__FULFILLMENT__CLAIM_STALE_AFTER_SECS", "900");
        env::set_var("VPN_PANEL__PAYMENT__PLATEGA_MERCHANT_ID", "merchant");
        env::set_var("VPN_PANEL__PAYMENT__PLATEGA_SECRET", "secret");
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("config should load");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.referral.level1_percent, Decimal::new(10, 0));
        assert_eq!(config.fulfillment.claim_stale_after_secs, 900);
        assert_eq!(config.payment.platega_credentials(), Some(("merchant", "secret")));
    }

    #[test]
    fn test_missing_control_plane_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("VPN_PANEL__DATABASE__URL", "postgresql://test@localhost/panel");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_err());
    }

    #[test]
    fn test_production_requires_https_control_plane() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("VPN_PANEL__CONTROL_PLANE__BASE_URL", "http://panel.internal");
        env::set_var("VPN_PANEL__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.expect("config should load");
        assert!(config.is_production());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_request_timeout_must_cover_webhook_budget() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let mut config = result.expect("config should load");
        config.server.request_timeout_secs = 60;
        config.fulfillment.control_plane_timeout_secs = 20;
        config.fulfillment.notification_timeout_secs = 5;

        assert_eq!(
            config.validate(),
            Err(ValidationError::RequestTimeoutTooShort {
                configured: 60,
                required: 70,
            })
        );

        config.server.request_timeout_secs = 70;
        assert!(config.validate().is_ok());
    }
}
