//! Client notification gateway configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

/// Without a `gateway_url` notifications are only logged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationConfig {
    pub gateway_url: Option<String>,
    pub api_token: Option<Secret<String>>,
}

impl NotificationConfig {
    pub fn gateway_url(&self) -> Option<&str> {
        self.gateway_url.as_deref().filter(|url| !url.is_empty())
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_ref().map(|t| t.expose_secret().as_str())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(url) = self.gateway_url() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidUrl("notification.gateway_url"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_gateway_means_log_only() {
        let config = NotificationConfig {
            gateway_url: Some(String::new()),
            api_token: None,
        };
        assert!(config.gateway_url().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_gateway_url_must_be_http() {
        let config = NotificationConfig {
            gateway_url: Some("ftp://gateway".to_string()),
            api_token: None,
        };
        assert!(config.validate().is_err());
    }
}
