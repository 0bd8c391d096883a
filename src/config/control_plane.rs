//! VPN control-plane API configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;
use super::Environment;

#[derive(Debug, Clone, Deserialize)]
pub struct ControlPlaneSettings {
    /// Panel API base URL
    pub base_url: String,

    /// Bearer token for the panel API
    pub api_token: Secret<String>,
}

impl ControlPlaneSettings {
    pub fn api_token(&self) -> &str {
        self.api_token.expose_secret()
    }

    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired("control_plane.base_url"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidUrl("control_plane.base_url"));
        }
        if *environment == Environment::Production && !self.base_url.starts_with("https://") {
            return Err(ValidationError::MustBeHttps("control_plane.base_url"));
        }
        if self.api_token().is_empty() {
            return Err(ValidationError::MissingRequired("control_plane.api_token"));
        }
        Ok(())
    }
}
