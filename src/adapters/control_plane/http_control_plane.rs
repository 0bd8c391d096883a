//! HTTP control plane - client for the VPN panel's management API.
//!
//! # Configuration
//!
//! ```ignore
//! let config = ControlPlaneConfig::new("https://panel.example.com", token)
//!     .with_timeout(Duration::from_secs(20));
//!
//! let control_plane = HttpControlPlane::new(config)?;
//! ```
//!
//! Endpoints (bearer-authenticated):
//!
//! - `GET  /api/clients/{id}/entitlement` - current limits; 404 means none
//! - `PUT  /api/clients/{id}/entitlement` - replace limits
//! - `POST /api/clients/{id}/proxy-slots` - create proxy credentials

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use crate::domain::foundation::{ClientId, DomainError, ErrorCode};
use crate::domain::fulfillment::{Entitlement, ProxySlotId, ProxySlotRequest};
use crate::ports::ControlPlane;

/// Configuration for the HTTP control plane.
#[derive(Debug, Clone)]
pub struct ControlPlaneConfig {
    api_token: Secret<String>,
    /// Panel base URL without trailing slash.
    pub base_url: String,
    pub timeout: Duration,
}

impl ControlPlaneConfig {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            api_token: Secret::new(api_token.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(20),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_token(&self) -> &str {
        self.api_token.expose_secret()
    }
}

pub struct HttpControlPlane {
    config: ControlPlaneConfig,
    client: Client,
}

impl HttpControlPlane {
    pub fn new(config: ControlPlaneConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Failed to create HTTP client: {}", e),
                )
            })?;

        Ok(Self { config, client })
    }

    fn client_url(&self, client_id: &ClientId, path: &str) -> String {
        format!("{}/api/clients/{}/{}", self.config.base_url, client_id, path)
    }

    fn request_error(&self, e: reqwest::Error) -> DomainError {
        if e.is_timeout() {
            DomainError::new(
                ErrorCode::Timeout,
                format!(
                    "Control plane request timed out after {}s",
                    self.config.timeout.as_secs()
                ),
            )
        } else if e.is_connect() {
            DomainError::control_plane(format!("Failed to connect to control plane: {}", e))
        } else {
            DomainError::control_plane(e.to_string())
        }
    }

    /// Passes successful responses through; turns the rest into errors.
    async fn check_status(response: Response) -> Result<Response, DomainError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let code = match status {
            StatusCode::NOT_FOUND => ErrorCode::ClientNotFound,
            _ => ErrorCode::ControlPlaneError,
        };
        Err(DomainError::new(
            code,
            format!("Control plane returned {}: {}", status, body),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct ProvisionResponse {
    slots: Vec<SlotBody>,
}

#[derive(Debug, Deserialize)]
struct SlotBody {
    id: String,
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn get_entitlement(&self, client_id: &ClientId) -> Result<Entitlement, DomainError> {
        let response = self
            .client
            .get(self.client_url(client_id, "entitlement"))
            .bearer_auth(self.config.api_token())
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Entitlement::none());
        }

        Self::check_status(response)
            .await?
            .json::<Entitlement>()
            .await
            .map_err(|e| DomainError::control_plane(format!("Failed to parse entitlement: {}", e)))
    }

    async fn grant_entitlement(
        &self,
        client_id: &ClientId,
        entitlement: &Entitlement,
    ) -> Result<(), DomainError> {
        let response = self
            .client
            .put(self.client_url(client_id, "entitlement"))
            .bearer_auth(self.config.api_token())
            .json(entitlement)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        Self::check_status(response).await?;
        Ok(())
    }

    async fn provision_proxy_slots(
        &self,
        client_id: &ClientId,
        request: &ProxySlotRequest,
    ) -> Result<Vec<ProxySlotId>, DomainError> {
        let response = self
            .client
            .post(self.client_url(client_id, "proxy-slots"))
            .bearer_auth(self.config.api_token())
            .json(request)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let body: ProvisionResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| DomainError::control_plane(format!("Failed to parse slots: {}", e)))?;

        Ok(body.slots.into_iter().map(|s| ProxySlotId(s.id)).collect())
    }
}
