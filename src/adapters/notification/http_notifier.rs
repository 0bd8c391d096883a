//! HTTP notifier - posts client notifications to the messaging gateway.
//!
//! The gateway renders `template` with `data` and delivers it through
//! whichever channel the client uses (Telegram bot, email).

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::domain::foundation::{ClientId, DomainError, ErrorCode};
use crate::domain::fulfillment::NotificationTemplate;
use crate::ports::Notifier;

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    pub gateway_url: String,
    api_token: Option<Secret<String>>,
    pub timeout: Duration,
}

impl NotifierConfig {
    pub fn new(gateway_url: impl Into<String>) -> Self {
        Self {
            gateway_url: gateway_url.into(),
            api_token: None,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(Secret::new(token.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationBody<'a> {
    client_id: &'a ClientId,
    template: NotificationTemplate,
    data: &'a Value,
}

pub struct HttpNotifier {
    config: NotifierConfig,
    client: Client,
}

impl HttpNotifier {
    pub fn new(config: NotifierConfig) -> Result<Self, DomainError> {
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
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(
        &self,
        client_id: &ClientId,
        template: NotificationTemplate,
        data: &Value,
    ) -> Result<(), DomainError> {
        let mut request = self.client.post(&self.config.gateway_url).json(&NotificationBody {
            client_id,
            template,
            data,
        });
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            DomainError::new(ErrorCode::NotificationError, format!("Notification request failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(DomainError::new(
                ErrorCode::NotificationError,
                format!("Notification gateway returned {}", response.status()),
            ));
        }
        Ok(())
    }
}
