//! Log-only notifier.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::foundation::{ClientId, DomainError};
use crate::domain::fulfillment::NotificationTemplate;
use crate::ports::Notifier;

#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        client_id: &ClientId,
        template: NotificationTemplate,
        data: &Value,
    ) -> Result<(), DomainError> {
        tracing::info!(
            client_id = %client_id,
            template = %template,
            data = %data,
            "Client notification (no gateway configured)"
        );
        Ok(())
    }
}
