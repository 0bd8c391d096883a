//! Outbound client notification port.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::foundation::{ClientId, DomainError};
use crate::domain::fulfillment::NotificationTemplate;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one templated message. Callers treat failures as non-fatal.
    async fn notify(
        &self,
        client_id: &ClientId,
        template: NotificationTemplate,
        data: &Value,
    ) -> Result<(), DomainError>;
}
