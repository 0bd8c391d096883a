//! NotificationSink - best-effort client messaging.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::domain::foundation::ClientId;
use crate::domain::fulfillment::NotificationTemplate;
use crate::ports::Notifier;

/// Sends notifications under a timeout and swallows every failure.
#[derive(Clone)]
pub struct NotificationSink {
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

impl NotificationSink {
    pub fn new(notifier: Arc<dyn Notifier>, timeout: Duration) -> Self {
        Self { notifier, timeout }
    }

    /// Returns whether the notifier accepted the message.
    pub async fn send(&self, client_id: &ClientId, template: NotificationTemplate, data: Value) -> bool {
        match tokio::time::timeout(self.timeout, self.notifier.notify(client_id, template, &data)).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(
                    client_id = %client_id,
                    template = %template,
                    error = %e,
                    "Notification failed"
                );
                false
            }
            Err(_) => {
                tracing::warn!(
                    client_id = %client_id,
                    template = %template,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Notification timed out"
                );
                false
            }
        }
    }
}
