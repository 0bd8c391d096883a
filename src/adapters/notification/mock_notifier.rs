//! Recording notifier for tests.
//!
//! # Panics
//!
//! Methods may panic if the internal lock is poisoned. Test use only.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::foundation::{ClientId, DomainError, ErrorCode};
use crate::domain::fulfillment::NotificationTemplate;
use crate::ports::Notifier;

pub type SentNotification = (ClientId, NotificationTemplate, Value);

#[derive(Default)]
pub struct MockNotifier {
    sent: Mutex<Vec<SentNotification>>,
    fail: bool,
    delay: Option<Duration>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent
            .lock()
            .expect("MockNotifier: lock poisoned")
            .clone()
    }

    pub fn sent_to(&self, client_id: &ClientId) -> Vec<NotificationTemplate> {
        self.sent()
            .into_iter()
            .filter(|(c, _, _)| c == client_id)
            .map(|(_, t, _)| t)
            .collect()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(
        &self,
        client_id: &ClientId,
        template: NotificationTemplate,
        data: &Value,
    ) -> Result<(), DomainError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(DomainError::new(
                ErrorCode::NotificationError,
                "Simulated notification failure",
            ));
        }
        self.sent
            .lock()
            .expect("MockNotifier: lock poisoned")
            .push((*client_id, template, data.clone()));
        Ok(())
    }
}
