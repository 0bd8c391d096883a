//! YooKassa notification normalizer.
//!
//! ```json
//! {"type": "notification", "event": "payment.succeeded",
//!  "object": {"id": "2d...", "status": "succeeded",
//!             "amount": {"value": "990.00", "currency": "RUB"},
//!             "metadata": {"orderId": "ord_..."}}}
//! ```
//!
//! The `object` is the primary source; top-level fields are a fallback for
//! relayed or hand-built payloads. When no status is present the event name
//! suffix (`payment.canceled` → `CANCELED`) is used.

use serde_json::Value;

use crate::domain::payment::PaymentProvider;

use super::extraction::{collect_candidates, first_non_empty, JsonPath};
use super::notification::{parse_amount, require_object};
use super::{NormalizedNotification, NotificationNormalizer, StatusBucket, WebhookError};

const SUCCESS: &[&str] = &["SUCCEEDED"];
const FAILURE: &[&str] = &["CANCELED"];

const STATUS: &[JsonPath] = &[
    JsonPath(&["object", "status"]),
    JsonPath(&["status"]),
    JsonPath(&["transaction", "status"]),
    JsonPath(&["data", "status"]),
];

const EVENT: &[JsonPath] = &[JsonPath(&["event"])];

const TRANSACTION_ID: &[JsonPath] = &[
    JsonPath(&["object", "id"]),
    JsonPath(&["id"]),
    JsonPath(&["transaction", "id"]),
    JsonPath(&["data", "id"]),
];

const ORDER_ID: &[JsonPath] = &[
    JsonPath(&["object", "metadata", "orderId"]),
    JsonPath(&["object", "metadata", "order_id"]),
    JsonPath(&["object", "metadata", "paymentId"]),
    JsonPath(&["metadata", "orderId"]),
    JsonPath(&["metadata", "order_id"]),
];

const AMOUNT: &[JsonPath] = &[
    JsonPath(&["object", "amount", "value"]),
    JsonPath(&["amount", "value"]),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct YooKassaNormalizer;

impl NotificationNormalizer for YooKassaNormalizer {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::YooKassa
    }

    fn normalize(&self, body: &Value) -> Result<NormalizedNotification, WebhookError> {
        require_object(body)?;

        let status = first_non_empty(body, STATUS)
            .or_else(|| {
                first_non_empty(body, EVENT)
                    .and_then(|event| event.rsplit_once('.').map(|(_, s)| s.to_string()))
            })
            .ok_or(WebhookError::MissingField("status"))?
            .to_uppercase();

        let transaction_id = first_non_empty(body, TRANSACTION_ID);

        let mut correlation_candidates = collect_candidates(body, TRANSACTION_ID);
        for id in collect_candidates(body, ORDER_ID) {
            if !correlation_candidates.contains(&id) {
                correlation_candidates.push(id);
            }
        }
        if correlation_candidates.is_empty() {
            return Err(WebhookError::MissingField("object.id"));
        }

        Ok(NormalizedNotification {
            provider: PaymentProvider::YooKassa,
            bucket: StatusBucket::classify(&status, SUCCESS, FAILURE),
            status,
            transaction_id,
            correlation_candidates,
            paid_amount: parse_amount(first_non_empty(body, AMOUNT)),
        })
    }
}
