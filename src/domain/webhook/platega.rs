//! Platega callback normalizer.
//!
//! Platega posts JSON whose shape has drifted across API versions: fields
//! appear at the top level, under `transaction`, or under `data`. Top-level
//! wins, then `transaction`, then `data`.

use serde_json::Value;

use crate::domain::payment::PaymentProvider;

use super::extraction::{collect_candidates, first_non_empty, JsonPath};
use super::notification::{parse_amount, require_object};
use super::{NormalizedNotification, NotificationNormalizer, StatusBucket, WebhookError};

const SUCCESS: &[&str] = &["CONFIRMED", "SUCCESS", "SUCCEEDED", "PAID", "COMPLETED"];
const FAILURE: &[&str] = &[
    "CANCELED",
    "CANCELLED",
    "FAILED",
    "DECLINED",
    "EXPIRED",
    "REJECTED",
];

const STATUS: &[JsonPath] = &[
    JsonPath(&["status"]),
    JsonPath(&["transaction", "status"]),
    JsonPath(&["data", "status"]),
];

const TRANSACTION_ID: &[JsonPath] = &[
    JsonPath(&["id"]),
    JsonPath(&["transactionId"]),
    JsonPath(&["transaction", "id"]),
    JsonPath(&["data", "id"]),
    JsonPath(&["data", "transactionId"]),
];

/// Order id and echoed payload, tried after the transaction ids.
const ORDER_ID: &[JsonPath] = &[
    JsonPath(&["orderId"]),
    JsonPath(&["payload"]),
    JsonPath(&["transaction", "orderId"]),
    JsonPath(&["transaction", "payload"]),
    JsonPath(&["data", "orderId"]),
    JsonPath(&["data", "payload"]),
];

const AMOUNT: &[JsonPath] = &[
    JsonPath(&["amount"]),
    JsonPath(&["paymentDetails", "amount"]),
    JsonPath(&["transaction", "amount"]),
    JsonPath(&["data", "amount"]),
];

#[derive(Debug, Clone, Copy, Default)]
pub struct PlategaNormalizer;

impl NotificationNormalizer for PlategaNormalizer {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Platega
    }

    fn normalize(&self, body: &Value) -> Result<NormalizedNotification, WebhookError> {
        require_object(body)?;

        let status = first_non_empty(body, STATUS)
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
            return Err(WebhookError::MissingField("id"));
        }

        Ok(NormalizedNotification {
            provider: PaymentProvider::Platega,
            bucket: StatusBucket::classify(&status, SUCCESS, FAILURE),
            status,
            transaction_id,
            correlation_candidates,
            paid_amount: parse_amount(first_non_empty(body, AMOUNT)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(body: Value) -> Result<NormalizedNotification, WebhookError> {
        PlategaNormalizer.normalize(&body)
    }

    #[test]
    fn confirmed_with_order_id_is_success() {
        let n = normalize(json!({"status": "CONFIRMED", "orderId": "X"})).unwrap();

        assert_eq!(n.bucket, StatusBucket::Success);
        assert_eq!(n.status, "CONFIRMED");
        assert_eq!(n.transaction_id, None);
        assert_eq!(n.correlation_candidates, vec!["X"]);
    }

    #[test]
    fn correlation_follows_top_level_then_transaction_then_data() {
        let n = normalize(json!({
            "status": "CONFIRMED",
            "id": "top-level",
            "transaction": {"id": "from-transaction"},
            "data": {"id": "from-data"}
        }))
        .unwrap();

        assert_eq!(n.transaction_id.as_deref(), Some("top-level"));
        assert_eq!(
            n.correlation_candidates,
            vec!["top-level", "from-transaction", "from-data"]
        );
    }

    #[test]
    fn nested_status_is_found() {
        let n = normalize(json!({"data": {"status": "canceled", "orderId": "ord_1"}})).unwrap();
        assert_eq!(n.status, "CANCELED");
        assert_eq!(n.bucket, StatusBucket::Failure);
    }

    #[test]
    fn transaction_ids_precede_order_ids() {
        let n = normalize(json!({
            "status": "PENDING",
            "orderId": "ord_1",
            "transaction": {"id": "txn_9"}
        }))
        .unwrap();

        assert_eq!(n.bucket, StatusBucket::Ignored);
        assert_eq!(n.correlation_candidates, vec!["txn_9", "ord_1"]);
    }

    #[test]
    fn numeric_amount_is_parsed() {
        let n = normalize(json!({"status": "CONFIRMED", "id": "t", "amount": "500.00"})).unwrap();
        assert_eq!(n.paid_amount, Some(rust_decimal::Decimal::new(50000, 2)));
    }

    #[test]
    fn missing_status_fails() {
        assert!(matches!(
            normalize(json!({"orderId": "X"})),
            Err(WebhookError::MissingField("status"))
        ));
    }

    #[test]
    fn missing_ids_fail() {
        assert!(matches!(
            normalize(json!({"status": "CONFIRMED"})),
            Err(WebhookError::MissingField("id"))
        ));
    }

    #[test]
    fn empty_body_fails() {
        assert!(matches!(normalize(json!({})), Err(WebhookError::ParseError(_))));
        assert!(matches!(normalize(Value::Null), Err(WebhookError::ParseError(_))));
    }
}
