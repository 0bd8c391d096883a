//! YooMoney wallet notification normalizer.
//!
//! YooMoney posts `application/x-www-form-urlencoded` fields. Only incoming
//! transfers are notified, so there is no failure status. A transfer that is
//! `unaccepted` (held) or protected by `codepro` has not reached the wallet
//! yet and is ignored.

use serde_json::Value;

use crate::domain::payment::PaymentProvider;

use super::extraction::{first_non_empty, JsonPath};
use super::notification::{parse_amount, require_object};
use super::{NormalizedNotification, NotificationNormalizer, StatusBucket, WebhookError};

const ACCEPTED: &str = "ACCEPTED";
const UNACCEPTED: &str = "UNACCEPTED";
const PROTECTED: &str = "PROTECTED";

const SUCCESS: &[&str] = &[ACCEPTED];
const FAILURE: &[&str] = &[];

const OPERATION_ID: &[JsonPath] = &[JsonPath(&["operation_id"])];
const LABEL: &[JsonPath] = &[JsonPath(&["label"])];

/// `withdraw_amount` is what the payer was charged; `amount` is net of fees.
const AMOUNT: &[JsonPath] = &[JsonPath(&["withdraw_amount"]), JsonPath(&["amount"])];

fn flag(body: &Value, key: &str) -> bool {
    match body.get(key) {
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        Some(Value::Bool(b)) => *b,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct YooMoneyNormalizer;

impl NotificationNormalizer for YooMoneyNormalizer {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::YooMoney
    }

    fn normalize(&self, body: &Value) -> Result<NormalizedNotification, WebhookError> {
        require_object(body)?;

        let status = if flag(body, "unaccepted") {
            UNACCEPTED
        } else if flag(body, "codepro") {
            PROTECTED
        } else {
            ACCEPTED
        }
        .to_string();

        let transaction_id = first_non_empty(body, OPERATION_ID);
        let label = first_non_empty(body, LABEL);

        let correlation_candidates: Vec<String> = transaction_id
            .iter()
            .chain(label.iter())
            .cloned()
            .collect();
        if label.is_none() && transaction_id.is_none() {
            return Err(WebhookError::MissingField("label"));
        }

        Ok(NormalizedNotification {
            provider: PaymentProvider::YooMoney,
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
    use rust_decimal::Decimal;
    use serde_json::json;

    fn form() -> Value {
        json!({
            "notification_type": "p2p-incoming",
            "operation_id": "1234567",
            "amount": "490.00",
            "withdraw_amount": "500.00",
            "currency": "643",
            "datetime": "2024-03-01T12:00:00Z",
            "sender": "41001000040",
            "codepro": "false",
            "label": "ord_abc",
            "unaccepted": "false"
        })
    }

    #[test]
    fn accepted_transfer_is_success() {
        let n = YooMoneyNormalizer.normalize(&form()).unwrap();

        assert_eq!(n.bucket, StatusBucket::Success);
        assert_eq!(n.transaction_id.as_deref(), Some("1234567"));
        assert_eq!(n.correlation_candidates, vec!["1234567", "ord_abc"]);
        assert_eq!(n.paid_amount, Some(Decimal::new(50000, 2)));
    }

    #[test]
    fn unaccepted_transfer_is_ignored() {
        let mut body = form();
        body["unaccepted"] = json!("true");
        let n = YooMoneyNormalizer.normalize(&body).unwrap();
        assert_eq!(n.status, "UNACCEPTED");
        assert_eq!(n.bucket, StatusBucket::Ignored);
    }

    #[test]
    fn codepro_transfer_is_ignored() {
        let mut body = form();
        body["codepro"] = json!("true");
        assert_eq!(
            YooMoneyNormalizer.normalize(&body).unwrap().bucket,
            StatusBucket::Ignored
        );
    }

    #[test]
    fn falls_back_to_net_amount() {
        let mut body = form();
        body.as_object_mut().unwrap().remove("withdraw_amount");
        let n = YooMoneyNormalizer.normalize(&body).unwrap();
        assert_eq!(n.paid_amount, Some(Decimal::new(49000, 2)));
    }

    #[test]
    fn missing_label_and_operation_fail() {
        let body = json!({"notification_type": "p2p-incoming", "amount": "1.00"});
        assert!(matches!(
            YooMoneyNormalizer.normalize(&body),
            Err(WebhookError::MissingField("label"))
        ));
    }
}
