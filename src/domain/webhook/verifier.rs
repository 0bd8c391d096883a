//! Provider authenticity checks.
//!
//! Platega authenticates callbacks with the merchant id and secret echoed in
//! headers. YooMoney signs the form with SHA-1 over a fixed field order and
//! the wallet's notification secret. YooKassa has no signature; its
//! authenticity rests on the provider-scoped payment lookup.

use serde_json::Value;
use sha1::{Digest, Sha1};
use subtle::ConstantTimeEq;

use super::WebhookError;

/// Checks the `X-MerchantId` / `X-Secret` header pair.
pub struct PlategaCredentialVerifier {
    merchant_id: String,
    secret: String,
}

impl PlategaCredentialVerifier {
    pub fn new(merchant_id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            secret: secret.into(),
        }
    }

    /// Both headers must be present and match.
    pub fn verify(
        &self,
        merchant_id: Option<&str>,
        secret: Option<&str>,
    ) -> Result<(), WebhookError> {
        let (Some(merchant_id), Some(secret)) = (merchant_id, secret) else {
            return Err(WebhookError::InvalidSignature);
        };

        // Evaluate both comparisons so timing does not reveal which one failed.
        let merchant_ok = constant_time_compare(self.merchant_id.as_bytes(), merchant_id.trim().as_bytes());
        let secret_ok = constant_time_compare(self.secret.as_bytes(), secret.trim().as_bytes());

        if merchant_ok & secret_ok {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }
}

/// Checks the YooMoney `sha1_hash` form field.
pub struct YooMoneySignatureVerifier {
    secret: String,
}

impl YooMoneySignatureVerifier {
    /// Fields hashed, in order; the secret goes between `codepro` and `label`.
    const FIELDS_BEFORE_SECRET: [&'static str; 7] = [
        "notification_type",
        "operation_id",
        "amount",
        "currency",
        "datetime",
        "sender",
        "codepro",
    ];

    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verifies a form body passed as a flat JSON object of strings.
    pub fn verify(&self, form: &Value) -> Result<(), WebhookError> {
        let provided = field(form, "sha1_hash");
        if provided.is_empty() {
            return Err(WebhookError::InvalidSignature);
        }

        let expected = self.compute_signature(form);

        if constant_time_compare(expected.as_bytes(), provided.to_ascii_lowercase().as_bytes()) {
            Ok(())
        } else {
            Err(WebhookError::InvalidSignature)
        }
    }

    /// Lowercase hex SHA-1 of the `&`-joined check string.
    pub fn compute_signature(&self, form: &Value) -> String {
        let mut parts: Vec<&str> = Self::FIELDS_BEFORE_SECRET
            .iter()
            .map(|key| field(form, key))
            .collect();
        parts.push(&self.secret);
        parts.push(field(form, "label"));

        hex::encode(Sha1::digest(parts.join("&").as_bytes()))
    }
}

fn field<'a>(form: &'a Value, key: &str) -> &'a str {
    form.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Constant-time byte comparison.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ══════════════════════════════════════════════════════════════
    // Platega
    // ══════════════════════════════════════════════════════════════

    fn platega() -> PlategaCredentialVerifier {
        PlategaCredentialVerifier::new("merchant-1", "s3cret")
    }

    #[test]
    fn platega_accepts_matching_headers() {
        assert!(platega().verify(Some("merchant-1"), Some("s3cret")).is_ok());
    }

    #[test]
    fn platega_rejects_wrong_secret() {
        assert!(matches!(
            platega().verify(Some("merchant-1"), Some("guess")),
            Err(WebhookError::InvalidSignature)
        ));
    }

    #[test]
    fn platega_rejects_wrong_merchant() {
        assert!(platega().verify(Some("merchant-2"), Some("s3cret")).is_err());
    }

    #[test]
    fn platega_rejects_missing_headers() {
        assert!(platega().verify(None, Some("s3cret")).is_err());
        assert!(platega().verify(Some("merchant-1"), None).is_err());
    }

    // ══════════════════════════════════════════════════════════════
    // YooMoney
    // ══════════════════════════════════════════════════════════════

    fn signed_form(secret: &str) -> Value {
        let mut form = json!({
            "notification_type": "p2p-incoming",
            "operation_id": "904035776918098009",
            "amount": "0.99",
            "withdraw_amount": "1.00",
            "currency": "643",
            "datetime": "2014-04-28T16:31:28Z",
            "sender": "41003188981230",
            "codepro": "false",
            "label": "YM.label.12345",
        });
        let hash = YooMoneySignatureVerifier::new(secret).compute_signature(&form);
        form["sha1_hash"] = json!(hash);
        form
    }

    #[test]
    fn yoomoney_check_string_layout() {
        let verifier = YooMoneySignatureVerifier::new("01234567890ABCDEF01234567890");
        let form = signed_form("01234567890ABCDEF01234567890");

        let expected = hex::encode(Sha1::digest(
            "p2p-incoming&904035776918098009&0.99&643&2014-04-28T16:31:28Z&41003188981230&false&01234567890ABCDEF01234567890&YM.label.12345"
                .as_bytes(),
        ));
        assert_eq!(verifier.compute_signature(&form), expected);
    }

    #[test]
    fn yoomoney_accepts_valid_hash() {
        let form = signed_form("secret");
        assert!(YooMoneySignatureVerifier::new("secret").verify(&form).is_ok());
    }

    #[test]
    fn yoomoney_accepts_uppercase_hash() {
        let mut form = signed_form("secret");
        let upper = form["sha1_hash"].as_str().unwrap().to_uppercase();
        form["sha1_hash"] = json!(upper);
        assert!(YooMoneySignatureVerifier::new("secret").verify(&form).is_ok());
    }

    #[test]
    fn yoomoney_rejects_tampered_amount() {
        let mut form = signed_form("secret");
        form["amount"] = json!("999.00");
        assert!(YooMoneySignatureVerifier::new("secret").verify(&form).is_err());
    }

    #[test]
    fn yoomoney_rejects_missing_hash() {
        let mut form = signed_form("secret");
        form.as_object_mut().unwrap().remove("sha1_hash");
        assert!(matches!(
            YooMoneySignatureVerifier::new("secret").verify(&form),
            Err(WebhookError::InvalidSignature)
        ));
    }

    #[test]
    fn constant_time_compare_handles_lengths() {
        assert!(constant_time_compare(b"abc", b"abc"));
        assert!(!constant_time_compare(b"abc", b"abd"));
        assert!(!constant_time_compare(b"abc", b"abcd"));
    }
}
