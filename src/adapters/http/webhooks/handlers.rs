//! Webhook endpoint handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::FormRejection, Form, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

use crate::application::{ReconcileOutcome, ReconcileWebhookCommand, ReconcileWebhookHandler};
use crate::domain::payment::PaymentProvider;
use crate::domain::webhook::{PlategaCredentialVerifier, WebhookError, YooMoneySignatureVerifier};
use crate::ports::{WebhookDeliveryRecord, WebhookDeliveryRepository};

const PLATEGA_MERCHANT_HEADER: &str = "X-MerchantId";
const PLATEGA_SECRET_HEADER: &str = "X-Secret";

/// Shared state for webhook routes.
///
/// A provider whose verifier is `None` is not configured and its endpoint
/// answers 404. YooKassa carries no signature and is always enabled.
#[derive(Clone)]
pub struct WebhooksAppState {
    pub reconciler: Arc<ReconcileWebhookHandler>,
    pub platega: Option<Arc<PlategaCredentialVerifier>>,
    pub yoomoney: Option<Arc<YooMoneySignatureVerifier>>,
    /// Receives rejected deliveries; accepted ones are journaled by the reconciler.
    pub journal: Option<Arc<dyn WebhookDeliveryRepository>>,
}

impl WebhooksAppState {
    /// Runs reconciliation on its own task so a request timeout or a dropped
    /// connection cannot stop it between a grant and the claim completion.
    async fn reconcile(&self, provider: PaymentProvider, payload: Value) -> ReconcileOutcome {
        let reconciler = self.reconciler.clone();
        let task = tokio::spawn(async move {
            reconciler
                .handle(ReconcileWebhookCommand { provider, payload })
                .await
        });
        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(provider = %provider, error = %e, "Reconcile task aborted");
                ReconcileOutcome::StoreError {
                    error: e.to_string(),
                }
            }
        };

        tracing::info!(
            provider = %provider,
            outcome = outcome.label(),
            payment_id = ?outcome.payment_id(),
            "Webhook processed"
        );
        outcome
    }

    async fn reject(&self, provider: PaymentProvider, error: WebhookError, payload: Value) -> Response {
        tracing::warn!(provider = %provider, error = %error, "Webhook rejected");

        if let Some(journal) = &self.journal {
            let record = WebhookDeliveryRecord::new(provider, error.label(), payload)
                .with_detail(error.to_string());
            if let Err(e) = journal.record(record).await {
                tracing::warn!(provider = %provider, error = %e, "Failed to journal rejected webhook");
            }
        }

        WebhookApiError(error).into_response()
    }
}

/// POST /api/webhooks/platega
pub async fn platega_webhook(
    State(state): State<WebhooksAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload = json_body(&body);

    let Some(verifier) = state.platega.clone() else {
        return state
            .reject(PaymentProvider::Platega, WebhookError::ProviderDisabled("platega"), payload)
            .await;
    };

    if let Err(e) = verifier.verify(
        header(&headers, PLATEGA_MERCHANT_HEADER),
        header(&headers, PLATEGA_SECRET_HEADER),
    ) {
        return state.reject(PaymentProvider::Platega, e, payload).await;
    }

    state.reconcile(PaymentProvider::Platega, payload).await;
    Json(json!({ "ok": true })).into_response()
}

/// POST /api/webhooks/yookassa
pub async fn yookassa_webhook(State(state): State<WebhooksAppState>, body: Bytes) -> Response {
    state
        .reconcile(PaymentProvider::YooKassa, json_body(&body))
        .await;
    Json(json!({ "ok": true })).into_response()
}

/// POST /api/webhooks/yoomoney
///
/// An undecodable form is acknowledged and journaled as malformed; nothing in
/// it can be processed, so there is nothing to authenticate.
pub async fn yoomoney_webhook(
    State(state): State<WebhooksAppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Response {
    let payload = match form {
        Ok(Form(fields)) => form_to_json(fields),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Undecodable YooMoney form");
            Value::Null
        }
    };

    if !payload.is_null() {
        let Some(verifier) = state.yoomoney.clone() else {
            return state
                .reject(PaymentProvider::YooMoney, WebhookError::ProviderDisabled("yoomoney"), payload)
                .await;
        };
        if let Err(e) = verifier.verify(&payload) {
            return state.reject(PaymentProvider::YooMoney, e, payload).await;
        }
    }

    state.reconcile(PaymentProvider::YooMoney, payload).await;
    "OK".into_response()
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Unparseable bodies become `null`, which reconciliation reports as malformed.
fn json_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap_or(Value::Null)
}

fn form_to_json(fields: HashMap<String, String>) -> Value {
    Value::Object(
        fields
            .into_iter()
            .map(|(k, v)| (k, Value::String(v)))
            .collect::<Map<String, Value>>(),
    )
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// Refusal sent back to the provider.
pub struct WebhookApiError(pub WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "ok": false,
            "error": self.0.label(),
        }));
        (self.0.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn empty_body_becomes_null() {
        assert_eq!(json_body(&Bytes::new()), Value::Null);
        assert_eq!(json_body(&Bytes::from_static(b"not json")), Value::Null);
    }

    #[test]
    fn form_fields_become_string_values() {
        let mut fields = HashMap::new();
        fields.insert("label".to_string(), "order-1".to_string());
        fields.insert("unaccepted".to_string(), "false".to_string());

        let value = form_to_json(fields);

        assert_eq!(value["label"], "order-1");
        assert_eq!(value["unaccepted"], "false");
    }

    #[test]
    fn api_error_uses_webhook_status() {
        let response = WebhookApiError(WebhookError::InvalidSignature).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = WebhookApiError(WebhookError::ProviderDisabled("platega")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
