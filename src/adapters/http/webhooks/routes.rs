//! Axum router configuration for webhook endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    health, platega_webhook, yookassa_webhook, yoomoney_webhook, WebhooksAppState,
};

/// Provider webhook routes, mounted under `/api/webhooks`.
///
/// # Routes
/// - `POST /platega`
/// - `POST /yookassa`
/// - `POST /yoomoney`
pub fn webhook_routes() -> Router<WebhooksAppState> {
    Router::new()
        .route("/platega", post(platega_webhook))
        .route("/yookassa", post(yookassa_webhook))
        .route("/yoomoney", post(yoomoney_webhook))
}

/// Complete router: webhooks plus the health probe.
///
/// # Example
///
/// ```ignore
/// let app = webhook_router()
///     .layer(TraceLayer::new_for_http())
///     .with_state(state);
/// ```
pub fn webhook_router() -> Router<WebhooksAppState> {
    Router::new()
        .nest("/api/webhooks", webhook_routes())
        .route("/health", get(health))
}
