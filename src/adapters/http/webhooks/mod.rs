//! HTTP adapter for payment provider webhooks.
//!
//! - `POST /api/webhooks/platega` - JSON, `X-MerchantId` / `X-Secret` headers
//! - `POST /api/webhooks/yookassa` - JSON
//! - `POST /api/webhooks/yoomoney` - form-encoded, `sha1_hash` signed
//! - `GET /health` - liveness probe
//!
//! Every delivery is acknowledged with 200 whatever reconciliation decides.
//! Only authenticity failures (401) and unconfigured providers (404) are
//! refused.

mod handlers;
mod routes;

pub use handlers::{
    health, platega_webhook, yookassa_webhook, yoomoney_webhook, WebhookApiError,
    WebhooksAppState,
};
pub use routes::{webhook_router, webhook_routes};
