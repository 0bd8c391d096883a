//! Webhook domain module.
//!
//! Turns loosely-typed provider notifications into a canonical
//! [`NormalizedNotification`] and checks their authenticity.
//!
//! # Module Structure
//!
//! - `notification` - Canonical notification and status buckets
//! - `extraction` - Ordered JSON path probing
//! - `platega` / `yookassa` / `yoomoney` - Per-provider normalizers
//! - `verifier` - Credential and signature checks
//! - `errors` - WebhookError

mod errors;
mod extraction;
mod notification;
mod platega;
mod verifier;
mod yookassa;
mod yoomoney;

pub use errors::WebhookError;
pub use extraction::{collect_candidates, first_non_empty, JsonPath};
pub use notification::{NormalizedNotification, NotificationNormalizer, StatusBucket};
pub use platega::PlategaNormalizer;
pub use verifier::{constant_time_compare, PlategaCredentialVerifier, YooMoneySignatureVerifier};
pub use yookassa::YooKassaNormalizer;
pub use yoomoney::YooMoneyNormalizer;

use crate::domain::payment::PaymentProvider;

/// Normalizer for the given provider.
pub fn normalizer_for(provider: PaymentProvider) -> Box<dyn NotificationNormalizer> {
    match provider {
        PaymentProvider::Platega => Box::new(PlategaNormalizer),
        PaymentProvider::YooKassa => Box::new(YooKassaNormalizer),
        PaymentProvider::YooMoney => Box::new(YooMoneyNormalizer),
    }
}
