//! Application layer - command handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;

pub use handlers::payment::{
    FulfillPaymentCommand, FulfillPaymentHandler, FulfillPaymentResult, ReconcileOutcome,
    ReconcileWebhookCommand, ReconcileWebhookHandler, SweepReport, SweepUnfulfilledHandler,
};
