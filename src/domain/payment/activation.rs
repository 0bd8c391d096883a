//! Activation claim.
//!
//! Fulfillment of tariffs, proxy slots and extra options mutates state in an
//! external control plane that has no idempotency of its own, so it must run
//! at most once per payment. The claim lives inside the payment metadata as
//! five fields:
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `activationInProgressAt` | an attempt holds the claim since this instant |
//! | `activationAppliedAt` | fulfillment completed; authoritative "done" flag |
//! | `activationAttempts` | number of claims ever taken |
//! | `activationLastError` | diagnostics only, never gates a retry |
//! | `activationProxySlots` | proxy slots created so far; a retry asks only for the rest |
//!
//! An in-progress marker older than the staleness window is treated as
//! abandoned (the holder crashed or timed out) and may be reclaimed.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{PaymentId, Timestamp};

/// Claim bookkeeping stored in payment metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationState {
    #[serde(
        rename = "activationInProgressAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub in_progress_at: Option<Timestamp>,

    #[serde(
        rename = "activationAppliedAt",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub applied_at: Option<Timestamp>,

    #[serde(rename = "activationAttempts", default, skip_serializing_if = "is_zero")]
    pub attempts: u32,

    #[serde(
        rename = "activationLastError",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_error: Option<String>,

    #[serde(
        rename = "activationProxySlots",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub proxy_slots: Vec<String>,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

/// Why a payment does not go through activation at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotApplicableReason {
    NotPaid,
    TopUpOnly,
}

/// A claim attempt that did not produce a claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimRejection {
    /// Fulfillment already completed; nothing to do.
    AlreadyApplied { at: Timestamp },
    /// Another delivery holds a fresh claim.
    InProgress { since: Timestamp },
    NotApplicable(NotApplicableReason),
}

impl fmt::Display for ClaimRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimRejection::AlreadyApplied { at } => write!(f, "already applied at {}", at),
            ClaimRejection::InProgress { since } => write!(f, "in progress since {}", since),
            ClaimRejection::NotApplicable(NotApplicableReason::NotPaid) => {
                f.write_str("payment is not paid")
            }
            ClaimRejection::NotApplicable(NotApplicableReason::TopUpOnly) => {
                f.write_str("top-up needs no activation")
            }
        }
    }
}

/// Proof of a committed claim, handed to the fulfillment step and used to
/// release exactly the claim that was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimTicket {
    pub payment_id: PaymentId,
    pub claimed_at: Timestamp,
    pub attempt: u32,
}

impl ActivationState {
    /// Metadata keys owned by the claim.
    pub const KEYS: [&'static str; 5] = [
        "activationInProgressAt",
        "activationAppliedAt",
        "activationAttempts",
        "activationLastError",
        "activationProxySlots",
    ];

    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }

    /// Computes the state after taking the claim at `now`.
    ///
    /// Rejected when already applied, or when an in-progress marker is younger
    /// than `stale_after`.
    pub fn claim(&self, now: Timestamp, stale_after: Duration) -> Result<Self, ClaimRejection> {
        if let Some(at) = self.applied_at {
            return Err(ClaimRejection::AlreadyApplied { at });
        }

        if let Some(since) = self.in_progress_at {
            if now.duration_since(&since) < stale_after {
                return Err(ClaimRejection::InProgress { since });
            }
        }

        Ok(Self {
            in_progress_at: Some(now),
            applied_at: None,
            attempts: self.attempts.saturating_add(1),
            last_error: self.last_error.clone(),
            proxy_slots: self.proxy_slots.clone(),
        })
    }

    /// Whether the in-progress marker is still the one `ticket` took.
    pub fn is_held_by(&self, ticket: &ClaimTicket) -> bool {
        self.applied_at.is_none() && self.in_progress_at == Some(ticket.claimed_at)
    }

    /// State after successful fulfillment.
    pub fn completed(&self, now: Timestamp) -> Self {
        Self {
            in_progress_at: None,
            applied_at: Some(now),
            attempts: self.attempts,
            last_error: None,
            proxy_slots: self.proxy_slots.clone(),
        }
    }

    /// State after a failed attempt: claim dropped, counter kept, error noted.
    pub fn released_with_error(&self, error: impl Into<String>) -> Self {
        Self {
            in_progress_at: None,
            applied_at: None,
            attempts: self.attempts,
            last_error: Some(error.into()),
            proxy_slots: self.proxy_slots.clone(),
        }
    }

    /// Records proxy slots created by an attempt that fell short.
    pub fn with_proxy_slots(mut self, slots: Vec<String>) -> Self {
        self.proxy_slots = slots;
        self
    }
}
