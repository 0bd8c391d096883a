//! Payment-specific error types.
//!
//! # HTTP Status Mapping
//!
//! Webhook deliveries never surface these to providers; the mapping only
//! matters for logs and the delivery journal.
//!
//! | Error | Code |
//! |-------|------|
//! | NotFound | PAYMENT_NOT_FOUND |
//! | InvalidTransition | INVALID_STATE_TRANSITION |
//! | ValidationFailed | VALIDATION_FAILED |
//! | MalformedMetadata | VALIDATION_FAILED |
//! | Infrastructure | DATABASE_ERROR |

use crate::domain::foundation::{DomainError, ErrorCode, PaymentId, ValidationError};

use super::PaymentStatus;

/// Payment-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// No payment with this id.
    NotFound(PaymentId),

    /// Requested status change is not allowed from the current status.
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// Construction input rejected.
    ValidationFailed(ValidationError),

    /// Stored metadata JSON cannot be read as payment metadata.
    MalformedMetadata {
        payment_id: PaymentId,
        reason: String,
    },

    /// Storage failure.
    Infrastructure(String),
}

impl PaymentError {
    pub fn not_found(id: PaymentId) -> Self {
        PaymentError::NotFound(id)
    }

    pub fn invalid_transition(from: PaymentStatus, to: PaymentStatus) -> Self {
        PaymentError::InvalidTransition { from, to }
    }

    pub fn malformed_metadata(payment_id: PaymentId, reason: impl Into<String>) -> Self {
        PaymentError::MalformedMetadata {
            payment_id,
            reason: reason.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        PaymentError::Infrastructure(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            PaymentError::NotFound(_) => ErrorCode::PaymentNotFound,
            PaymentError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            PaymentError::ValidationFailed(_) | PaymentError::MalformedMetadata { .. } => {
                ErrorCode::ValidationFailed
            }
            PaymentError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    pub fn message(&self) -> String {
        match self {
            PaymentError::NotFound(id) => format!("Payment not found: {}", id),
            PaymentError::InvalidTransition { from, to } => {
                format!("Cannot move payment from {} to {}", from, to)
            }
            PaymentError::ValidationFailed(err) => err.to_string(),
            PaymentError::MalformedMetadata { payment_id, reason } => {
                format!("Payment {} has malformed metadata: {}", payment_id, reason)
            }
            PaymentError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for PaymentError {}

impl From<ValidationError> for PaymentError {
    fn from(err: ValidationError) -> Self {
        PaymentError::ValidationFailed(err)
    }
}

impl From<DomainError> for PaymentError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::ValidationFailed => PaymentError::ValidationFailed(
                ValidationError::invalid_format("payment", err.message),
            ),
            _ => PaymentError::Infrastructure(err.to_string()),
        }
    }
}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
