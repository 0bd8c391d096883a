//! Timeout wrapper for collaborator calls.

use std::future::Future;
use std::time::Duration;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Runs `call` under `timeout`; elapsing maps to [`ErrorCode::Timeout`].
pub(crate) async fn with_deadline<T, F>(
    timeout: Duration,
    operation: &'static str,
    call: F,
) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(DomainError::new(
            ErrorCode::Timeout,
            format!("{} timed out after {}s", operation, timeout.as_secs_f64()),
        )),
    }
}
