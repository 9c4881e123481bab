//! Generative Call Timeouts
//!
//! The generative call is the pipeline's only suspension point and the
//! only operation with unbounded latency. Every call is wrapped in a
//! caller-supplied timeout; an expired deadline counts as one failed
//! attempt and the stage runner moves on to the next retry or fallback.

use std::future::Future;
use std::time::Duration;

use crate::types::{PlatoError, Result};

/// Execute an async operation with a timeout
///
/// Returns a timeout error if the operation doesn't complete within the
/// specified duration.
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(PlatoError::timeout(operation_name, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_success() {
        let result = with_timeout(
            Duration::from_secs(1),
            async { Ok::<_, PlatoError>(42) },
            "test operation",
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result = with_timeout(
            Duration::from_millis(10),
            async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, PlatoError>(42)
            },
            "slow operation",
        )
        .await;
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), PlatoError::Timeout { .. }));
    }
}
