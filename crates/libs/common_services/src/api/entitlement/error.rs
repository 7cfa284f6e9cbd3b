use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntitlementError {
    #[error("Entitlement provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Entitlement provider did not answer {operation} within {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

/// Entitlement mirroring is best-effort, so every failure ends here instead of at the caller.
pub fn log_error(error: &EntitlementError) {
    match error {
        EntitlementError::ProviderUnavailable(message) => {
            warn!("Entitlement -> Provider unavailable: {}", message);
        }
        EntitlementError::Timeout { operation, after } => {
            warn!("Entitlement -> {} timed out after {:?}", operation, after);
        }
    }
}
