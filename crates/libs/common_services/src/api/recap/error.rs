use crate::api::notification::error::NotificationError;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecapError {
    #[error("Recap not found: {0}")]
    NotFound(String),

    #[error("An active subscription is required to generate recaps")]
    PremiumRequired,

    #[error("Invalid recap request: {0}")]
    InvalidRequest(String),

    #[error("Generation request rejected: {0}")]
    GenerationRejected(String),

    #[error("Notification failed: {0}")]
    Notification(#[from] NotificationError),
}

pub fn log_error(error: &RecapError) {
    match error {
        RecapError::NotFound(id) => warn!("Recap -> Not found: {}", id),
        RecapError::PremiumRequired => warn!("Recap -> Premium required"),
        RecapError::InvalidRequest(message) => warn!("Recap -> Invalid request: {}", message),
        RecapError::GenerationRejected(message) => {
            warn!("Recap -> Generation service rejected request: {}", message);
        }
        RecapError::Notification(e) => warn!("Recap -> Notification failed: {}", e),
    }
}
