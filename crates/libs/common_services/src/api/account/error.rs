use std::time::Duration;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    #[error("Account status lookup failed: {0}")]
    Unavailable(String),

    #[error("Account status lookup timed out after {0:?}")]
    Timeout(Duration),
}

pub fn log_error(error: &AccountError) {
    match error {
        AccountError::Unavailable(message) => {
            warn!("Account -> Status lookup failed: {}", message);
        }
        AccountError::Timeout(after) => {
            warn!("Account -> Status lookup timed out after {:?}", after);
        }
    }
}
