use crate::api::entitlement::error::EntitlementError;
use async_trait::async_trait;
use common_types::EntitlementState;

/// The external subscription provider.
#[async_trait]
pub trait EntitlementProvider: Send + Sync {
    async fn configure(&self, api_key: &str) -> Result<(), EntitlementError>;

    /// Associates the provider session with `identity_id` and returns its current plan.
    async fn log_in(&self, identity_id: &str) -> Result<EntitlementState, EntitlementError>;

    async fn log_out(&self) -> Result<(), EntitlementError>;
}
