use crate::api::account::error::AccountError;
use crate::api::account::interfaces::AccountStatusSource;
use crate::utils::lock;
use async_trait::async_trait;
use common_types::AccountStatus;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::sleep;

/// Account statuses keyed by identity id. Unknown identities resolve to an empty status.
#[derive(Default)]
pub struct InMemoryAccountStatus {
    statuses: Mutex<HashMap<String, AccountStatus>>,
    delays: Mutex<HashMap<String, Duration>>,
    lookups: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl InMemoryAccountStatus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&self, identity_id: impl Into<String>, status: AccountStatus) {
        lock(&self.statuses).insert(identity_id.into(), status);
    }

    /// Delays every lookup for `identity_id`.
    pub fn set_delay(&self, identity_id: impl Into<String>, delay: Duration) {
        lock(&self.delays).insert(identity_id.into(), delay);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Identity ids looked up so far, in call order.
    #[must_use]
    pub fn lookups(&self) -> Vec<String> {
        lock(&self.lookups).clone()
    }
}

#[async_trait]
impl AccountStatusSource for InMemoryAccountStatus {
    async fn fetch_account_status(&self, identity_id: &str) -> Result<AccountStatus, AccountError> {
        lock(&self.lookups).push(identity_id.to_owned());

        let delay = lock(&self.delays).get(identity_id).copied();
        if let Some(delay) = delay {
            sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(AccountError::Unavailable("status service returned 503".to_owned()));
        }
        Ok(lock(&self.statuses)
            .get(identity_id)
            .cloned()
            .unwrap_or_default())
    }
}
