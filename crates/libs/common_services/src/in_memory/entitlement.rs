use crate::api::entitlement::error::EntitlementError;
use crate::api::entitlement::interfaces::EntitlementProvider;
use crate::utils::lock;
use async_trait::async_trait;
use common_types::{EntitlementState, EntitlementStatus};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::{Instant, sleep};

pub const DEFAULT_PRODUCT_ID: &str = "premium";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitlementCall {
    Configure(String),
    LogIn(String),
    LogOut,
}

/// An entitlement provider that records every call in order.
#[derive(Default)]
pub struct RecordingEntitlementProvider {
    calls: Mutex<Vec<EntitlementCall>>,
    plans: Mutex<HashMap<String, EntitlementState>>,
    latency: Mutex<Option<Duration>>,
    failing: AtomicBool,
    failing_configure: AtomicBool,
}

impl RecordingEntitlementProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the plan returned when `identity_id` logs in. Unknown identities are inactive.
    pub fn set_plan(&self, identity_id: impl Into<String>, status: EntitlementStatus) {
        lock(&self.plans).insert(
            identity_id.into(),
            EntitlementState {
                product_id: DEFAULT_PRODUCT_ID.to_owned(),
                status,
            },
        );
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_failing_configure(&self, failing: bool) {
        self.failing_configure.store(failing, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Option<Duration>) {
        *lock(&self.latency) = latency;
    }

    #[must_use]
    pub fn calls(&self) -> Vec<EntitlementCall> {
        lock(&self.calls).clone()
    }

    #[must_use]
    pub fn configure_count(&self) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|c| matches!(c, EntitlementCall::Configure(_)))
            .count()
    }

    /// Waits until at least `count` calls were recorded, or `limit` elapses.
    pub async fn wait_for_calls(&self, count: usize, limit: Duration) -> Vec<EntitlementCall> {
        let deadline = Instant::now() + limit;
        loop {
            let calls = self.calls();
            if calls.len() >= count || Instant::now() >= deadline {
                return calls;
            }
            sleep(Duration::from_millis(5)).await;
        }
    }

    async fn record(&self, call: EntitlementCall) -> Result<(), EntitlementError> {
        let is_configure = matches!(call, EntitlementCall::Configure(_));
        lock(&self.calls).push(call);

        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            sleep(latency).await;
        }

        let failing = if is_configure {
            self.failing_configure.load(Ordering::SeqCst)
        } else {
            self.failing.load(Ordering::SeqCst)
        };
        if failing {
            return Err(EntitlementError::ProviderUnavailable(
                "connection refused".to_owned(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl EntitlementProvider for RecordingEntitlementProvider {
    async fn configure(&self, api_key: &str) -> Result<(), EntitlementError> {
        self.record(EntitlementCall::Configure(api_key.to_owned()))
            .await
    }

    async fn log_in(&self, identity_id: &str) -> Result<EntitlementState, EntitlementError> {
        self.record(EntitlementCall::LogIn(identity_id.to_owned()))
            .await?;
        let plan = lock(&self.plans).get(identity_id).cloned();
        Ok(plan.unwrap_or_else(|| EntitlementState {
            product_id: DEFAULT_PRODUCT_ID.to_owned(),
            status: EntitlementStatus::Inactive,
        }))
    }

    async fn log_out(&self) -> Result<(), EntitlementError> {
        self.record(EntitlementCall::LogOut).await
    }
}
