use crate::api::account::error::AccountError;
use async_trait::async_trait;
use common_types::{AccountStatus, AccountType, SharedAccess};
use serde::Serialize;

/// The account-status collaborator.
#[async_trait]
pub trait AccountStatusSource: Send + Sync {
    async fn fetch_account_status(&self, identity_id: &str) -> Result<AccountStatus, AccountError>;
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// Resolved account tier and sharing grants for the current identity.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AccountAccessState {
    pub phase: ResolutionPhase,
    pub identity_id: Option<String>,
    pub account_type: Option<AccountType>,
    pub shared_access: Vec<SharedAccess>,
    /// Diagnostic message of the last failed lookup.
    pub error: Option<String>,
}

impl AccountAccessState {
    /// An unresolved account type counts as full.
    #[must_use]
    pub fn is_full_account(&self) -> bool {
        self.account_type.unwrap_or(AccountType::Full) == AccountType::Full
    }

    pub fn active_grants(&self) -> impl Iterator<Item = &SharedAccess> {
        self.shared_access.iter().filter(|grant| grant.is_active())
    }

    /// Whether the current identity may read content owned by `owner_id`.
    #[must_use]
    pub fn can_view(&self, owner_id: &str) -> bool {
        self.identity_id.as_deref() == Some(owner_id)
            || self
                .active_grants()
                .any(|grant| grant.granter_identity_id == owner_id)
    }
}
