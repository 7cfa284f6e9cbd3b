use crate::api::account::interfaces::AccountAccessState;
use crate::api::recap::error::RecapError;
use async_trait::async_trait;
use common_types::{DateRange, MediaEntry, Recap, SharedAccess};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The content-generation collaborator. Completion comes back through
/// `RecapLifecycle::apply_completion`.
#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn request_generation(&self, request: GenerationRequest) -> Result<(), RecapError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub recap_id: String,
    pub owner_id: String,
    pub child_ids: Vec<String>,
    pub date_range: DateRange,
    pub media_item_ids: Vec<String>,
}

impl From<&Recap> for GenerationRequest {
    fn from(recap: &Recap) -> Self {
        Self {
            recap_id: recap.id.clone(),
            owner_id: recap.owner_id.clone(),
            child_ids: recap.child_ids.clone(),
            date_range: recap.date_range,
            media_item_ids: recap
                .media_entries
                .iter()
                .map(|e| e.media_item_id.clone())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecapRequest {
    pub child_ids: Vec<String>,
    pub date_range: DateRange,
    #[serde(default)]
    pub media_entries: Vec<MediaEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// The signal moved the recap out of `generating`.
    Applied(Recap),
    /// The recap was already terminal, the signal was ignored.
    AlreadySettled(Recap),
}

impl CompletionOutcome {
    #[must_use]
    pub const fn recap(&self) -> &Recap {
        match self {
            Self::Applied(recap) | Self::AlreadySettled(recap) => recap,
        }
    }

    #[must_use]
    pub const fn was_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }
}

/// Who is looking at recaps: an identity plus the owners that granted it access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecapViewer {
    pub identity_id: String,
    granted_by: HashSet<String>,
}

impl RecapViewer {
    /// Only active grants count.
    pub fn new(identity_id: impl Into<String>, grants: &[SharedAccess]) -> Self {
        Self {
            identity_id: identity_id.into(),
            granted_by: grants
                .iter()
                .filter(|grant| grant.is_active())
                .map(|grant| grant.granter_identity_id.clone())
                .collect(),
        }
    }

    #[must_use]
    pub fn owner(identity_id: impl Into<String>) -> Self {
        Self::new(identity_id, &[])
    }

    #[must_use]
    pub fn from_access(state: &AccountAccessState) -> Option<Self> {
        let identity_id = state.identity_id.as_ref()?;
        Some(Self::new(identity_id.clone(), &state.shared_access))
    }

    #[must_use]
    pub fn can_read(&self, owner_id: &str) -> bool {
        self.identity_id == owner_id || self.granted_by.contains(owner_id)
    }
}
