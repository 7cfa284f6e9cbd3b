use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntitlementStatus {
    Active,
    Trial,
    Inactive,
    Cancelled,
}

impl EntitlementStatus {
    /// Whether this status unlocks premium content.
    #[must_use]
    pub const fn is_entitled(self) -> bool {
        matches!(self, Self::Active | Self::Trial)
    }
}

/// Plan status as reported by the subscription provider. Only used for access gating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementState {
    pub product_id: String,
    pub status: EntitlementStatus,
}

/// In-memory snapshot of the entitlement as seen by gates.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EntitlementView {
    pub loading: bool,
    pub entitlement: Option<EntitlementState>,
}

impl EntitlementView {
    #[must_use]
    pub const fn loading() -> Self {
        Self {
            loading: true,
            entitlement: None,
        }
    }

    #[must_use]
    pub const fn settled(entitlement: Option<EntitlementState>) -> Self {
        Self {
            loading: false,
            entitlement,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.entitlement
            .as_ref()
            .is_some_and(|e| e.status.is_entitled())
    }
}
