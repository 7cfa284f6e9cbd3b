use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;

/// The derived access tier of an identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// An owning, unrestricted account.
    Full,
    /// Access derived from another account's grant.
    Shared,
}

impl Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Full => "full",
            Self::Shared => "shared",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SharedAccessRole {
    Viewer,
    Contributor,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SharedAccessStatus {
    Pending,
    Active,
    Revoked,
}

/// One grant of visibility into another identity's content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SharedAccess {
    pub granter_identity_id: String,
    pub role: SharedAccessRole,
    pub status: SharedAccessStatus,
}

impl SharedAccess {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == SharedAccessStatus::Active
    }
}

/// What the account-status collaborator returns for one identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatus {
    pub account_type: Option<AccountType>,
    #[serde(default)]
    pub shared_access: Vec<SharedAccess>,
}
