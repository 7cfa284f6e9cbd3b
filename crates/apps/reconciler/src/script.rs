use chrono::NaiveDate;
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use common_types::{AccountStatus, Credential, EntitlementStatus, MediaEntry};
use serde::Deserialize;
use std::path::Path;

/// A recorded sequence of session events plus the accounts that exist up front.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionScript {
    #[serde(default)]
    pub accounts: Vec<SeedAccount>,
    pub steps: Vec<SessionStep>,
}

impl SessionScript {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Cannot read session script {}", path.display()))?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).wrap_err("Invalid session script")
    }
}

/// A permanent account known to the identity provider before the session starts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedAccount {
    pub identity_id: String,
    pub credential: Credential,
    #[serde(default)]
    pub plan: Option<EntitlementStatus>,
    #[serde(default)]
    pub account: Option<AccountStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", tag = "step", rename_all_fields = "camelCase")]
pub enum SessionStep {
    SignInAnonymously,
    LinkEmail {
        email: String,
        password: String,
    },
    SignIn {
        credential: Credential,
    },
    SignOut,
    /// Sets the subscription plan of the current identity.
    SetPlan {
        status: EntitlementStatus,
    },
    /// Sets the account status of the current identity.
    SetAccount {
        account: AccountStatus,
    },
    RefreshAccount,
    RequestRecap {
        child_ids: Vec<String>,
        start: NaiveDate,
        end: NaiveDate,
        #[serde(default)]
        media_entries: Vec<MediaEntry>,
    },
    /// Targets the most recently requested recap unless `recap_id` is given.
    CompleteRecap {
        #[serde(default)]
        recap_id: Option<String>,
        title: String,
        summary: String,
        #[serde(default)]
        highlights: Vec<String>,
    },
    FailRecap {
        #[serde(default)]
        recap_id: Option<String>,
        reason: String,
    },
    Wait {
        ms: u64,
    },
}

impl SessionStep {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SignInAnonymously => "signInAnonymously",
            Self::LinkEmail { .. } => "linkEmail",
            Self::SignIn { .. } => "signIn",
            Self::SignOut => "signOut",
            Self::SetPlan { .. } => "setPlan",
            Self::SetAccount { .. } => "setAccount",
            Self::RefreshAccount => "refreshAccount",
            Self::RequestRecap { .. } => "requestRecap",
            Self::CompleteRecap { .. } => "completeRecap",
            Self::FailRecap { .. } => "failRecap",
            Self::Wait { .. } => "wait",
        }
    }
}
