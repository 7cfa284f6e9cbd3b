use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Display;

/// The session principal, either anonymous or backed by a permanent credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub is_anonymous: bool,
    pub email: Option<String>,
}

impl Identity {
    #[must_use]
    pub fn anonymous(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_anonymous: true,
            email: None,
        }
    }

    #[must_use]
    pub fn permanent(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            is_anonymous: false,
            email,
        }
    }
}

/// A permanent credential that can be signed in with or linked to an anonymous identity.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Credential {
    EmailPassword { email: String, password: String },
    External { provider: String, token: String },
}

impl Credential {
    #[must_use]
    pub fn email_password(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self::EmailPassword {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Name of the provider that issued this credential.
    #[must_use]
    pub fn provider(&self) -> &str {
        match self {
            Self::EmailPassword { .. } => "password",
            Self::External { provider, .. } => provider,
        }
    }

    /// The user-facing handle of the credential, never the secret part.
    #[must_use]
    pub fn subject(&self) -> &str {
        match self {
            Self::EmailPassword { email, .. } => email,
            Self::External { provider, .. } => provider,
        }
    }
}

// Secrets must never end up in logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmailPassword { email, .. } => f
                .debug_struct("EmailPassword")
                .field("email", email)
                .finish_non_exhaustive(),
            Self::External { provider, .. } => f
                .debug_struct("External")
                .field("provider", provider)
                .finish_non_exhaustive(),
        }
    }
}

impl Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider(), self.subject())
    }
}

/// The identity and session produced by a sign-in or a link.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSession {
    pub identity: Identity,
    pub provider: String,
    pub created_at: DateTime<Utc>,
}
