use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The credential already belongs to a different identity. The caller decides between
    /// offering "sign in instead" and a retry, so this is never swallowed.
    #[error("Credential {credential} is already linked to another identity")]
    CredentialConflict { credential: String },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Linking replaced identity {expected} with {actual}")]
    IdentityChanged { expected: String, actual: String },

    #[error("No identity is signed in")]
    NotSignedIn,

    #[error("Identity provider error: {0}")]
    Provider(String),
}

impl IdentityError {
    #[must_use]
    pub const fn is_credential_conflict(&self) -> bool {
        matches!(self, Self::CredentialConflict { .. })
    }
}

pub fn log_error(error: &IdentityError) {
    match error {
        IdentityError::CredentialConflict { credential } => {
            warn!("Identity -> Credential conflict: {}", credential);
        }
        IdentityError::InvalidCredentials => warn!("Identity -> Invalid credentials"),
        IdentityError::IdentityChanged { expected, actual } => {
            warn!(
                "Identity -> Link dropped anonymous identity {} in favour of {}",
                expected, actual
            );
        }
        IdentityError::NotSignedIn => warn!("Identity -> Not signed in"),
        IdentityError::Provider(message) => warn!("Identity provider failed: {}", message),
    }
}
