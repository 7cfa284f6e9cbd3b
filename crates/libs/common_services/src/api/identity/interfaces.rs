use crate::api::identity::error::IdentityError;
use async_trait::async_trait;
use common_types::{Credential, CredentialSession, Identity};
use tokio::sync::broadcast;

/// One transition on the identity stream, in the order the provider emitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityChange {
    SignedIn(Identity),
    SignedOut,
}

impl IdentityChange {
    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        match self {
            Self::SignedIn(identity) => Some(identity),
            Self::SignedOut => None,
        }
    }
}

impl From<Option<Identity>> for IdentityChange {
    fn from(identity: Option<Identity>) -> Self {
        identity.map_or(Self::SignedOut, Self::SignedIn)
    }
}

/// The external authentication provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The identity of the current session, if any.
    fn current_identity(&self) -> Option<Identity>;

    async fn sign_in(&self, credential: &Credential) -> Result<CredentialSession, IdentityError>;

    async fn sign_in_anonymously(&self) -> Result<Identity, IdentityError>;

    /// Attaches `credential` to an existing identity, keeping its id.
    async fn link(
        &self,
        identity_id: &str,
        credential: &Credential,
    ) -> Result<CredentialSession, IdentityError>;

    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Registers a listener on identity transitions.
    fn subscribe(&self) -> broadcast::Receiver<IdentityChange>;
}
