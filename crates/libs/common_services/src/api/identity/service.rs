use crate::api::identity::error::{IdentityError, log_error};
use crate::api::identity::interfaces::IdentityProvider;
use common_types::{Credential, CredentialSession, Identity};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Upgrades anonymous sessions to permanent ones without losing the anonymous id.
#[derive(Clone)]
pub struct IdentityLinker {
    provider: Arc<dyn IdentityProvider>,
}

impl IdentityLinker {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self { provider }
    }

    #[must_use]
    pub fn current_identity(&self) -> Option<Identity> {
        self.provider.current_identity()
    }

    #[must_use]
    pub fn is_current_user_anonymous(&self) -> bool {
        self.provider
            .current_identity()
            .is_some_and(|identity| identity.is_anonymous)
    }

    /// Links `credential` to the current anonymous identity, or signs in with it when the
    /// current identity is already permanent (or absent).
    ///
    /// # Errors
    ///
    /// * `IdentityError::CredentialConflict` if the credential belongs to another identity.
    /// * `IdentityError::IdentityChanged` if the provider answered a link with a different id.
    /// * Any error the provider returns for a plain sign-in.
    #[instrument(skip(self))]
    pub async fn sign_in_or_link(
        &self,
        credential: &Credential,
    ) -> Result<CredentialSession, IdentityError> {
        match self.provider.current_identity() {
            Some(current) if current.is_anonymous => self.link(&current, credential).await,
            _ => {
                let session = self
                    .provider
                    .sign_in(credential)
                    .await
                    .inspect_err(log_error)?;
                info!(
                    "Signed in {} as identity {}",
                    credential, session.identity.id
                );
                Ok(session)
            }
        }
    }

    /// Links an email/password credential when the current identity is anonymous.
    ///
    /// Returns `Ok(None)` when there is nothing to link, the caller should fall back to the
    /// regular sign-in or sign-up flow.
    #[instrument(skip(self, password))]
    pub async fn link_if_anonymous_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<CredentialSession>, IdentityError> {
        let Some(current) = self
            .provider
            .current_identity()
            .filter(|identity| identity.is_anonymous)
        else {
            debug!("Current identity is not anonymous, nothing to link");
            return Ok(None);
        };

        let credential = Credential::email_password(email, password);
        self.link(&current, &credential).await.map(Some)
    }

    /// Returns the current identity, signing in anonymously on first launch.
    #[instrument(skip(self))]
    pub async fn ensure_session(&self) -> Result<Identity, IdentityError> {
        if let Some(identity) = self.provider.current_identity() {
            return Ok(identity);
        }
        let identity = self
            .provider
            .sign_in_anonymously()
            .await
            .inspect_err(log_error)?;
        info!("Started anonymous session {}", identity.id);
        Ok(identity)
    }

    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), IdentityError> {
        if self.provider.current_identity().is_none() {
            return Err(IdentityError::NotSignedIn);
        }
        self.provider.sign_out().await.inspect_err(log_error)?;
        info!("Signed out");
        Ok(())
    }

    async fn link(
        &self,
        anonymous: &Identity,
        credential: &Credential,
    ) -> Result<CredentialSession, IdentityError> {
        let session = self
            .provider
            .link(&anonymous.id, credential)
            .await
            .inspect_err(log_error)?;

        if session.identity.id != anonymous.id {
            let error = IdentityError::IdentityChanged {
                expected: anonymous.id.clone(),
                actual: session.identity.id,
            };
            log_error(&error);
            return Err(error);
        }

        info!("Linked {} to anonymous identity {}", credential, anonymous.id);
        Ok(session)
    }
}
