use crate::api::identity::error::IdentityError;
use crate::api::identity::interfaces::{IdentityChange, IdentityProvider};
use crate::utils::{lock, nice_id};
use async_trait::async_trait;
use chrono::Utc;
use common_types::{Credential, CredentialSession, Identity};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;

const IDENTITY_ID_LENGTH: usize = 16;

struct Account {
    identity_id: String,
    /// Only set for email/password credentials.
    password: Option<String>,
}

#[derive(Default)]
struct IdentityState {
    current: Option<Identity>,
    /// Keyed by the credential's `provider:subject`.
    accounts: HashMap<String, Account>,
}

/// An identity provider that keeps its accounts in memory.
///
/// Unknown external credentials create a new identity on sign-in, unknown email/password
/// credentials are rejected.
pub struct InMemoryIdentityProvider {
    state: Mutex<IdentityState>,
    events: broadcast::Sender<IdentityChange>,
    subscriptions: AtomicUsize,
}

impl InMemoryIdentityProvider {
    #[must_use]
    pub fn new(event_buffer: usize) -> Self {
        let (events, _) = broadcast::channel(event_buffer.max(1));
        Self {
            state: Mutex::new(IdentityState::default()),
            events,
            subscriptions: AtomicUsize::new(0),
        }
    }

    /// Registers an existing permanent account.
    pub fn register(&self, credential: &Credential, identity_id: impl Into<String>) {
        lock(&self.state).accounts.insert(
            credential.to_string(),
            Account {
                identity_id: identity_id.into(),
                password: password_of(credential),
            },
        );
    }

    /// Replaces the current identity and emits the matching transition, bypassing credentials.
    pub fn set_identity(&self, identity: Option<Identity>) {
        lock(&self.state).current.clone_from(&identity);
        self.emit(identity.into());
    }

    /// How many listeners have been registered through `subscribe`.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    fn emit(&self, change: IdentityChange) {
        // Nobody listening is fine.
        let _ = self.events.send(change);
    }

    fn session(identity: Identity, credential: &Credential) -> CredentialSession {
        CredentialSession {
            identity,
            provider: credential.provider().to_owned(),
            created_at: Utc::now(),
        }
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new(64)
    }
}

fn email_of(credential: &Credential) -> Option<String> {
    match credential {
        Credential::EmailPassword { email, .. } => Some(email.clone()),
        Credential::External { .. } => None,
    }
}

fn password_of(credential: &Credential) -> Option<String> {
    match credential {
        Credential::EmailPassword { password, .. } => Some(password.clone()),
        Credential::External { .. } => None,
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    fn current_identity(&self) -> Option<Identity> {
        lock(&self.state).current.clone()
    }

    async fn sign_in(&self, credential: &Credential) -> Result<CredentialSession, IdentityError> {
        let identity = {
            let mut state = lock(&self.state);
            let key = credential.to_string();
            let existing = state
                .accounts
                .get(&key)
                .map(|account| (account.identity_id.clone(), account.password.clone()));
            let identity_id = match (existing, credential) {
                (Some((identity_id, stored)), Credential::EmailPassword { password, .. }) => {
                    if stored.as_deref() != Some(password.as_str()) {
                        return Err(IdentityError::InvalidCredentials);
                    }
                    identity_id
                }
                (Some((identity_id, _)), Credential::External { .. }) => identity_id,
                (None, Credential::EmailPassword { .. }) => {
                    return Err(IdentityError::InvalidCredentials);
                }
                (None, Credential::External { .. }) => {
                    let identity_id = nice_id(IDENTITY_ID_LENGTH);
                    state.accounts.insert(
                        key,
                        Account {
                            identity_id: identity_id.clone(),
                            password: None,
                        },
                    );
                    identity_id
                }
            };
            let identity = Identity::permanent(identity_id, email_of(credential));
            state.current = Some(identity.clone());
            identity
        };

        self.emit(IdentityChange::SignedIn(identity.clone()));
        Ok(Self::session(identity, credential))
    }

    async fn sign_in_anonymously(&self) -> Result<Identity, IdentityError> {
        let identity = Identity::anonymous(nice_id(IDENTITY_ID_LENGTH));
        lock(&self.state).current = Some(identity.clone());
        self.emit(IdentityChange::SignedIn(identity.clone()));
        Ok(identity)
    }

    async fn link(
        &self,
        identity_id: &str,
        credential: &Credential,
    ) -> Result<CredentialSession, IdentityError> {
        let identity = {
            let mut state = lock(&self.state);
            let key = credential.to_string();
            if let Some(existing) = state.accounts.get(&key)
                && existing.identity_id != identity_id
            {
                return Err(IdentityError::CredentialConflict {
                    credential: credential.to_string(),
                });
            }
            let Some(current) = state.current.as_mut().filter(|c| c.id == identity_id) else {
                return Err(IdentityError::NotSignedIn);
            };
            current.is_anonymous = false;
            if let Some(email) = email_of(credential) {
                current.email = Some(email);
            }
            let identity = current.clone();

            state.accounts.insert(
                key,
                Account {
                    identity_id: identity_id.to_owned(),
                    password: password_of(credential),
                },
            );
            identity
        };

        self.emit(IdentityChange::SignedIn(identity.clone()));
        Ok(Self::session(identity, credential))
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        lock(&self.state).current = None;
        self.emit(IdentityChange::SignedOut);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<IdentityChange> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        self.events.subscribe()
    }
}
