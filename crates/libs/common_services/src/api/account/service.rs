use crate::api::account::error::{AccountError, log_error};
use crate::api::account::interfaces::{AccountAccessState, AccountStatusSource, ResolutionPhase};
use crate::api::identity::interfaces::IdentityProvider;
use crate::utils::lock;
use app_state::ResolutionFallback;
use bon::bon;
use common_types::{AccountType, Identity};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Derives the account type and sharing grants of the current identity.
///
/// Every lookup carries a ticket naming the identity and attempt it was issued for. Only the
/// most recently issued ticket may write its result, older ones are discarded.
#[derive(Clone)]
pub struct AccountAccessResolver {
    inner: Arc<ResolverState>,
}

struct ResolverState {
    source: Arc<dyn AccountStatusSource>,
    fallback: ResolutionFallback,
    lookup_timeout: Duration,
    attempts: AtomicU64,
    /// All writes to `state` happen while this lock is held.
    current: Mutex<Option<Ticket>>,
    state: watch::Sender<AccountAccessState>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Ticket {
    identity_id: String,
    attempt: u64,
}

#[bon]
impl AccountAccessResolver {
    #[builder]
    pub fn new(
        source: Arc<dyn AccountStatusSource>,
        #[builder(default)] fallback: ResolutionFallback,
        lookup_timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(AccountAccessState::default());
        Self {
            inner: Arc::new(ResolverState {
                source,
                fallback,
                lookup_timeout,
                attempts: AtomicU64::new(0),
                current: Mutex::new(None),
                state,
            }),
        }
    }
}

impl AccountAccessResolver {
    #[must_use]
    pub fn state(&self) -> AccountAccessState {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AccountAccessState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn is_full_account(&self) -> bool {
        self.inner.state.borrow().is_full_account()
    }

    /// Resets to the signed-out state. In-flight lookups are discarded.
    pub fn clear(&self) {
        let mut current = lock(&self.inner.current);
        *current = None;
        self.inner.state.send_replace(AccountAccessState::default());
        debug!("Account access cleared");
    }

    /// Re-derives the account state for a new identity, or clears it when signed out.
    pub async fn on_identity_changed(&self, identity: Option<&Identity>) -> AccountAccessState {
        match identity {
            None => {
                self.clear();
                self.state()
            }
            Some(identity) => {
                let ticket = self.begin(&identity.id);
                self.finish(ticket).await
            }
        }
    }

    /// Runs the lookup again for the current identity, e.g. after accepting a shared-access
    /// invite.
    pub async fn refresh(&self) -> AccountAccessState {
        let ticket = {
            let mut current = lock(&self.inner.current);
            let Some(identity_id) = current.as_ref().map(|ticket| ticket.identity_id.clone())
            else {
                debug!("No identity to refresh account access for");
                return self.state();
            };
            self.issue(&mut current, &identity_id)
        };
        self.finish(ticket).await
    }

    /// Follows the identity stream. Lookups run concurrently, the newest one wins.
    pub fn spawn_listener(&self, identity: Arc<dyn IdentityProvider>) -> JoinHandle<()> {
        let mut events = identity.subscribe();
        let initial = identity.current_identity();
        let resolver = self.clone();

        tokio::spawn(async move {
            resolver.follow(initial.as_ref());
            loop {
                match events.recv().await {
                    Ok(change) => resolver.follow(change.identity()),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            "Account resolver fell behind, skipped {} identity changes",
                            skipped
                        );
                        resolver.follow(identity.current_identity().as_ref());
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn follow(&self, identity: Option<&Identity>) {
        match identity {
            None => self.clear(),
            Some(identity) => {
                // Issue the ticket here so tickets follow event order, not task scheduling.
                let ticket = self.begin(&identity.id);
                let resolver = self.clone();
                tokio::spawn(async move {
                    resolver.finish(ticket).await;
                });
            }
        }
    }

    fn begin(&self, identity_id: &str) -> Ticket {
        let mut current = lock(&self.inner.current);
        self.issue(&mut current, identity_id)
    }

    /// Replaces the current ticket. `current` is the held `current` lock.
    fn issue(&self, current: &mut Option<Ticket>, identity_id: &str) -> Ticket {
        let ticket = Ticket {
            identity_id: identity_id.to_owned(),
            attempt: self.inner.attempts.fetch_add(1, Ordering::SeqCst) + 1,
        };
        *current = Some(ticket.clone());

        self.inner.state.send_modify(|state| {
            if state.identity_id.as_deref() != Some(identity_id) {
                *state = AccountAccessState {
                    identity_id: Some(identity_id.to_owned()),
                    ..AccountAccessState::default()
                };
            }
            state.phase = ResolutionPhase::Loading;
            state.error = None;
        });
        ticket
    }

    async fn finish(&self, ticket: Ticket) -> AccountAccessState {
        let lookup_timeout = self.inner.lookup_timeout;
        let result = timeout(
            lookup_timeout,
            self.inner.source.fetch_account_status(&ticket.identity_id),
        )
        .await
        .unwrap_or(Err(AccountError::Timeout(lookup_timeout)));

        let next = match result {
            Ok(status) => {
                info!(
                    "Resolved account for {}: {:?}, {} shared grants",
                    ticket.identity_id,
                    status.account_type,
                    status.shared_access.len()
                );
                AccountAccessState {
                    phase: ResolutionPhase::Ready,
                    identity_id: Some(ticket.identity_id.clone()),
                    account_type: status.account_type,
                    shared_access: status.shared_access,
                    error: None,
                }
            }
            Err(e) => {
                log_error(&e);
                let account_type = match self.inner.fallback {
                    ResolutionFallback::FullAccess => AccountType::Full,
                    ResolutionFallback::SharedOnly => AccountType::Shared,
                };
                warn!(
                    "Account for {} degraded to {} ({:?} fallback)",
                    ticket.identity_id, account_type, self.inner.fallback
                );
                AccountAccessState {
                    phase: ResolutionPhase::Error,
                    identity_id: Some(ticket.identity_id.clone()),
                    account_type: Some(account_type),
                    shared_access: Vec::new(),
                    error: Some(e.to_string()),
                }
            }
        };

        let current = lock(&self.inner.current);
        if current.as_ref() != Some(&ticket) {
            debug!(
                "Discarding stale account resolution for {} (attempt {})",
                ticket.identity_id, ticket.attempt
            );
            return self.inner.state.borrow().clone();
        }
        self.inner.state.send_replace(next.clone());
        next
    }
}
