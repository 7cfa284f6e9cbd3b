use crate::api::entitlement::error::{EntitlementError, log_error};
use crate::api::entitlement::interfaces::EntitlementProvider;
use crate::api::identity::interfaces::{IdentityChange, IdentityProvider};
use crate::utils::lock;
use bon::bon;
use common_types::{EntitlementView, Identity};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Mirrors identity transitions into the entitlement provider's session.
///
/// `setup` registers a single listener on the identity stream, transitions are handled one
/// at a time in emission order. Provider failures are logged and swallowed.
pub struct EntitlementSync {
    inner: Arc<SyncState>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

struct SyncState {
    identity: Arc<dyn IdentityProvider>,
    provider: Arc<dyn EntitlementProvider>,
    api_key: Option<String>,
    provider_timeout: Duration,
    subscribed: AtomicBool,
    configured: AtomicBool,
    view: watch::Sender<EntitlementView>,
}

#[bon]
impl EntitlementSync {
    #[builder]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        provider: Arc<dyn EntitlementProvider>,
        api_key: Option<String>,
        provider_timeout: Duration,
    ) -> Self {
        let (view, _) = watch::channel(initial_view(api_key.as_deref()));
        Self {
            inner: Arc::new(SyncState {
                identity,
                provider,
                api_key,
                provider_timeout,
                subscribed: AtomicBool::new(false),
                configured: AtomicBool::new(false),
                view,
            }),
            listener: Mutex::new(None),
        }
    }
}

impl EntitlementSync {
    /// Starts listening to identity transitions. Calls after the first are no-ops until
    /// `teardown` runs. Must be called from within a tokio runtime.
    pub fn setup(&self) {
        // The flag flips before anything is spawned, concurrent callers see it set.
        if self.inner.subscribed.swap(true, Ordering::SeqCst) {
            debug!("Entitlement sync already set up");
            return;
        }

        let events = self.inner.identity.subscribe();
        let initial = self.inner.identity.current_identity();
        let state = Arc::clone(&self.inner);
        let handle = tokio::spawn(state.listen(initial, events));
        *lock(&self.listener) = Some(handle);
        info!("Entitlement sync listening to identity changes");
    }

    /// Cancels the listener and resets the service to its initial state.
    pub fn teardown(&self) {
        if let Some(handle) = lock(&self.listener).take() {
            handle.abort();
        }
        self.inner.subscribed.store(false, Ordering::SeqCst);
        self.inner.configured.store(false, Ordering::SeqCst);
        self.inner
            .view
            .send_replace(initial_view(self.inner.api_key.as_deref()));
        info!("Entitlement sync torn down");
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.inner.subscribed.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.configured.load(Ordering::SeqCst)
    }

    /// The latest entitlement snapshot.
    #[must_use]
    pub fn view(&self) -> EntitlementView {
        self.inner.view.borrow().clone()
    }
}

/// Without an api key the sync stays dormant, so there is nothing to wait for.
const fn initial_view(api_key: Option<&str>) -> EntitlementView {
    if api_key.is_some() {
        EntitlementView::loading()
    } else {
        EntitlementView::settled(None)
    }
}

impl SyncState {
    async fn listen(
        self: Arc<Self>,
        initial: Option<Identity>,
        mut events: broadcast::Receiver<IdentityChange>,
    ) {
        // A signed-out start needs no log out, the provider session starts logged out.
        match &initial {
            Some(identity) => self.handle_transition(Some(identity)).await,
            None => {
                self.view.send_replace(EntitlementView::settled(None));
            }
        }

        // The replayed identity may also sit at the head of the queue, when it was emitted
        // between subscribing and reading the current identity.
        let mut replayed = initial;
        loop {
            match events.recv().await {
                Ok(change) => {
                    let already_handled = replayed
                        .take()
                        .is_some_and(|identity| change.identity() == Some(&identity));
                    if already_handled {
                        debug!("Skipping identity change that was replayed on setup");
                        continue;
                    }
                    self.handle_transition(change.identity()).await;
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(
                        "Entitlement sync fell behind, skipped {} identity changes",
                        skipped
                    );
                    replayed = None;
                    let current = self.identity.current_identity();
                    self.handle_transition(current.as_ref()).await;
                }
                Err(RecvError::Closed) => {
                    info!("Identity stream closed, entitlement sync stopping");
                    break;
                }
            }
        }
    }

    async fn handle_transition(&self, identity: Option<&Identity>) {
        // Gates must not see the previous identity's entitlement while this one resolves.
        if identity.is_some_and(|identity| !identity.is_anonymous) {
            self.view.send_replace(EntitlementView::loading());
        }
        if !self.ensure_configured().await {
            self.view.send_replace(EntitlementView::settled(None));
            return;
        }

        match identity {
            Some(identity) if !identity.is_anonymous => {
                let entitlement = match self
                    .call("log_in", self.provider.log_in(&identity.id))
                    .await
                {
                    Ok(entitlement) => {
                        info!(
                            "Entitlement provider logged in {} ({:?})",
                            identity.id, entitlement.status
                        );
                        Some(entitlement)
                    }
                    Err(e) => {
                        log_error(&e);
                        None
                    }
                };
                self.view.send_replace(EntitlementView::settled(entitlement));
            }
            Some(identity) => {
                debug!(
                    "Identity {} is anonymous, not mirroring to entitlement provider",
                    identity.id
                );
                self.view.send_replace(EntitlementView::settled(None));
            }
            None => {
                match self.call("log_out", self.provider.log_out()).await {
                    Ok(()) => info!("Entitlement provider logged out"),
                    Err(e) => log_error(&e),
                }
                self.view.send_replace(EntitlementView::settled(None));
            }
        }
    }

    /// Configures the provider once per lifetime. A failed attempt is retried on the next
    /// transition.
    async fn ensure_configured(&self) -> bool {
        if self.configured.load(Ordering::SeqCst) {
            return true;
        }
        let Some(api_key) = self.api_key.as_deref() else {
            debug!("No entitlement api key provisioned, sync is dormant");
            return false;
        };

        match self.call("configure", self.provider.configure(api_key)).await {
            Ok(()) => {
                self.configured.store(true, Ordering::SeqCst);
                info!("Entitlement provider configured");
                true
            }
            Err(e) => {
                log_error(&e);
                false
            }
        }
    }

    async fn call<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, EntitlementError>>,
    ) -> Result<T, EntitlementError> {
        timeout(self.provider_timeout, fut)
            .await
            .map_err(|_| EntitlementError::Timeout {
                operation,
                after: self.provider_timeout,
            })?
    }
}
