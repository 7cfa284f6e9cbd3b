use crate::api::account::interfaces::{AccountAccessState, AccountStatusSource};
use crate::api::account::service::AccountAccessResolver;
use crate::api::entitlement::interfaces::EntitlementProvider;
use crate::api::entitlement::service::EntitlementSync;
use crate::api::identity::interfaces::IdentityProvider;
use crate::api::identity::service::IdentityLinker;
use crate::api::notification::interfaces::NotificationSink;
use crate::api::premium::interfaces::Navigator;
use crate::api::premium::service::PremiumGate;
use crate::api::recap::interfaces::{GenerationService, RecapViewer};
use crate::api::recap::service::RecapLifecycle;
use crate::utils::lock;
use app_state::AppSettings;
use bon::bon;
use common_types::EntitlementView;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tracing::info;

/// Wires the services to their collaborators and owns the background listeners.
pub struct AppContext {
    pub settings: AppSettings,
    pub identity: IdentityLinker,
    pub entitlements: EntitlementSync,
    pub accounts: AccountAccessResolver,
    pub recaps: RecapLifecycle,
    pub notifications: Arc<dyn NotificationSink>,
    identity_provider: Arc<dyn IdentityProvider>,
    navigator: Arc<dyn Navigator>,
    account_listener: Mutex<Option<JoinHandle<()>>>,
}

#[bon]
impl AppContext {
    #[builder]
    pub fn new(
        settings: AppSettings,
        identity_provider: Arc<dyn IdentityProvider>,
        entitlement_provider: Arc<dyn EntitlementProvider>,
        account_source: Arc<dyn AccountStatusSource>,
        navigator: Arc<dyn Navigator>,
        generator: Arc<dyn GenerationService>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        let constants = &settings.constants;
        let entitlements = EntitlementSync::builder()
            .identity(identity_provider.clone())
            .provider(entitlement_provider)
            .maybe_api_key(settings.entitlement.api_key.clone())
            .provider_timeout(constants.provider_timeout)
            .build();
        let accounts = AccountAccessResolver::builder()
            .source(account_source)
            .fallback(constants.resolution_fallback)
            .lookup_timeout(constants.provider_timeout)
            .build();
        let recaps = RecapLifecycle::builder()
            .generator(generator)
            .notifications(notifications.clone())
            .id_length(constants.recap_id_length)
            .build();

        Self {
            identity: IdentityLinker::new(identity_provider.clone()),
            entitlements,
            accounts,
            recaps,
            notifications,
            identity_provider,
            navigator,
            account_listener: Mutex::new(None),
            settings,
        }
    }
}

impl AppContext {
    /// Starts the entitlement sync and the account listener. Safe to call repeatedly.
    pub fn start(&self) {
        self.entitlements.setup();
        let mut listener = lock(&self.account_listener);
        if listener.is_none() {
            *listener = Some(
                self.accounts
                    .spawn_listener(Arc::clone(&self.identity_provider)),
            );
            info!("Account access listener started");
        }
    }

    pub fn stop(&self) {
        self.entitlements.teardown();
        if let Some(handle) = lock(&self.account_listener).take() {
            handle.abort();
            info!("Account access listener stopped");
        }
    }

    #[must_use]
    pub fn entitlement_view(&self) -> EntitlementView {
        self.entitlements.view()
    }

    #[must_use]
    pub fn account_state(&self) -> AccountAccessState {
        self.accounts.state()
    }

    /// The current identity as a recap viewer, with the grants resolved so far.
    #[must_use]
    pub fn recap_viewer(&self) -> Option<RecapViewer> {
        let state = self.accounts.state();
        match RecapViewer::from_access(&state) {
            Some(viewer) => Some(viewer),
            None => self
                .identity
                .current_identity()
                .map(|identity| RecapViewer::owner(identity.id)),
        }
    }

    #[must_use]
    pub fn premium_gate<T>(&self, children: T) -> PremiumGate<T> {
        PremiumGate::new(children, Arc::clone(&self.navigator))
    }
}

impl Drop for AppContext {
    fn drop(&mut self) {
        self.stop();
    }
}
