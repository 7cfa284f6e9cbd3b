use crate::runner::context::test_context::TestContext;
use crate::test_constants::{
    GRANTEE_EMAIL, GRANTEE_ID, GRANTEE_PASSWORD, OWNER_EMAIL, OWNER_ID, OWNER_PASSWORD, WAIT,
};
use color_eyre::eyre::{Result, bail};
use common_services::context::AppContext;
use common_services::in_memory::{
    InMemoryAccountStatus, InMemoryIdentityProvider, InMemoryNotifications,
    RecordingEntitlementProvider, RecordingGenerationService, RecordingNavigator,
};
use common_types::{
    AccountStatus, AccountType, Credential, CredentialSession, SharedAccess, SharedAccessRole,
    SharedAccessStatus,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// A started `AppContext` plus handles on its in-memory collaborators.
pub struct Session {
    pub app: AppContext,
    pub identity: Arc<InMemoryIdentityProvider>,
    pub entitlements: Arc<RecordingEntitlementProvider>,
    pub accounts: Arc<InMemoryAccountStatus>,
    pub navigator: Arc<RecordingNavigator>,
    pub generator: Arc<RecordingGenerationService>,
    pub notifications: Arc<InMemoryNotifications>,
}

/// Builds a fresh session with the owner and grantee accounts registered. Nobody is signed in.
pub fn start_session(context: &TestContext) -> Session {
    let identity = Arc::new(InMemoryIdentityProvider::new(
        context.settings.constants.identity_event_buffer,
    ));
    let entitlements = Arc::new(RecordingEntitlementProvider::new());
    let accounts = Arc::new(InMemoryAccountStatus::new());
    let navigator = Arc::new(RecordingNavigator::new());
    let generator = Arc::new(RecordingGenerationService::new());
    let notifications = Arc::new(InMemoryNotifications::new());

    identity.register(&owner_credential(), OWNER_ID);
    identity.register(&grantee_credential(), GRANTEE_ID);
    accounts.set_status(
        OWNER_ID,
        AccountStatus {
            account_type: Some(AccountType::Full),
            shared_access: Vec::new(),
        },
    );
    accounts.set_status(
        GRANTEE_ID,
        AccountStatus {
            account_type: Some(AccountType::Shared),
            shared_access: vec![SharedAccess {
                granter_identity_id: OWNER_ID.to_owned(),
                role: SharedAccessRole::Viewer,
                status: SharedAccessStatus::Active,
            }],
        },
    );

    let app = AppContext::builder()
        .settings(context.settings.clone())
        .identity_provider(identity.clone())
        .entitlement_provider(entitlements.clone())
        .account_source(accounts.clone())
        .navigator(navigator.clone())
        .generator(generator.clone())
        .notifications(notifications.clone())
        .build();
    app.start();

    Session {
        app,
        identity,
        entitlements,
        accounts,
        navigator,
        generator,
        notifications,
    }
}

#[must_use]
pub fn owner_credential() -> Credential {
    Credential::email_password(OWNER_EMAIL, OWNER_PASSWORD)
}

#[must_use]
pub fn grantee_credential() -> Credential {
    Credential::email_password(GRANTEE_EMAIL, GRANTEE_PASSWORD)
}

pub async fn sign_in_owner(session: &Session) -> Result<CredentialSession> {
    Ok(session.app.identity.sign_in_or_link(&owner_credential()).await?)
}

pub async fn sign_in_grantee(session: &Session) -> Result<CredentialSession> {
    Ok(session
        .app
        .identity
        .sign_in_or_link(&grantee_credential())
        .await?)
}

/// Polls `condition` until it holds, failing after `WAIT`.
pub async fn wait_until(description: &str, condition: impl Fn() -> bool) -> Result<()> {
    let deadline = Instant::now() + WAIT;
    while !condition() {
        if Instant::now() >= deadline {
            bail!("Timed out waiting until {description}");
        }
        sleep(Duration::from_millis(10)).await;
    }
    Ok(())
}
