use crate::script::{SeedAccount, SessionScript, SessionStep};
use app_state::AppSettings;
use color_eyre::Result;
use color_eyre::eyre::eyre;
use common_services::api::account::interfaces::AccountAccessState;
use common_services::api::premium::interfaces::GateDecision;
use common_services::api::premium::service::PremiumGate;
use common_services::api::recap::interfaces::CreateRecapRequest;
use common_services::context::AppContext;
use common_services::in_memory::{
    InMemoryAccountStatus, InMemoryIdentityProvider, InMemoryNotifications,
    RecordingEntitlementProvider, RecordingGenerationService, RecordingNavigator,
};
use common_types::{
    AiGenerated, DateRange, EntitlementView, GenerationOutcome, GenerationSignal, Identity,
    RecapStatus,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// State observed after one replayed step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub index: usize,
    pub step: &'static str,
    /// `ok`, or the error the step surfaced.
    pub outcome: String,
    pub identity: Option<Identity>,
    pub account: AccountAccessState,
    pub entitlement: EntitlementView,
    pub gate: GateDecision,
    pub upsell_redirects: usize,
    pub recaps: Vec<RecapSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecapSummary {
    pub id: String,
    pub owner_id: String,
    pub status: RecapStatus,
    pub title: Option<String>,
}

/// An `AppContext` wired to in-memory collaborators the script can steer.
pub struct Harness {
    context: AppContext,
    identity: Arc<InMemoryIdentityProvider>,
    entitlements: Arc<RecordingEntitlementProvider>,
    accounts: Arc<InMemoryAccountStatus>,
    navigator: Arc<RecordingNavigator>,
    gate: PremiumGate<&'static str>,
    last_recap: Option<String>,
    settle: Duration,
}

impl Harness {
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(settings: AppSettings, settle: Duration) -> Self {
        let identity = Arc::new(InMemoryIdentityProvider::new(
            settings.constants.identity_event_buffer,
        ));
        let entitlements = Arc::new(RecordingEntitlementProvider::new());
        let accounts = Arc::new(InMemoryAccountStatus::new());
        let navigator = Arc::new(RecordingNavigator::new());

        let context = AppContext::builder()
            .settings(settings)
            .identity_provider(identity.clone())
            .entitlement_provider(entitlements.clone())
            .account_source(accounts.clone())
            .navigator(navigator.clone())
            .generator(Arc::new(RecordingGenerationService::new()))
            .notifications(Arc::new(InMemoryNotifications::new()))
            .build();
        let gate = context
            .premium_gate("recaps")
            .with_fallback("upsell");
        context.start();

        Self {
            context,
            identity,
            entitlements,
            accounts,
            navigator,
            gate,
            last_recap: None,
            settle,
        }
    }

    pub fn seed(&self, accounts: &[SeedAccount]) {
        for account in accounts {
            self.identity
                .register(&account.credential, account.identity_id.clone());
            if let Some(plan) = account.plan {
                self.entitlements.set_plan(account.identity_id.clone(), plan);
            }
            if let Some(status) = &account.account {
                self.accounts
                    .set_status(account.identity_id.clone(), status.clone());
            }
        }
    }

    /// Replays every step. Step failures are reported, not fatal.
    pub async fn replay(&mut self, script: &SessionScript) -> Result<Vec<StepReport>> {
        self.seed(&script.accounts);
        tokio::time::sleep(self.settle).await;

        let mut reports = Vec::with_capacity(script.steps.len());
        for (index, step) in script.steps.iter().enumerate() {
            let outcome = match self.run_step(step).await {
                Ok(()) => "ok".to_owned(),
                Err(e) => {
                    warn!("Step {} ({}) failed: {}", index, step.name(), e);
                    e.to_string()
                }
            };
            tokio::time::sleep(self.settle).await;
            reports.push(self.report(index, step.name(), outcome).await);
        }
        self.context.stop();
        Ok(reports)
    }

    async fn run_step(&mut self, step: &SessionStep) -> Result<()> {
        match step {
            SessionStep::SignInAnonymously => {
                self.context.identity.ensure_session().await?;
            }
            SessionStep::LinkEmail { email, password } => {
                let linked = self
                    .context
                    .identity
                    .link_if_anonymous_with_email(email, password)
                    .await?;
                if linked.is_none() {
                    info!("Nothing to link, current identity is not anonymous");
                }
            }
            SessionStep::SignIn { credential } => {
                self.context.identity.sign_in_or_link(credential).await?;
            }
            SessionStep::SignOut => self.context.identity.sign_out().await?,
            SessionStep::SetPlan { status } => {
                let identity = self.current_identity()?;
                self.entitlements.set_plan(identity.id.clone(), *status);
                // Entitlements are only read on identity transitions.
                self.identity.set_identity(Some(identity));
            }
            SessionStep::SetAccount { account } => {
                let identity = self.current_identity()?;
                self.accounts.set_status(identity.id, account.clone());
            }
            SessionStep::RefreshAccount => {
                self.context.accounts.refresh().await;
            }
            SessionStep::RequestRecap {
                child_ids,
                start,
                end,
                media_entries,
            } => {
                let identity = self.current_identity()?;
                let request = CreateRecapRequest {
                    child_ids: child_ids.clone(),
                    date_range: DateRange {
                        start: *start,
                        end: *end,
                    },
                    media_entries: media_entries.clone(),
                };
                let recap = self
                    .context
                    .recaps
                    .request_recap(&identity, &self.context.entitlement_view(), request)
                    .await?;
                self.last_recap = Some(recap.id);
            }
            SessionStep::CompleteRecap {
                recap_id,
                title,
                summary,
                highlights,
            } => {
                let outcome = GenerationOutcome::Completed(AiGenerated {
                    title: title.clone(),
                    summary: summary.clone(),
                    highlights: highlights.clone(),
                });
                self.signal(recap_id.as_deref(), outcome).await?;
            }
            SessionStep::FailRecap { recap_id, reason } => {
                let outcome = GenerationOutcome::Failed {
                    reason: reason.clone(),
                };
                self.signal(recap_id.as_deref(), outcome).await?;
            }
            SessionStep::Wait { ms } => tokio::time::sleep(Duration::from_millis(*ms)).await,
        }
        Ok(())
    }

    async fn signal(&self, recap_id: Option<&str>, outcome: GenerationOutcome) -> Result<()> {
        let recap_id = recap_id
            .or(self.last_recap.as_deref())
            .ok_or_else(|| eyre!("No recap has been requested yet"))?;
        let result = self
            .context
            .recaps
            .apply_completion(GenerationSignal {
                recap_id: recap_id.to_owned(),
                outcome,
            })
            .await?;
        if !result.was_applied() {
            info!(
                "Recap {} was already {}",
                recap_id,
                result.recap().status()
            );
        }
        Ok(())
    }

    fn current_identity(&self) -> Result<Identity> {
        self.context
            .identity
            .current_identity()
            .ok_or_else(|| eyre!("No identity is signed in"))
    }

    async fn report(&mut self, index: usize, step: &'static str, outcome: String) -> StepReport {
        let entitlement = self.context.entitlement_view();
        let gate = self.gate.evaluate(&entitlement);
        let account = self.context.account_state();
        let recaps = match self.context.recap_viewer() {
            Some(viewer) => self.context.recaps.list_recaps(&viewer).await,
            None => Vec::new(),
        };

        info!(
            "[{}] {} -> {} | account: {:?} {:?} | entitlement active: {} | gate: {:?} | recaps: {}",
            index,
            step,
            outcome,
            account.phase,
            account.account_type,
            entitlement.is_active(),
            gate,
            recaps.len()
        );

        StepReport {
            index,
            step,
            outcome,
            identity: self.context.identity.current_identity(),
            account,
            entitlement,
            gate,
            upsell_redirects: self.navigator.upsell_count(),
            recaps: recaps
                .into_iter()
                .map(|recap| RecapSummary {
                    title: recap.ai_generated().map(|ai| ai.title.clone()),
                    status: recap.status(),
                    owner_id: recap.owner_id,
                    id: recap.id,
                })
                .collect(),
        }
    }
}
