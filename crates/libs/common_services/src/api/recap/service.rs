use crate::alert;
use crate::api::notification::interfaces::NotificationSink;
use crate::api::notification::service::{comment_added, recap_ready};
use crate::api::recap::error::{RecapError, log_error};
use crate::api::recap::interfaces::{
    CompletionOutcome, CreateRecapRequest, GenerationRequest, GenerationService, RecapViewer,
};
use crate::api::recap::store::RecapStore;
use crate::utils::nice_id;
use bon::bon;
use chrono::Utc;
use common_types::{EntitlementView, GenerationSignal, Identity, Recap, RecapStatus};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Owns recaps from request to their terminal state, plus the engagement counters.
///
/// A recap is `generating` until exactly one completion signal settles it. Signals for a
/// settled recap are ignored, so redelivery is harmless.
pub struct RecapLifecycle {
    store: RecapStore,
    generator: Arc<dyn GenerationService>,
    notifications: Arc<dyn NotificationSink>,
    id_length: usize,
}

#[bon]
impl RecapLifecycle {
    #[builder]
    pub fn new(
        generator: Arc<dyn GenerationService>,
        notifications: Arc<dyn NotificationSink>,
        #[builder(default = 12)] id_length: usize,
    ) -> Self {
        Self {
            store: RecapStore::new(),
            generator,
            notifications,
            id_length,
        }
    }
}

impl RecapLifecycle {
    /// Stores a new `generating` recap and hands it to the generation service.
    ///
    /// # Errors
    ///
    /// * `RecapError::PremiumRequired` when the requester has no active entitlement.
    /// * `RecapError::InvalidRequest` for an inverted date range or an empty child list.
    /// * `RecapError::GenerationRejected` when the generation service refuses the work. The
    ///   recap is not kept in that case.
    #[instrument(skip(self, requester, entitlement, request), fields(requester = %requester.id))]
    pub async fn request_recap(
        &self,
        requester: &Identity,
        entitlement: &EntitlementView,
        request: CreateRecapRequest,
    ) -> Result<Recap, RecapError> {
        if !entitlement.is_active() {
            let error = RecapError::PremiumRequired;
            log_error(&error);
            return Err(error);
        }
        if request.child_ids.is_empty() {
            return Err(RecapError::InvalidRequest(
                "a recap needs at least one child".to_owned(),
            ));
        }
        if !request.date_range.is_valid() {
            return Err(RecapError::InvalidRequest(format!(
                "date range starts after it ends ({} > {})",
                request.date_range.start, request.date_range.end
            )));
        }
        if let Some(entry) = request
            .media_entries
            .iter()
            .find(|entry| !request.date_range.contains(entry.taken_at.date_naive()))
        {
            return Err(RecapError::InvalidRequest(format!(
                "media item {} was taken outside {} - {}",
                entry.media_item_id, request.date_range.start, request.date_range.end
            )));
        }

        let recap = Recap::generating()
            .id(nice_id(self.id_length))
            .owner_id(requester.id.clone())
            .child_ids(request.child_ids)
            .date_range(request.date_range)
            .media_entries(request.media_entries)
            .call();
        self.store.insert(recap.clone()).await;

        if let Err(error) = self
            .generator
            .request_generation(GenerationRequest::from(&recap))
            .await
        {
            self.store.remove(&recap.id).await;
            log_error(&error);
            return Err(error);
        }

        info!(
            "Requested recap {} with {} media entries",
            recap.id,
            recap.media_entries.len()
        );
        Ok(recap)
    }

    /// Applies a completion signal from the generation service.
    ///
    /// # Errors
    ///
    /// * `RecapError::NotFound` for an unknown recap id.
    /// * `RecapError::Notification` if the owner could not be notified. The recap is
    ///   completed regardless, a redelivered signal will report `AlreadySettled`.
    #[instrument(skip(self, signal), fields(recap_id = %signal.recap_id))]
    pub async fn apply_completion(
        &self,
        signal: GenerationSignal,
    ) -> Result<CompletionOutcome, RecapError> {
        let GenerationSignal { recap_id, outcome } = signal;
        let Some((applied, recap)) = self
            .store
            .update(&recap_id, |recap| recap.settle(outcome, Utc::now()))
            .await
        else {
            alert!("Completion signal for unknown recap {}", recap_id);
            return Err(RecapError::NotFound(recap_id));
        };

        if !applied {
            debug!(
                "Ignoring completion signal for recap {}, already {}",
                recap.id,
                recap.status()
            );
            return Ok(CompletionOutcome::AlreadySettled(recap));
        }

        match recap.status() {
            RecapStatus::Completed => {
                info!("Recap {} completed", recap.id);
                self.notifications
                    .create(recap_ready(&recap))
                    .await
                    .map_err(RecapError::from)
                    .inspect_err(log_error)?;
            }
            RecapStatus::Failed => warn!(
                "Recap {} failed: {}",
                recap.id,
                recap.failure_reason().unwrap_or("unknown reason")
            ),
            RecapStatus::Generating => {}
        }
        Ok(CompletionOutcome::Applied(recap))
    }

    /// # Errors
    ///
    /// `RecapError::NotFound` when the recap does not exist or the viewer may not read it.
    pub async fn get_recap(
        &self,
        viewer: &RecapViewer,
        recap_id: &str,
    ) -> Result<Recap, RecapError> {
        self.store
            .find_by_id(recap_id)
            .await
            .filter(|recap| viewer.can_read(&recap.owner_id))
            .ok_or_else(|| RecapError::NotFound(recap_id.to_owned()))
    }

    /// Recaps owned by the viewer or shared with it, newest first.
    pub async fn list_recaps(&self, viewer: &RecapViewer) -> Vec<Recap> {
        self.store
            .list_by_owner(|owner_id| viewer.can_read(owner_id))
            .await
    }

    /// # Errors
    ///
    /// `RecapError::NotFound` when the recap does not exist or the viewer may not read it.
    #[instrument(skip(self, viewer), fields(viewer = %viewer.identity_id))]
    pub async fn toggle_favorite(
        &self,
        viewer: &RecapViewer,
        recap_id: &str,
    ) -> Result<Recap, RecapError> {
        self.engage(viewer, recap_id, |recap| {
            recap.toggle_favorite(Utc::now());
        })
        .await
    }

    /// # Errors
    ///
    /// `RecapError::NotFound` when the recap does not exist or the viewer may not read it.
    #[instrument(skip(self, viewer), fields(viewer = %viewer.identity_id))]
    pub async fn toggle_milestone(
        &self,
        viewer: &RecapViewer,
        recap_id: &str,
    ) -> Result<Recap, RecapError> {
        self.engage(viewer, recap_id, |recap| {
            recap.toggle_milestone(Utc::now());
        })
        .await
    }

    /// # Errors
    ///
    /// `RecapError::NotFound` when the recap does not exist or the viewer may not read it.
    #[instrument(skip(self, viewer), fields(viewer = %viewer.identity_id))]
    pub async fn increment_likes(
        &self,
        viewer: &RecapViewer,
        recap_id: &str,
    ) -> Result<Recap, RecapError> {
        self.engage(viewer, recap_id, |recap| {
            recap.increment_likes(Utc::now());
        })
        .await
    }

    /// Counts a comment and tells the owner about it when someone else wrote it.
    ///
    /// # Errors
    ///
    /// * `RecapError::InvalidRequest` for blank text.
    /// * `RecapError::NotFound` when the recap does not exist or the viewer may not read it.
    /// * `RecapError::Notification` if the owner could not be notified. The count is kept.
    #[instrument(skip(self, viewer, text), fields(viewer = %viewer.identity_id))]
    pub async fn add_comment(
        &self,
        viewer: &RecapViewer,
        recap_id: &str,
        text: &str,
    ) -> Result<Recap, RecapError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RecapError::InvalidRequest("comment text is empty".to_owned()));
        }
        let recap = self
            .engage(viewer, recap_id, |recap| {
                recap.add_comment(Utc::now());
            })
            .await?;

        if recap.owner_id != viewer.identity_id {
            self.notifications
                .create(comment_added(&recap, &viewer.identity_id, text))
                .await
                .map_err(RecapError::from)
                .inspect_err(log_error)?;
        }
        Ok(recap)
    }

    /// # Errors
    ///
    /// `RecapError::NotFound` when the recap does not exist or the viewer may not read it.
    #[instrument(skip(self, viewer), fields(viewer = %viewer.identity_id))]
    pub async fn remove_comment(
        &self,
        viewer: &RecapViewer,
        recap_id: &str,
    ) -> Result<Recap, RecapError> {
        self.engage(viewer, recap_id, |recap| {
            recap.remove_comment(Utc::now());
        })
        .await
    }

    // Owners never change, so checking access before the update is enough.
    async fn engage(
        &self,
        viewer: &RecapViewer,
        recap_id: &str,
        f: impl FnOnce(&mut Recap) + Send,
    ) -> Result<Recap, RecapError> {
        self.get_recap(viewer, recap_id).await?;
        self.store
            .update(recap_id, f)
            .await
            .map(|((), recap)| recap)
            .ok_or_else(|| RecapError::NotFound(recap_id.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::{InMemoryNotifications, RecordingGenerationService};
    use chrono::{DateTime, NaiveDate, TimeZone};
    use color_eyre::Result;
    use color_eyre::eyre::OptionExt;
    use common_types::{
        AiGenerated, DateRange, EntitlementState, EntitlementStatus, GenerationOutcome,
        MediaEntry, NotificationKind, SharedAccess, SharedAccessRole, SharedAccessStatus,
    };

    struct Fixture {
        generator: Arc<RecordingGenerationService>,
        notifications: Arc<InMemoryNotifications>,
        lifecycle: RecapLifecycle,
    }

    fn fixture() -> Fixture {
        let generator = Arc::new(RecordingGenerationService::new());
        let notifications = Arc::new(InMemoryNotifications::new());
        let lifecycle = RecapLifecycle::builder()
            .generator(generator.clone())
            .notifications(notifications.clone())
            .build();
        Fixture {
            generator,
            notifications,
            lifecycle,
        }
    }

    fn premium() -> EntitlementView {
        EntitlementView::settled(Some(EntitlementState {
            product_id: "premium".to_owned(),
            status: EntitlementStatus::Active,
        }))
    }

    fn june() -> DateRange {
        DateRange {
            start: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap_or_default(),
        }
    }

    fn taken_at(month: u32, day: u32, hour: u32) -> Result<DateTime<Utc>> {
        Utc.with_ymd_and_hms(2024, month, day, hour, 0, 0)
            .single()
            .ok_or_eyre("invalid timestamp")
    }

    fn request() -> CreateRecapRequest {
        CreateRecapRequest {
            child_ids: vec!["child-1".to_owned()],
            date_range: june(),
            media_entries: vec![],
        }
    }

    fn completed() -> GenerationOutcome {
        GenerationOutcome::Completed(AiGenerated {
            title: "A sunny June".to_owned(),
            summary: "Beach days and first steps.".to_owned(),
            highlights: vec!["first steps".to_owned()],
        })
    }

    fn signal(recap: &Recap, outcome: GenerationOutcome) -> GenerationSignal {
        GenerationSignal {
            recap_id: recap.id.clone(),
            outcome,
        }
    }

    fn grant_from(owner: &str, status: SharedAccessStatus) -> SharedAccess {
        SharedAccess {
            granter_identity_id: owner.to_owned(),
            role: SharedAccessRole::Viewer,
            status,
        }
    }

    #[tokio::test]
    async fn test_request_requires_active_entitlement() -> Result<()> {
        let f = fixture();
        let owner = Identity::permanent("owner", None);

        let result = f
            .lifecycle
            .request_recap(&owner, &EntitlementView::loading(), request())
            .await;

        assert_eq!(result, Err(RecapError::PremiumRequired));
        assert!(f.generator.requests().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_request_validates_input() -> Result<()> {
        let f = fixture();
        let owner = Identity::permanent("owner", None);

        let mut no_children = request();
        no_children.child_ids.clear();
        let mut inverted = request();
        inverted.date_range = DateRange {
            start: june().end,
            end: june().start,
        };
        let mut media_from_may = request();
        media_from_may.media_entries = vec![
            MediaEntry {
                media_item_id: "june".to_owned(),
                taken_at: taken_at(6, 30, 23)?,
            },
            MediaEntry {
                media_item_id: "may".to_owned(),
                taken_at: taken_at(5, 31, 18)?,
            },
        ];

        for bad in [no_children, inverted, media_from_may] {
            let result = f.lifecycle.request_recap(&owner, &premium(), bad).await;
            assert!(matches!(result, Err(RecapError::InvalidRequest(_))));
        }
        assert!(f.generator.requests().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_request_sorts_media_and_hands_off_to_generator() -> Result<()> {
        let f = fixture();
        let owner = Identity::permanent("owner", None);
        let mut req = request();
        req.media_entries = vec![
            MediaEntry {
                media_item_id: "late".to_owned(),
                taken_at: taken_at(6, 20, 12)?,
            },
            MediaEntry {
                media_item_id: "early".to_owned(),
                taken_at: taken_at(6, 2, 9)?,
            },
        ];

        let recap = f.lifecycle.request_recap(&owner, &premium(), req).await?;

        assert_eq!(recap.status(), RecapStatus::Generating);
        assert_eq!(recap.id.len(), 12);
        assert_eq!(recap.owner_id, "owner");
        let requests = f.generator.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].recap_id, recap.id);
        assert_eq!(requests[0].media_item_ids, vec!["early", "late"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_generation_discards_recap() -> Result<()> {
        let f = fixture();
        let owner = Identity::permanent("owner", None);
        f.generator.set_rejecting(true);

        let result = f.lifecycle.request_recap(&owner, &premium(), request()).await;

        assert!(matches!(result, Err(RecapError::GenerationRejected(_))));
        assert!(
            f.lifecycle
                .list_recaps(&RecapViewer::owner("owner"))
                .await
                .is_empty()
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_completion_is_applied_once_and_notifies_owner() -> Result<()> {
        let f = fixture();
        let owner = Identity::permanent("owner", None);
        let recap = f.lifecycle.request_recap(&owner, &premium(), request()).await?;

        let first = f.lifecycle.apply_completion(signal(&recap, completed())).await?;
        let second = f
            .lifecycle
            .apply_completion(signal(
                &recap,
                GenerationOutcome::Failed {
                    reason: "late failure".to_owned(),
                },
            ))
            .await?;

        assert!(first.was_applied());
        assert!(!second.was_applied());
        assert_eq!(second.recap().status(), RecapStatus::Completed);
        assert_eq!(
            second.recap().ai_generated().map(|ai| ai.title.as_str()),
            Some("A sunny June")
        );

        let notifications = f.notifications.list_for("owner").await?;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::RecapReady);
        assert_eq!(notifications[0].recap_id.as_deref(), Some(recap.id.as_str()));
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_recap_has_no_payload_and_ignores_completion() -> Result<()> {
        let f = fixture();
        let owner = Identity::permanent("owner", None);
        let recap = f.lifecycle.request_recap(&owner, &premium(), request()).await?;

        f.lifecycle
            .apply_completion(signal(
                &recap,
                GenerationOutcome::Failed {
                    reason: "no media".to_owned(),
                },
            ))
            .await?;
        let late = f.lifecycle.apply_completion(signal(&recap, completed())).await?;

        assert_eq!(late.recap().status(), RecapStatus::Failed);
        assert!(late.recap().ai_generated().is_none());
        assert_eq!(late.recap().failure_reason(), Some("no media"));
        assert!(f.notifications.list_for("owner").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_completion_is_not_found() -> Result<()> {
        let f = fixture();

        let result = f
            .lifecycle
            .apply_completion(GenerationSignal {
                recap_id: "missing".to_owned(),
                outcome: completed(),
            })
            .await;

        assert_eq!(result, Err(RecapError::NotFound("missing".to_owned())));
        Ok(())
    }

    #[tokio::test]
    async fn test_notification_failure_keeps_completion() -> Result<()> {
        let f = fixture();
        let owner = Identity::permanent("owner", None);
        let recap = f.lifecycle.request_recap(&owner, &premium(), request()).await?;
        f.notifications.set_failing(true);

        let result = f.lifecycle.apply_completion(signal(&recap, completed())).await;
        assert!(matches!(result, Err(RecapError::Notification(_))));

        let redelivered = f.lifecycle.apply_completion(signal(&recap, completed())).await?;
        assert!(!redelivered.was_applied());
        assert_eq!(redelivered.recap().status(), RecapStatus::Completed);
        Ok(())
    }

    #[tokio::test]
    async fn test_favorite_on_failed_recap_keeps_status() -> Result<()> {
        let f = fixture();
        let owner = Identity::permanent("owner", None);
        let viewer = RecapViewer::owner("owner");
        let recap = f.lifecycle.request_recap(&owner, &premium(), request()).await?;
        f.lifecycle
            .apply_completion(signal(
                &recap,
                GenerationOutcome::Failed {
                    reason: "timeout".to_owned(),
                },
            ))
            .await?;

        let favorited = f.lifecycle.toggle_favorite(&viewer, &recap.id).await?;
        let milestone = f.lifecycle.toggle_milestone(&viewer, &recap.id).await?;

        assert!(favorited.is_favorited);
        assert!(milestone.is_milestone);
        assert_eq!(milestone.status(), RecapStatus::Failed);
        Ok(())
    }

    #[tokio::test]
    async fn test_engagement_counters() -> Result<()> {
        let f = fixture();
        let owner = Identity::permanent("owner", None);
        let viewer = RecapViewer::owner("owner");
        let recap = f.lifecycle.request_recap(&owner, &premium(), request()).await?;

        f.lifecycle.increment_likes(&viewer, &recap.id).await?;
        let liked = f.lifecycle.increment_likes(&viewer, &recap.id).await?;
        f.lifecycle.add_comment(&viewer, &recap.id, "so cute").await?;
        f.lifecycle.remove_comment(&viewer, &recap.id).await?;
        let emptied = f.lifecycle.remove_comment(&viewer, &recap.id).await?;

        assert_eq!(liked.likes, 2);
        assert_eq!(emptied.comment_count, 0);
        assert_eq!(emptied.status(), RecapStatus::Generating);
        // The owner commenting on their own recap is not notified.
        assert!(f.notifications.list_for("owner").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_access_is_limited_to_owner_and_active_grantees() -> Result<()> {
        let f = fixture();
        let owner = Identity::permanent("owner", None);
        let recap = f.lifecycle.request_recap(&owner, &premium(), request()).await?;

        let grantee = RecapViewer::new(
            "grandma",
            &[grant_from("owner", SharedAccessStatus::Active)],
        );
        let revoked = RecapViewer::new(
            "ex",
            &[grant_from("owner", SharedAccessStatus::Revoked)],
        );
        let stranger = RecapViewer::owner("stranger");

        let commented = f
            .lifecycle
            .add_comment(&grantee, &recap.id, "lovely")
            .await?;
        assert_eq!(commented.comment_count, 1);
        assert_eq!(f.lifecycle.list_recaps(&grantee).await.len(), 1);

        for outsider in [&revoked, &stranger] {
            assert_eq!(
                f.lifecycle.get_recap(outsider, &recap.id).await,
                Err(RecapError::NotFound(recap.id.clone()))
            );
            assert_eq!(
                f.lifecycle.toggle_favorite(outsider, &recap.id).await,
                Err(RecapError::NotFound(recap.id.clone()))
            );
            assert!(f.lifecycle.list_recaps(outsider).await.is_empty());
        }

        let notifications = f.notifications.list_for("owner").await?;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Comment);
        assert_eq!(notifications[0].body, "grandma: lovely");
        Ok(())
    }

    #[tokio::test]
    async fn test_blank_comment_is_rejected() -> Result<()> {
        let f = fixture();
        let owner = Identity::permanent("owner", None);
        let recap = f.lifecycle.request_recap(&owner, &premium(), request()).await?;

        let result = f
            .lifecycle
            .add_comment(&RecapViewer::owner("owner"), &recap.id, "   ")
            .await;

        assert!(matches!(result, Err(RecapError::InvalidRequest(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_is_newest_first() -> Result<()> {
        let f = fixture();
        let owner = Identity::permanent("owner", None);
        let first = f.lifecycle.request_recap(&owner, &premium(), request()).await?;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = f.lifecycle.request_recap(&owner, &premium(), request()).await?;

        let ids: Vec<String> = f
            .lifecycle
            .list_recaps(&RecapViewer::owner("owner"))
            .await
            .into_iter()
            .map(|r| r.id)
            .collect();

        assert_eq!(ids, vec![second.id, first.id]);
        Ok(())
    }
}
