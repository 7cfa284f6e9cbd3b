use common_types::{NewNotification, NotificationKind, Recap};

/// Notification for the owner of a recap that finished generating.
#[must_use]
pub fn recap_ready(recap: &Recap) -> NewNotification {
    let title = recap
        .ai_generated()
        .map_or_else(|| "Your recap is ready".to_owned(), |ai| ai.title.clone());
    NewNotification {
        identity_id: recap.owner_id.clone(),
        kind: NotificationKind::RecapReady,
        title,
        body: format!(
            "Your recap for {} to {} is ready to view.",
            recap.date_range.start, recap.date_range.end
        ),
        recap_id: Some(recap.id.clone()),
    }
}

/// Notification for the owner of a recap someone else commented on.
#[must_use]
pub fn comment_added(recap: &Recap, commenter_id: &str, text: &str) -> NewNotification {
    NewNotification {
        identity_id: recap.owner_id.clone(),
        kind: NotificationKind::Comment,
        title: "New comment on your recap".to_owned(),
        body: format!("{commenter_id}: {text}"),
        recap_id: Some(recap.id.clone()),
    }
}
