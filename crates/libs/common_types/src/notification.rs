use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    Comment,
    RecapReady,
}

/// A user-facing notification, keyed by the identity it is addressed to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub identity_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub recap_id: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a notification, the sink assigns id and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub identity_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub recap_id: Option<String>,
}
