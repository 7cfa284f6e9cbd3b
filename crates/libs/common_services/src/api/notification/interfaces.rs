use crate::api::notification::error::NotificationError;
use async_trait::async_trait;
use common_types::{NewNotification, Notification};

/// The notification collaborator, a CRUD sink keyed by identity id.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn create(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, NotificationError>;

    async fn list_for(&self, identity_id: &str) -> Result<Vec<Notification>, NotificationError>;

    async fn mark_read(&self, notification_id: &str) -> Result<(), NotificationError>;

    async fn delete(&self, notification_id: &str) -> Result<(), NotificationError>;
}
