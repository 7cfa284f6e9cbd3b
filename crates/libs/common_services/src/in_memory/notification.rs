use crate::api::notification::error::NotificationError;
use crate::api::notification::interfaces::NotificationSink;
use crate::utils::{lock, nice_id};
use async_trait::async_trait;
use chrono::Utc;
use common_types::{NewNotification, Notification};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

const NOTIFICATION_ID_LENGTH: usize = 12;

#[derive(Default)]
pub struct InMemoryNotifications {
    notifications: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl InMemoryNotifications {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), NotificationError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotificationError::Unavailable("write rejected".to_owned()));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationSink for InMemoryNotifications {
    async fn create(
        &self,
        notification: NewNotification,
    ) -> Result<Notification, NotificationError> {
        self.check_available()?;
        let created = Notification {
            id: nice_id(NOTIFICATION_ID_LENGTH),
            identity_id: notification.identity_id,
            kind: notification.kind,
            title: notification.title,
            body: notification.body,
            recap_id: notification.recap_id,
            read: false,
            created_at: Utc::now(),
        };
        lock(&self.notifications).push(created.clone());
        Ok(created)
    }

    async fn list_for(&self, identity_id: &str) -> Result<Vec<Notification>, NotificationError> {
        self.check_available()?;
        Ok(lock(&self.notifications)
            .iter()
            .filter(|n| n.identity_id == identity_id)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, notification_id: &str) -> Result<(), NotificationError> {
        self.check_available()?;
        let mut notifications = lock(&self.notifications);
        let notification = notifications
            .iter_mut()
            .find(|n| n.id == notification_id)
            .ok_or_else(|| NotificationError::NotFound(notification_id.to_owned()))?;
        notification.read = true;
        Ok(())
    }

    async fn delete(&self, notification_id: &str) -> Result<(), NotificationError> {
        self.check_available()?;
        let mut notifications = lock(&self.notifications);
        let before = notifications.len();
        notifications.retain(|n| n.id != notification_id);
        if notifications.len() == before {
            return Err(NotificationError::NotFound(notification_id.to_owned()));
        }
        Ok(())
    }
}
