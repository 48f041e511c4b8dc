use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Actor, Notification},
    events::EventProducers,
    realtime::ReadScope,
    traits::{NotificationApiError, NotificationManagement},
};

pub struct NotificationApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for NotificationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NotificationApi")
    }
}

impl<B> NotificationApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> NotificationApi<B>
where B: NotificationManagement
{
    /// The actor's notifications, newest first.
    pub async fn notifications_for(
        &self,
        actor: &Actor,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationApiError> {
        let recipient = ReadScope::for_actor(actor).recipient();
        self.db.fetch_notifications_for(&recipient, unread_only).await
    }

    /// Marks one of the actor's notifications as read. Idempotent.
    pub async fn mark_read(&self, actor: &Actor, id: i64) -> Result<Notification, NotificationApiError> {
        let notification =
            self.db.fetch_notification(id).await?.ok_or(NotificationApiError::NotificationNotFound(id))?;
        if !notification.recipient().includes(actor) {
            warn!("📬️ {actor} tried to mark notification #{id} addressed to {}", notification.recipient());
            return Err(NotificationApiError::ForbiddenActor(format!("{actor} is not the recipient of #{id}")));
        }
        let committed = self.db.mark_notification_read(id).await?;
        self.producers.publish_row_changes(committed.changes).await;
        Ok(committed.value)
    }
}
