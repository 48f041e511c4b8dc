use thiserror::Error;

use crate::{
    db_types::{Notification, Recipient},
    traits::data_objects::Committed,
};

#[derive(Debug, Clone, Error)]
pub enum NotificationApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested notification {0} does not exist")]
    NotificationNotFound(i64),
    #[error("Forbidden: {0}")]
    ForbiddenActor(String),
}

impl From<sqlx::Error> for NotificationApiError {
    fn from(e: sqlx::Error) -> Self {
        NotificationApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait NotificationManagement {
    async fn fetch_notification(&self, id: i64) -> Result<Option<Notification>, NotificationApiError>;

    /// Notifications addressed to `recipient`, newest first.
    async fn fetch_notifications_for(
        &self,
        recipient: &Recipient,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationApiError>;

    /// Flips `is_read`. Marking an already-read notification is a no-op that returns the stored row.
    async fn mark_notification_read(&self, id: i64) -> Result<Committed<Notification>, NotificationApiError>;
}
