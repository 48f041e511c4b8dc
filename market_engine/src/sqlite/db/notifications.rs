use chrono::{DateTime, Utc};
use log::*;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::db_types::{NewNotification, Notification, Recipient, Role};

pub async fn insert_notifications(
    notifications: Vec<NewNotification>,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, sqlx::Error> {
    let mut result = Vec::with_capacity(notifications.len());
    for n in notifications {
        let row: Notification = sqlx::query_as(
            r#"
                INSERT INTO admin_notifications
                    (type, message, related_id, recipient_role, recipient_id, is_read, created_at)
                VALUES ($1, $2, $3, $4, $5, FALSE, $6)
                RETURNING *;
            "#,
        )
        .bind(n.notification_type)
        .bind(n.message)
        .bind(n.related_id)
        .bind(n.recipient.role)
        .bind(n.recipient.id)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
        trace!("🗃️ Notification #{} ({}) for {}", row.id, row.notification_type, row.recipient());
        result.push(row);
    }
    Ok(result)
}

pub async fn fetch_notification(id: i64, conn: &mut SqliteConnection) -> Result<Option<Notification>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM admin_notifications WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_notifications_for(
    recipient: &Recipient,
    unread_only: bool,
    conn: &mut SqliteConnection,
) -> Result<Vec<Notification>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM admin_notifications WHERE recipient_role = ");
    builder.push_bind(recipient.role);
    match (recipient.role, &recipient.id) {
        (Role::Admin, _) => {},
        (_, Some(id)) => {
            builder.push(" AND recipient_id = ").push_bind(id.clone());
        },
        (_, None) => {
            builder.push(" AND recipient_id IS NULL");
        },
    }
    if unread_only {
        builder.push(" AND is_read = FALSE");
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    builder.build_query_as::<Notification>().fetch_all(conn).await
}

/// Returns `None` if the notification does not exist or was already read.
pub async fn mark_read(
    id: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Notification>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE admin_notifications SET is_read = TRUE, read_at = $1 WHERE id = $2 AND is_read = FALSE RETURNING *",
    )
    .bind(now)
    .bind(id)
    .fetch_optional(conn)
    .await
}
