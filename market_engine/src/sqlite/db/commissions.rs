use chrono::{DateTime, Utc};
use log::*;
use mkt_common::Money;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    api::order_objects::CommissionQueryFilter,
    db_types::{Commission, CommissionStatus, NewCommission, SellerDebtSummary},
};

/// Inserts the commission unless one already exists for its `(order_id, seller_id)` pair.
///
/// Returns `None` if the unique constraint was already satisfied, in which case nothing was written.
pub async fn insert_if_absent(
    commission: &NewCommission,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Commission>, sqlx::Error> {
    let inserted = sqlx::query_as(
        r#"
            INSERT INTO commissions (order_id, seller_id, amount, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (order_id, seller_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(commission.order_id)
    .bind(&commission.seller_id)
    .bind(commission.amount)
    .bind(CommissionStatus::Pending)
    .bind(now)
    .fetch_optional(conn)
    .await?;
    Ok(inserted)
}

pub async fn fetch_commission(id: i64, conn: &mut SqliteConnection) -> Result<Option<Commission>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM commissions WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_for_order_and_seller(
    order_id: i64,
    seller_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Commission>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM commissions WHERE order_id = $1 AND seller_id = $2")
        .bind(order_id)
        .bind(seller_id)
        .fetch_optional(conn)
        .await
}

/// The seller's pending commissions, oldest first with the id as tiebreak.
pub async fn fetch_pending_for_seller(
    seller_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Commission>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM commissions WHERE seller_id = $1 AND status = $2 ORDER BY created_at ASC, id ASC",
    )
    .bind(seller_id)
    .bind(CommissionStatus::Pending)
    .fetch_all(conn)
    .await
}

/// Marks a pending commission as paid by `payment_proof_id`. Returns `None` if the commission was not pending.
pub async fn mark_paid(
    id: i64,
    payment_proof_id: i64,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Commission>, sqlx::Error> {
    let updated = sqlx::query_as(
        r#"
            UPDATE commissions SET status = $1, paid_at = $2, payment_proof_id = $3
            WHERE id = $4 AND status = $5
            RETURNING *;
        "#,
    )
    .bind(CommissionStatus::Paid)
    .bind(now)
    .bind(payment_proof_id)
    .bind(id)
    .bind(CommissionStatus::Pending)
    .fetch_optional(conn)
    .await?;
    if updated.is_some() {
        trace!("🗃️ Commission #{id} marked as paid by proof #{payment_proof_id}");
    }
    Ok(updated)
}

pub async fn search_commissions(
    query: CommissionQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Commission>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM commissions WHERE 1 = 1");
    if let Some(seller_id) = query.seller_id {
        builder.push(" AND seller_id = ").push_bind(seller_id);
    }
    if let Some(order_id) = query.order_id {
        builder.push(" AND order_id = ").push_bind(order_id);
    }
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status);
    }
    builder.push(" ORDER BY created_at ASC, id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build_query_as::<Commission>().fetch_all(conn).await
}

/// Pending debt grouped by seller, largest total first.
pub async fn pending_by_seller(conn: &mut SqliteConnection) -> Result<Vec<SellerDebtSummary>, sqlx::Error> {
    sqlx::query_as(
        r#"
            SELECT
                seller_id,
                SUM(amount) AS total_owed,
                COUNT(*) AS count,
                MIN(created_at) AS oldest_created_at
            FROM commissions
            WHERE status = $1
            GROUP BY seller_id
            ORDER BY total_owed DESC, seller_id ASC;
        "#,
    )
    .bind(CommissionStatus::Pending)
    .fetch_all(conn)
    .await
}

pub async fn paid_total_for_seller(seller_id: &str, conn: &mut SqliteConnection) -> Result<Money, sqlx::Error> {
    let (total,): (i64,) =
        sqlx::query_as("SELECT COALESCE(SUM(amount), 0) FROM commissions WHERE seller_id = $1 AND status = $2")
            .bind(seller_id)
            .bind(CommissionStatus::Paid)
            .fetch_one(conn)
            .await?;
    Ok(Money::from(total))
}
