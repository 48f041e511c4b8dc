use chrono::{DateTime, Utc};
use log::*;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    api::order_objects::PaymentProofQueryFilter,
    db_types::{NewPaymentProof, PaymentProof, PaymentProofStatus},
};

pub async fn insert_payment_proof(
    proof: &NewPaymentProof,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<PaymentProof, sqlx::Error> {
    let proof: PaymentProof = sqlx::query_as(
        r#"
            INSERT INTO seller_payment_proofs (seller_id, amount_paid, status, reference_code, submitted_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(&proof.seller_id)
    .bind(proof.amount_paid)
    .bind(PaymentProofStatus::Pending)
    .bind(&proof.reference_code)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Payment proof #{} of {} saved for seller {}", proof.id, proof.amount_paid, proof.seller_id);
    Ok(proof)
}

pub async fn fetch_payment_proof(id: i64, conn: &mut SqliteConnection) -> Result<Option<PaymentProof>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM seller_payment_proofs WHERE id = $1").bind(id).fetch_optional(conn).await
}

/// Moves a pending proof to `outcome`. Returns `None` if the proof was not pending.
pub async fn review_payment_proof(
    id: i64,
    outcome: PaymentProofStatus,
    note: Option<&str>,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<PaymentProof>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE seller_payment_proofs SET status = $1, review_note = $2, reviewed_at = $3
            WHERE id = $4 AND status = $5
            RETURNING *;
        "#,
    )
    .bind(outcome)
    .bind(note)
    .bind(now)
    .bind(id)
    .bind(PaymentProofStatus::Pending)
    .fetch_optional(conn)
    .await
}

/// Newest submissions first.
pub async fn search_payment_proofs(
    query: PaymentProofQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentProof>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM seller_payment_proofs WHERE 1 = 1");
    if let Some(seller_id) = query.seller_id {
        builder.push(" AND seller_id = ").push_bind(seller_id);
    }
    if let Some(status) = query.status {
        builder.push(" AND status = ").push_bind(status);
    }
    builder.push(" ORDER BY submitted_at DESC, id DESC");
    builder.build_query_as::<PaymentProof>().fetch_all(conn).await
}
