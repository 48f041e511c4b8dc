use chrono::{DateTime, Utc};
use log::*;
use mkt_common::Money;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    api::order_objects::OrderQueryFilter,
    db_types::{NewOrder, Order, OrderItem, OrderStatusType},
};

/// Inserts the order and its items. Not atomic by itself; call it inside a transaction.
pub async fn insert_order(
    order: &NewOrder,
    total_amount: Money,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<(Order, Vec<OrderItem>), sqlx::Error> {
    let inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (buyer_id, total_amount, status, delivery_address, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING *;
        "#,
    )
    .bind(&order.buyer_id)
    .bind(total_amount)
    .bind(OrderStatusType::Pending)
    .bind(&order.delivery_address)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;
    let mut items = Vec::with_capacity(order.items.len());
    for item in &order.items {
        let row: OrderItem = sqlx::query_as(
            r#"
                INSERT INTO order_items (order_id, seller_id, product_id, quantity, price)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING *;
            "#,
        )
        .bind(inserted.id)
        .bind(&item.seller_id)
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .fetch_one(&mut *conn)
        .await?;
        items.push(row);
    }
    debug!("🗃️ Order #{} inserted with {} item(s)", inserted.id, items.len());
    Ok((inserted, items))
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

/// Moves the order from `expected` to `target` if, and only if, its stored status is still `expected`.
///
/// Returns `None` when the guard fails, either because the order does not exist or because another writer got there
/// first.
pub async fn compare_and_set_status(
    id: i64,
    expected: OrderStatusType,
    target: OrderStatusType,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> =
        sqlx::query_as("UPDATE orders SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4 RETURNING *")
            .bind(target)
            .bind(now)
            .bind(id)
            .bind(expected)
            .fetch_optional(conn)
            .await?;
    match &order {
        Some(_) => trace!("🗃️ Order #{id} moved from {expected} to {target}"),
        None => trace!("🗃️ Order #{id} compare-and-set {expected} -> {target} did not match"),
    }
    Ok(order)
}

/// Fetches orders according to the criteria in `query`, oldest first.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(buyer_id) = query.buyer_id {
        where_clause.push("buyer_id = ");
        where_clause.push_bind_unseparated(buyer_id);
    }
    if let Some(seller_id) = query.seller_id {
        where_clause.push("id IN (SELECT order_id FROM order_items WHERE seller_id = ");
        where_clause.push_bind_unseparated(seller_id);
        where_clause.push_unseparated(")");
    }
    if let Some(statuses) = query.status.filter(|s| !s.is_empty()) {
        where_clause.push("status IN (");
        for (i, status) in statuses.into_iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status);
        }
        where_clause.push_unseparated(")");
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC, id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {}", orders.len());
    Ok(orders)
}
