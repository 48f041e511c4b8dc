use thiserror::Error;

use crate::{
    api::order_objects::{OrderQueryFilter, OrderWithItems},
    db_types::{Order, OrderItem},
};

#[derive(Debug, Clone, Error)]
pub enum QueryApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for QueryApiError {
    fn from(e: sqlx::Error) -> Self {
        QueryApiError::DatabaseError(e.to_string())
    }
}

/// Read-only queries over orders and their items.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, QueryApiError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, QueryApiError>;

    /// Fetches the order and its items in one read. `None` if the order does not exist.
    async fn fetch_order_with_items(&self, order_id: i64) -> Result<Option<OrderWithItems>, QueryApiError> {
        let Some(order) = self.fetch_order(order_id).await? else {
            return Ok(None);
        };
        let items = self.fetch_order_items(order_id).await?;
        Ok(Some(OrderWithItems { order, items }))
    }

    /// Orders matching every field set in `query`, oldest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, QueryApiError>;
}
