//! Order repository.
//!
//! Orders are written by the checkout orchestrator; this repository covers
//! the read side plus the one permitted mutation, the status field.

use artvaani_core::{MarketError, MarketResult, Order, OrderId, OrderStatus, UserId};

use crate::store::{DocumentStore, FieldWrites, Query};

use super::{collections, decode_all};

/// Repository for order documents.
pub struct OrderRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// A buyer's order history, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if the store fails.
    pub async fn for_buyer(&self, buyer_id: &UserId) -> MarketResult<Vec<Order>> {
        let docs = self
            .store
            .query(
                collections::ORDERS,
                &Query::new()
                    .where_eq("userId", buyer_id.as_str())
                    .order_by_desc("orderDate"),
            )
            .await?;
        Ok(decode_all(docs)?)
    }

    /// Fetch a single order.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if the store fails.
    pub async fn get(&self, id: &OrderId) -> MarketResult<Option<Order>> {
        match self.store.get(collections::ORDERS, id.as_str()).await? {
            Some(doc) => Ok(Some(doc.deserialize()?)),
            None => Ok(None),
        }
    }

    /// Fetch a single order, failing with `NotFound` when absent.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the order does not exist.
    pub async fn require(&self, id: &OrderId) -> MarketResult<Order> {
        self.get(id)
            .await?
            .ok_or_else(|| MarketError::not_found("order", id))
    }

    /// Set the fulfillment status. Fulfilment tooling owns the progression
    /// policy, so any explicit status is accepted.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the order does not exist.
    pub async fn set_status(&self, id: &OrderId, status: OrderStatus) -> MarketResult<()> {
        self.store
            .update(
                collections::ORDERS,
                id.as_str(),
                FieldWrites::new().set("status", status),
            )
            .await?;
        Ok(())
    }
}
