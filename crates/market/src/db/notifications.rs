//! Artisan notification repository.

use artvaani_core::{MarketResult, Notification, NotificationStatus, UserId};

use crate::store::{DocumentStore, DocumentWatcher, FieldWrites, Query, WriteBatch};

use super::{collections, decode_all};

/// Repository for order notifications addressed to artisans.
pub struct NotificationRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> NotificationRepository<'a> {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// An artisan's notification feed, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if the store fails.
    pub async fn for_artisan(&self, artisan_id: &UserId) -> MarketResult<Vec<Notification>> {
        let docs = self
            .store
            .query(
                collections::NOTIFICATIONS,
                &Query::new()
                    .where_eq("artisanId", artisan_id.as_str())
                    .order_by_desc("timestamp"),
            )
            .await?;
        Ok(decode_all(docs)?)
    }

    /// How many notifications are still unread.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if the store fails.
    pub async fn unread_count(&self, artisan_id: &UserId) -> MarketResult<usize> {
        let docs = self
            .store
            .query(collections::NOTIFICATIONS, &unread_query(artisan_id))
            .await?;
        Ok(docs.len())
    }

    /// Flip every unread notification to read in one atomic batch.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if the store fails.
    pub async fn mark_all_read(&self, artisan_id: &UserId) -> MarketResult<()> {
        let unread = self
            .store
            .query(collections::NOTIFICATIONS, &unread_query(artisan_id))
            .await?;
        if unread.is_empty() {
            return Ok(());
        }

        let mut batch = WriteBatch::new();
        for doc in &unread {
            batch = batch.update(
                collections::NOTIFICATIONS,
                &doc.id,
                FieldWrites::new().set("status", NotificationStatus::Read),
            );
        }
        self.store.commit(batch).await?;
        Ok(())
    }

    /// Live feed of an artisan's notifications, newest first.
    pub async fn watch(&self, artisan_id: &UserId) -> DocumentWatcher {
        self.store
            .subscribe(
                collections::NOTIFICATIONS,
                Query::new()
                    .where_eq("artisanId", artisan_id.as_str())
                    .order_by_desc("timestamp"),
            )
            .await
    }
}

fn unread_query(artisan_id: &UserId) -> Query {
    Query::new()
        .where_eq("artisanId", artisan_id.as_str())
        .where_eq("status", "unread")
}
