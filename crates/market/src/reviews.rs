//! Review submission and the denormalized rating aggregate.
//!
//! The review document and the parent product's `(reviewCount,
//! averageRating)` pair move together inside one optimistic transaction, so
//! concurrent reviewers cannot lose aggregate updates. Resubmission by the
//! same reviewer overwrites their review document and replaces their old
//! rating in the mean rather than counting them twice.

use tracing::{debug, instrument};

use artvaani_core::{MarketError, MarketResult, ProductId, Review, UserId};

use crate::db::{collections, decode_all, reviews_collection};
use crate::store::{DocumentStore, FieldWrites, Query, StoreError, Transaction};

/// How many conflict retries a submission gets before giving up.
const MAX_TRANSACTION_ATTEMPTS: u32 = 5;

/// A review as submitted from the form.
#[derive(Debug, Clone)]
pub struct NewReview {
    pub product_id: ProductId,
    pub user_id: UserId,
    pub user_name: String,
    /// Star rating, 1 through 5.
    pub rating: u32,
    pub review_text: String,
}

/// Submits reviews and maintains product rating aggregates.
pub struct ReviewAggregator<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ReviewAggregator<'a> {
    /// Create a new review aggregator.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Submit a review, updating the parent product's aggregate in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` when the rating is outside 1..=5
    /// - `NotFound` when the product no longer exists
    /// - `RemoteFailure` when the store fails or the transaction keeps
    ///   conflicting past the retry budget
    #[instrument(skip(self, review), fields(product_id = %review.product_id, rating = review.rating))]
    pub async fn submit(&self, review: NewReview) -> MarketResult<()> {
        if !(1..=5).contains(&review.rating) {
            return Err(MarketError::InvalidInput(format!(
                "rating must be between 1 and 5, got {}",
                review.rating
            )));
        }

        let reviews = reviews_collection(&review.product_id);
        let mut attempts = 0;
        loop {
            let mut tx = Transaction::new();

            let product_doc = tx
                .get(self.store, collections::PRODUCTS, review.product_id.as_str())
                .await?
                .ok_or_else(|| MarketError::not_found("product", &review.product_id))?;
            let (count, average) = current_aggregate(&product_doc.fields);

            let previous_rating = tx
                .get(self.store, &reviews, review.user_id.as_str())
                .await?
                .map(|doc| doc.deserialize::<Review>())
                .transpose()?
                .map(|existing| existing.rating);

            let (new_count, new_average) =
                next_aggregate(count, average, review.rating, previous_rating);

            tx.set(
                &reviews,
                review.user_id.as_str(),
                FieldWrites::new()
                    .set("userId", &review.user_id)
                    .set("userName", &review.user_name)
                    .set("rating", review.rating)
                    .set("reviewText", &review.review_text)
                    .server_timestamp("createdAt"),
                false,
            );
            tx.update(
                collections::PRODUCTS,
                review.product_id.as_str(),
                FieldWrites::new()
                    .set("reviewCount", new_count)
                    .set("averageRating", new_average),
            );

            match self.store.commit_transaction(tx).await {
                Ok(()) => return Ok(()),
                Err(StoreError::Conflict { .. }) if attempts + 1 < MAX_TRANSACTION_ATTEMPTS => {
                    attempts += 1;
                    debug!(attempts, "review transaction conflicted, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// A product's reviews, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if the store fails.
    pub async fn list(&self, product_id: &ProductId) -> MarketResult<Vec<Review>> {
        let docs = self
            .store
            .query(
                &reviews_collection(product_id),
                &Query::new().order_by_desc("createdAt"),
            )
            .await?;
        Ok(decode_all(docs)?)
    }
}

/// Read the stored aggregate, tolerating documents that predate it.
fn current_aggregate(fields: &serde_json::Value) -> (u32, f64) {
    let count = fields
        .get("reviewCount")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0);
    let average = fields
        .get("averageRating")
        .and_then(serde_json::Value::as_f64)
        .unwrap_or(0.0);
    (u32::try_from(count).unwrap_or(u32::MAX), average)
}

/// The aggregate after applying one submission.
///
/// First-time reviews extend the running mean; resubmissions replace the
/// reviewer's previous rating with the count unchanged.
fn next_aggregate(count: u32, average: f64, rating: u32, previous: Option<u32>) -> (u32, f64) {
    match previous {
        None => {
            let new_count = count + 1;
            let new_average =
                (average * f64::from(count) + f64::from(rating)) / f64::from(new_count);
            (new_count, new_average)
        }
        // A resubmission against a drifted aggregate (count somehow zero)
        // repairs it to just this review.
        Some(_) if count == 0 => (1, f64::from(rating)),
        Some(previous) => {
            let new_average = (average * f64::from(count) - f64::from(previous)
                + f64::from(rating))
                / f64::from(count);
            (count, new_average)
        }
    }
}
