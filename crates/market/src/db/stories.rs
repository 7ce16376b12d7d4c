//! Craft story repository.

use artvaani_core::{MarketResult, ProductId, Story, StoryId, UserId};

use crate::store::{DocumentStore, FieldWrites, Query};

use super::{collections, decode_all};

/// A story ready to be saved: transcript in, refined narrative out.
#[derive(Debug, Clone)]
pub struct NewStory {
    pub title: String,
    pub artisan_id: UserId,
    pub product_id: ProductId,
    pub raw_transcript: String,
    pub final_story: String,
}

/// Repository for craft story documents.
pub struct StoryRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> StoryRepository<'a> {
    /// Create a new story repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Save a refined story, keeping the raw transcript alongside it.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if the store fails.
    pub async fn create(&self, story: NewStory) -> MarketResult<StoryId> {
        let id = StoryId::generate();
        let fields = FieldWrites::new()
            .set("title", &story.title)
            .set("artisanId", &story.artisan_id)
            .set("productId", &story.product_id)
            .set("rawTranscript", &story.raw_transcript)
            .set("finalStory", &story.final_story)
            .server_timestamp("createdAt");

        self.store
            .set(collections::STORIES, id.as_str(), fields, false)
            .await?;
        Ok(id)
    }

    /// An artisan's stories, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if the store fails.
    pub async fn for_artisan(&self, artisan_id: &UserId) -> MarketResult<Vec<Story>> {
        let docs = self
            .store
            .query(
                collections::STORIES,
                &Query::new()
                    .where_eq("artisanId", artisan_id.as_str())
                    .order_by_desc("createdAt"),
            )
            .await?;
        Ok(decode_all(docs)?)
    }
}
