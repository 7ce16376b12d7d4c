//! Product repository.

use artvaani_core::{MarketError, MarketResult, Product, ProductId, ProductStatus, UserId};

use crate::genai::ListingCopy;
use crate::store::{DocumentStore, FieldWrites, Query};

use super::{collections, decode_all};

/// A new draft listing: what the artisan supplies before any copy exists.
#[derive(Debug, Clone)]
pub struct NewProductDraft {
    pub artisan_id: UserId,
    pub image_url: String,
    pub image_hint: String,
    pub description_input: String,
}

/// Repository for product documents.
pub struct ProductRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// All published products (the buyer-facing catalog).
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if the store fails.
    pub async fn published(&self) -> MarketResult<Vec<Product>> {
        let docs = self
            .store
            .query(
                collections::PRODUCTS,
                &Query::new().where_eq("status", "published"),
            )
            .await?;
        Ok(decode_all(docs)?)
    }

    /// Every listing owned by an artisan, drafts included.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if the store fails.
    pub async fn owned_by(&self, artisan_id: &UserId) -> MarketResult<Vec<Product>> {
        let docs = self
            .store
            .query(
                collections::PRODUCTS,
                &Query::new().where_eq("artisanId", artisan_id.as_str()),
            )
            .await?;
        Ok(decode_all(docs)?)
    }

    /// Fetch a single product.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if the store fails.
    pub async fn get(&self, id: &ProductId) -> MarketResult<Option<Product>> {
        match self.store.get(collections::PRODUCTS, id.as_str()).await? {
            Some(doc) => Ok(Some(doc.deserialize()?)),
            None => Ok(None),
        }
    }

    /// Fetch a single product, failing with `NotFound` when absent.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the product does not exist.
    pub async fn require(&self, id: &ProductId) -> MarketResult<Product> {
        self.get(id)
            .await?
            .ok_or_else(|| MarketError::not_found("product", id))
    }

    /// Create a draft listing with empty generated fields.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` when the image or description is missing, and
    /// `RemoteFailure` if the store fails.
    pub async fn create_draft(&self, draft: NewProductDraft) -> MarketResult<ProductId> {
        if draft.image_url.is_empty() || draft.description_input.is_empty() {
            return Err(MarketError::InvalidInput(
                "a draft needs an image and a description".to_owned(),
            ));
        }

        let id = ProductId::generate();
        let fields = FieldWrites::new()
            .set("artisanId", &draft.artisan_id)
            .set("imageUrl", &draft.image_url)
            .set("imageHint", &draft.image_hint)
            .set("descriptionInput", &draft.description_input)
            .set("aiTitle", "")
            .set("aiStory", "")
            .set("aiTags", Vec::<String>::new())
            .set("status", ProductStatus::Draft)
            .server_timestamp("createdAt")
            .server_timestamp("updatedAt");

        self.store
            .set(collections::PRODUCTS, id.as_str(), fields, false)
            .await?;
        Ok(id)
    }

    /// Write (possibly hand-edited) listing copy back onto a product and set
    /// its lifecycle status. Saving as draft and publishing go through the
    /// same write.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the product does not exist.
    pub async fn save_listing(
        &self,
        id: &ProductId,
        copy: &ListingCopy,
        status: ProductStatus,
    ) -> MarketResult<()> {
        let fields = FieldWrites::new()
            .set("aiTitle", &copy.title)
            .set("aiStory", &copy.story)
            .set("aiPrice", copy.price)
            .set("aiTags", &copy.tags)
            .set("status", status)
            .server_timestamp("updatedAt");

        self.store
            .update(collections::PRODUCTS, id.as_str(), fields)
            .await?;
        Ok(())
    }

    /// Delete a listing outright.
    ///
    /// # Errors
    ///
    /// Returns `RemoteFailure` if the store fails.
    pub async fn delete(&self, id: &ProductId) -> MarketResult<()> {
        self.store
            .delete(collections::PRODUCTS, id.as_str())
            .await?;
        Ok(())
    }
}
