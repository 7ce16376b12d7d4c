//! Repositories over the document store.
//!
//! Each repository borrows the store handle for the duration of a call
//! sequence and exposes typed operations over one collection. Collection
//! names live here so the layout of the store appears in exactly one place.

pub mod notifications;
pub mod orders;
pub mod products;
pub mod profiles;
pub mod stories;

pub use notifications::NotificationRepository;
pub use orders::OrderRepository;
pub use products::{NewProductDraft, ProductRepository};
pub use profiles::ProfileRepository;
pub use stories::{NewStory, StoryRepository};

use artvaani_core::ProductId;

use crate::store::{Document, StoreError};

/// Collection names.
pub mod collections {
    pub const USERS: &str = "users";
    pub const PRODUCTS: &str = "products";
    pub const ORDERS: &str = "orders";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const STORIES: &str = "stories";
}

/// Per-product review subcollection path.
#[must_use]
pub fn reviews_collection(product_id: &ProductId) -> String {
    format!("{}/{product_id}/reviews", collections::PRODUCTS)
}

/// Decode a result set into typed read models.
pub(crate) fn decode_all<T: serde::de::DeserializeOwned>(
    documents: Vec<Document>,
) -> Result<Vec<T>, StoreError> {
    documents.iter().map(Document::deserialize).collect()
}
