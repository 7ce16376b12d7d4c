//! Document store contract.
//!
//! The hosted backend is consumed through this trait only: keyed documents in
//! named collections, equality queries, atomic batch writes, optimistic
//! transactions, and push-based live queries. [`memory::MemoryStore`] is the
//! in-process implementation used by tests and local development; production
//! embedders plug in a client for their hosted store.

mod batch;
pub mod memory;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

pub use batch::{FieldValue, FieldWrites, Transaction, WriteBatch, WriteOp};

use artvaani_core::MarketError;

/// Errors from the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An `update` targeted a document that does not exist.
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// A transactional read was invalidated by a concurrent write.
    #[error("transaction conflict on {collection}/{id}")]
    Conflict { collection: String, id: String },

    /// A field operation does not fit the stored data (e.g. array-union on a
    /// non-array field).
    #[error("invalid write to {collection}/{id}: {message}")]
    InvalidWrite {
        collection: String,
        id: String,
        message: String,
    },

    /// The backing service failed.
    #[error("store backend error: {0}")]
    Backend(String),

    /// Stored fields did not deserialize into the expected shape.
    #[error("document decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<StoreError> for MarketError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { collection, id } => {
                Self::NotFound(format!("{collection}/{id}"))
            }
            other => Self::RemoteFailure(other.to_string()),
        }
    }
}

/// A document snapshot: the store key plus the stored fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    /// Always a JSON object.
    pub fields: Value,
}

impl Document {
    /// Deserialize the fields into a typed read model.
    ///
    /// The document key is injected as an `"id"` field when the stored data
    /// does not carry one, so read models can declare `id` as a plain field.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Decode`] when the fields do not match the target
    /// shape.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let mut fields = self.fields.clone();
        if let Value::Object(map) = &mut fields
            && !map.contains_key("id")
        {
            map.insert("id".to_owned(), Value::String(self.id.clone()));
        }
        Ok(serde_json::from_value(fields)?)
    }
}

/// A document snapshot together with its store version, for transactional
/// reads.
#[derive(Debug, Clone)]
pub struct VersionedDocument {
    pub document: Document,
    /// Monotonic per-document write counter.
    pub version: u64,
}

/// Sort direction for [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
struct Filter {
    field: String,
    value: Value,
}

/// An equality-filtered, optionally ordered query over one collection.
///
/// This mirrors what the application actually asks of its store: conjunctive
/// equality predicates and a single order-by field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<Filter>,
    order_by: Option<(String, Direction)>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only documents whose `field` equals `value`.
    #[must_use]
    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_owned(),
            value: value.into(),
        });
        self
    }

    /// Order results ascending by `field`.
    #[must_use]
    pub fn order_by_asc(mut self, field: &str) -> Self {
        self.order_by = Some((field.to_owned(), Direction::Ascending));
        self
    }

    /// Order results descending by `field`.
    #[must_use]
    pub fn order_by_desc(mut self, field: &str) -> Self {
        self.order_by = Some((field.to_owned(), Direction::Descending));
        self
    }

    /// Whether a document's fields satisfy every filter.
    #[must_use]
    pub fn matches(&self, fields: &Value) -> bool {
        self.filters
            .iter()
            .all(|filter| fields.get(&filter.field) == Some(&filter.value))
    }

    /// Apply the order-by clause to a result set. The sort is stable, so
    /// documents comparing equal keep their input order.
    pub fn sort(&self, documents: &mut [Document]) {
        let Some((field, direction)) = &self.order_by else {
            return;
        };
        documents.sort_by(|a, b| {
            let ordering = compare_values(a.fields.get(field), b.fields.get(field));
            match direction {
                Direction::Ascending => ordering,
                Direction::Descending => ordering.reverse(),
            }
        });
    }
}

/// Total order over the JSON values this store keeps: missing < null <
/// numbers < strings. RFC 3339 timestamps are strings, so lexicographic
/// string order is chronological.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None => 0,
            Some(Value::Null) => 1,
            Some(Value::Bool(_)) => 2,
            Some(Value::Number(_)) => 3,
            Some(Value::String(_)) => 4,
            Some(_) => 5,
        }
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Receiver half of a live query.
///
/// The store pushes the full current result set on subscription and again
/// after every committed write that touches the collection.
#[derive(Debug)]
pub struct DocumentWatcher {
    rx: mpsc::UnboundedReceiver<Vec<Document>>,
}

impl DocumentWatcher {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<Vec<Document>>) -> Self {
        Self { rx }
    }

    /// Wait for the next result set. `None` means the store went away.
    pub async fn next(&mut self) -> Option<Vec<Document>> {
        self.rx.recv().await
    }
}

/// The document store contract.
///
/// Implementations must make [`commit`](DocumentStore::commit) atomic: either
/// every operation in the batch applies or none do. Single-document helpers
/// default to one-op batches.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self
            .get_versioned(collection, id)
            .await?
            .map(|versioned| versioned.document))
    }

    /// Fetch one document together with its write version.
    async fn get_versioned(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<VersionedDocument>, StoreError>;

    /// Run an equality query over a collection.
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Create or overwrite a document. With `merge`, existing fields not
    /// named in `fields` survive.
    async fn set(
        &self,
        collection: &str,
        id: &str,
        fields: FieldWrites,
        merge: bool,
    ) -> Result<(), StoreError> {
        self.commit(WriteBatch::new().set(collection, id, fields, merge))
            .await
    }

    /// Update fields of an existing document; fails with
    /// [`StoreError::NotFound`] when it does not exist.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: FieldWrites,
    ) -> Result<(), StoreError> {
        self.commit(WriteBatch::new().update(collection, id, fields))
            .await
    }

    /// Delete a document. Deleting an absent document is a no-op.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.commit(WriteBatch::new().delete(collection, id)).await
    }

    /// Atomically apply a batch of writes.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Commit a transaction: apply its buffered writes if and only if every
    /// document it read is still at the version it was read at, otherwise
    /// fail with [`StoreError::Conflict`].
    async fn commit_transaction(&self, tx: Transaction) -> Result<(), StoreError>;

    /// Open a live query. The current result set is delivered immediately.
    async fn subscribe(&self, collection: &str, query: Query) -> DocumentWatcher;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_matches_all_filters() {
        let query = Query::new()
            .where_eq("status", "published")
            .where_eq("artisanId", "a1");

        assert!(query.matches(&json!({"status": "published", "artisanId": "a1", "x": 1})));
        assert!(!query.matches(&json!({"status": "published", "artisanId": "a2"})));
        assert!(!query.matches(&json!({"artisanId": "a1"})));
    }

    #[test]
    fn test_query_sort_by_timestamp_string() {
        let mut docs = vec![
            Document {
                id: "b".into(),
                fields: json!({"createdAt": "2026-02-01T00:00:00Z"}),
            },
            Document {
                id: "a".into(),
                fields: json!({"createdAt": "2026-01-01T00:00:00Z"}),
            },
        ];
        Query::new().order_by_desc("createdAt").sort(&mut docs);
        assert_eq!(docs[0].id, "b");
        Query::new().order_by_asc("createdAt").sort(&mut docs);
        assert_eq!(docs[0].id, "a");
    }

    #[test]
    fn test_document_deserialize_injects_id() {
        #[derive(serde::Deserialize)]
        struct Thing {
            id: String,
            name: String,
        }

        let doc = Document {
            id: "t1".into(),
            fields: json!({"name": "thing"}),
        };
        let thing: Thing = doc.deserialize().expect("deserialize");
        assert_eq!(thing.id, "t1");
        assert_eq!(thing.name, "thing");
    }
}
