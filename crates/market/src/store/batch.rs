//! Batched writes, field operations, and optimistic transactions.

use serde::Serialize;
use serde_json::Value;

use super::{Document, DocumentStore, StoreError};

/// A single field operation inside a write.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Store the value as-is.
    Set(Value),
    /// Treat the field as a set: append only values not already present.
    ArrayUnion(Vec<Value>),
    /// Resolved to the store's clock at commit time.
    ServerTimestamp,
}

/// An ordered map of field names to operations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldWrites {
    pub(crate) entries: Vec<(String, FieldValue)>,
}

impl FieldWrites {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` to `value`.
    ///
    /// Values that fail to serialize (a non-string-keyed map, for instance)
    /// are stored as JSON null; the document types in this workspace cannot
    /// hit that case.
    #[must_use]
    pub fn set(mut self, field: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.entries.push((field.to_owned(), FieldValue::Set(value)));
        self
    }

    /// Union `values` into the array stored at `field`.
    #[must_use]
    pub fn array_union(mut self, field: &str, values: impl IntoIterator<Item = impl Serialize>) -> Self {
        let values = values
            .into_iter()
            .map(|value| serde_json::to_value(value).unwrap_or(Value::Null))
            .collect();
        self.entries
            .push((field.to_owned(), FieldValue::ArrayUnion(values)));
        self
    }

    /// Set `field` to the store's timestamp at commit time.
    #[must_use]
    pub fn server_timestamp(mut self, field: &str) -> Self {
        self.entries
            .push((field.to_owned(), FieldValue::ServerTimestamp));
        self
    }

    /// Build writes from a serialized document, one `Set` per top-level
    /// field. Non-object values produce no writes.
    #[must_use]
    pub fn from_object(value: Value) -> Self {
        let mut writes = Self::new();
        if let Value::Object(map) = value {
            for (name, value) in map {
                writes.entries.push((name, FieldValue::Set(value)));
            }
        }
        writes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One write inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set {
        collection: String,
        id: String,
        fields: FieldWrites,
        merge: bool,
    },
    Update {
        collection: String,
        id: String,
        fields: FieldWrites,
    },
    Delete {
        collection: String,
        id: String,
    },
}

/// A set of writes committed as one atomic unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    pub(crate) ops: Vec<WriteOp>,
}

impl WriteBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a create-or-overwrite write.
    #[must_use]
    pub fn set(mut self, collection: &str, id: &str, fields: FieldWrites, merge: bool) -> Self {
        self.ops.push(WriteOp::Set {
            collection: collection.to_owned(),
            id: id.to_owned(),
            fields,
            merge,
        });
        self
    }

    /// Add an update of an existing document.
    #[must_use]
    pub fn update(mut self, collection: &str, id: &str, fields: FieldWrites) -> Self {
        self.ops.push(WriteOp::Update {
            collection: collection.to_owned(),
            id: id.to_owned(),
            fields,
        });
        self
    }

    /// Add a delete.
    #[must_use]
    pub fn delete(mut self, collection: &str, id: &str) -> Self {
        self.ops.push(WriteOp::Delete {
            collection: collection.to_owned(),
            id: id.to_owned(),
        });
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// A versioned read recorded by a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReadStamp {
    pub collection: String,
    pub id: String,
    /// `None` when the document was absent at read time.
    pub version: Option<u64>,
}

/// An optimistic read-modify-write unit.
///
/// Reads go through [`Transaction::get`], which records the version each
/// document was seen at; writes are buffered. `commit_transaction` applies
/// the writes only if no read document changed in the meantime, so callers
/// retry on [`StoreError::Conflict`]:
///
/// ```rust,ignore
/// loop {
///     let mut tx = Transaction::new();
///     let doc = tx.get(store, "products", id).await?;
///     // ... buffer writes derived from `doc` ...
///     match store.commit_transaction(tx).await {
///         Err(StoreError::Conflict { .. }) => continue,
///         other => break other,
///     }
/// }
/// ```
#[derive(Debug, Default)]
pub struct Transaction {
    pub(crate) reads: Vec<ReadStamp>,
    pub(crate) batch: WriteBatch,
}

impl Transaction {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a document and record its version for commit-time validation.
    ///
    /// # Errors
    ///
    /// Propagates store failures; an absent document is `Ok(None)` and is
    /// still validated (the commit fails if it appears concurrently).
    pub async fn get(
        &mut self,
        store: &dyn DocumentStore,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let versioned = store.get_versioned(collection, id).await?;
        self.reads.push(ReadStamp {
            collection: collection.to_owned(),
            id: id.to_owned(),
            version: versioned.as_ref().map(|v| v.version),
        });
        Ok(versioned.map(|v| v.document))
    }

    /// Buffer a create-or-overwrite write.
    pub fn set(&mut self, collection: &str, id: &str, fields: FieldWrites, merge: bool) {
        self.batch = std::mem::take(&mut self.batch).set(collection, id, fields, merge);
    }

    /// Buffer an update of an existing document.
    pub fn update(&mut self, collection: &str, id: &str, fields: FieldWrites) {
        self.batch = std::mem::take(&mut self.batch).update(collection, id, fields);
    }

    /// Buffer a delete.
    pub fn delete(&mut self, collection: &str, id: &str) {
        self.batch = std::mem::take(&mut self.batch).delete(collection, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_writes_builder() {
        let writes = FieldWrites::new()
            .set("name", "Meera")
            .array_union("tags", ["pottery", "terracotta"])
            .server_timestamp("updatedAt");

        assert_eq!(writes.entries.len(), 3);
        assert_eq!(
            writes.entries[0],
            ("name".to_owned(), FieldValue::Set(json!("Meera")))
        );
        assert_eq!(
            writes.entries[2],
            ("updatedAt".to_owned(), FieldValue::ServerTimestamp)
        );
    }

    #[test]
    fn test_batch_collects_ops_in_order() {
        let batch = WriteBatch::new()
            .set("orders", "o1", FieldWrites::new().set("totalAmount", 450), false)
            .update("users", "u1", FieldWrites::new().array_union("purchasedProductIds", ["p1"]))
            .delete("products", "p9");

        assert_eq!(batch.len(), 3);
        assert!(matches!(batch.ops[0], WriteOp::Set { .. }));
        assert!(matches!(batch.ops[2], WriteOp::Delete { .. }));
    }
}
