//! In-process document store.
//!
//! Backs tests and local development. Implements the full contract: atomic
//! batches, version-validated transactions, and live queries. State lives
//! behind one lock; critical sections never await.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tracing::instrument;

use super::{
    Document, DocumentStore, DocumentWatcher, FieldValue, FieldWrites, Query, StoreError,
    Transaction, VersionedDocument, WriteBatch, WriteOp,
};

#[derive(Debug, Clone)]
struct StoredDoc {
    fields: Value,
    version: u64,
}

#[derive(Debug)]
struct Subscriber {
    collection: String,
    query: Query,
    tx: mpsc::UnboundedSender<Vec<Document>>,
}

#[derive(Default)]
struct MemoryInner {
    collections: HashMap<String, BTreeMap<String, StoredDoc>>,
    subscribers: Vec<Subscriber>,
    version_counter: u64,
}

/// An in-memory [`DocumentStore`].
///
/// Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MemoryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MemoryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MemoryInner {
    fn get(&self, collection: &str, id: &str) -> Option<&StoredDoc> {
        self.collections.get(collection)?.get(id)
    }

    fn run_query(&self, collection: &str, query: &Query) -> Vec<Document> {
        let mut results: Vec<Document> = self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| query.matches(&doc.fields))
                    .map(|(id, doc)| Document {
                        id: id.clone(),
                        fields: doc.fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        query.sort(&mut results);
        results
    }

    /// Validate and stage a batch without touching live state. Returns the
    /// staged end state per document, so a later op in the same batch sees
    /// the effect of an earlier one.
    fn stage(
        &self,
        batch: &WriteBatch,
        now: &Value,
    ) -> Result<HashMap<(String, String), Option<Value>>, StoreError> {
        let mut staged: HashMap<(String, String), Option<Value>> = HashMap::new();

        let current = |staged: &HashMap<(String, String), Option<Value>>,
                       collection: &str,
                       id: &str|
         -> Option<Value> {
            match staged.get(&(collection.to_owned(), id.to_owned())) {
                Some(value) => value.clone(),
                None => self.get(collection, id).map(|doc| doc.fields.clone()),
            }
        };

        for op in &batch.ops {
            match op {
                WriteOp::Set {
                    collection,
                    id,
                    fields,
                    merge,
                } => {
                    let base = if *merge {
                        current(&staged, collection, id)
                    } else {
                        None
                    };
                    let next = apply_fields(base, fields, now, collection, id)?;
                    staged.insert((collection.clone(), id.clone()), Some(next));
                }
                WriteOp::Update {
                    collection,
                    id,
                    fields,
                } => {
                    let base =
                        current(&staged, collection, id).ok_or_else(|| StoreError::NotFound {
                            collection: collection.clone(),
                            id: id.clone(),
                        })?;
                    let next = apply_fields(Some(base), fields, now, collection, id)?;
                    staged.insert((collection.clone(), id.clone()), Some(next));
                }
                WriteOp::Delete { collection, id } => {
                    staged.insert((collection.clone(), id.clone()), None);
                }
            }
        }

        Ok(staged)
    }

    /// Apply a staged batch and return the touched collections.
    fn apply(&mut self, staged: HashMap<(String, String), Option<Value>>) -> HashSet<String> {
        let mut touched = HashSet::new();
        for ((collection, id), value) in staged {
            touched.insert(collection.clone());
            let docs = self.collections.entry(collection).or_default();
            match value {
                Some(fields) => {
                    self.version_counter += 1;
                    docs.insert(
                        id,
                        StoredDoc {
                            fields,
                            version: self.version_counter,
                        },
                    );
                }
                None => {
                    docs.remove(&id);
                }
            }
        }
        touched
    }

    fn notify(&mut self, touched: &HashSet<String>) {
        let results: Vec<(usize, Vec<Document>)> = self
            .subscribers
            .iter()
            .enumerate()
            .filter(|(_, sub)| touched.contains(&sub.collection))
            .map(|(index, sub)| (index, self.run_query(&sub.collection, &sub.query)))
            .collect();

        let mut dead = Vec::new();
        for (index, docs) in results {
            if let Some(sub) = self.subscribers.get(index)
                && sub.tx.send(docs).is_err()
            {
                dead.push(index);
            }
        }
        for index in dead.into_iter().rev() {
            self.subscribers.swap_remove(index);
        }
    }
}

/// Resolve field operations against a base object (absent base = empty doc).
fn apply_fields(
    base: Option<Value>,
    fields: &FieldWrites,
    now: &Value,
    collection: &str,
    id: &str,
) -> Result<Value, StoreError> {
    let mut object = match base {
        Some(Value::Object(map)) => map,
        Some(_) | None => Map::new(),
    };

    for (name, op) in &fields.entries {
        match op {
            FieldValue::Set(value) => {
                object.insert(name.clone(), value.clone());
            }
            FieldValue::ServerTimestamp => {
                object.insert(name.clone(), now.clone());
            }
            FieldValue::ArrayUnion(values) => {
                let entry = object
                    .entry(name.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                let Value::Array(existing) = entry else {
                    return Err(StoreError::InvalidWrite {
                        collection: collection.to_owned(),
                        id: id.to_owned(),
                        message: format!("array-union on non-array field {name}"),
                    });
                };
                for value in values {
                    if !existing.contains(value) {
                        existing.push(value.clone());
                    }
                }
            }
        }
    }

    Ok(Value::Object(object))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_versioned(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<VersionedDocument>, StoreError> {
        Ok(self.read().get(collection, id).map(|doc| VersionedDocument {
            document: Document {
                id: id.to_owned(),
                fields: doc.fields.clone(),
            },
            version: doc.version,
        }))
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        Ok(self.read().run_query(collection, query))
    }

    #[instrument(skip(self, batch), fields(ops = batch.len()))]
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let now = timestamp_value();
        let mut inner = self.write();
        let staged = inner.stage(&batch, &now)?;
        let touched = inner.apply(staged);
        inner.notify(&touched);
        Ok(())
    }

    #[instrument(skip(self, tx), fields(reads = tx.reads.len(), writes = tx.batch.len()))]
    async fn commit_transaction(&self, tx: Transaction) -> Result<(), StoreError> {
        let now = timestamp_value();
        let mut inner = self.write();

        for stamp in &tx.reads {
            let current = inner.get(&stamp.collection, &stamp.id).map(|doc| doc.version);
            if current != stamp.version {
                return Err(StoreError::Conflict {
                    collection: stamp.collection.clone(),
                    id: stamp.id.clone(),
                });
            }
        }

        let staged = inner.stage(&tx.batch, &now)?;
        let touched = inner.apply(staged);
        inner.notify(&touched);
        Ok(())
    }

    async fn subscribe(&self, collection: &str, query: Query) -> DocumentWatcher {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.write();
        let initial = inner.run_query(collection, &query);
        let _ = tx.send(initial);
        inner.subscribers.push(Subscriber {
            collection: collection.to_owned(),
            query,
            tx,
        });
        DocumentWatcher::new(rx)
    }
}

/// Fixed-precision RFC 3339, so lexicographic order on stored timestamps is
/// chronological.
fn timestamp_value() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true))
}
