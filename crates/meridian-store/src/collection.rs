//! Document collection drivers.
//!
//! [`Collection`] is the boundary to the underlying document store. Production
//! deployments plug their database driver in behind it; [`MemoryCollection`]
//! keeps documents in process and is what the test suites run against.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::RwLock;

use crate::database::Database;
use crate::document::{apply_update, matches, Document, Query};
use crate::error::StoreResult;

/// A named collection of documents.
#[async_trait]
pub trait Collection: Send + Sync + fmt::Debug {
    /// Returns the collection name.
    fn name(&self) -> &str;

    /// Returns documents matching `filter`, in insertion order, up to `limit`.
    async fn find(&self, filter: &Query, limit: Option<usize>) -> StoreResult<Vec<Document>>;

    /// Returns the first document matching `filter`.
    async fn find_one(&self, filter: &Query) -> StoreResult<Option<Document>> {
        Ok(self.find(filter, Some(1)).await?.into_iter().next())
    }

    /// Stores a new document.
    async fn insert_one(&self, document: Document) -> StoreResult<()>;

    /// Stores `document` unless a document matches `key`, as one atomic step.
    ///
    /// Returns `false`, storing nothing, when `key` is taken.
    async fn insert_if_absent(&self, key: &Query, document: Document) -> StoreResult<bool>;

    /// Deletes every document matching `key` and stores `document`, as one
    /// atomic step. Returns how many documents were replaced.
    async fn replace(&self, key: &Query, document: Document) -> StoreResult<usize>;

    /// Applies `update` to every matching document and returns how many changed.
    async fn update_many(&self, filter: &Query, update: &Document) -> StoreResult<usize>;

    /// Applies `update` to the first matching document.
    async fn update_one(&self, filter: &Query, update: &Document) -> StoreResult<bool>;

    /// Deletes every matching document and returns how many were removed.
    async fn delete_many(&self, filter: &Query) -> StoreResult<usize>;

    /// Deletes the first matching document.
    async fn delete_one(&self, filter: &Query) -> StoreResult<bool>;
}

/// Hands out collections by database and collection name.
pub trait CollectionProvider: Send + Sync + fmt::Debug {
    /// Returns the collection `name` inside database `database`.
    fn collection(&self, database: &str, name: &str) -> Arc<dyn Collection>;
}

/// An in-process collection.
#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    documents: RwLock<Vec<Document>>,
}

impl MemoryCollection {
    /// Creates an empty collection.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: RwLock::new(Vec::new()),
        }
    }

    /// Returns the number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Returns `true` if nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, filter: &Query, limit: Option<usize>) -> StoreResult<Vec<Document>> {
        let documents = self.documents.read().await;
        let matching = documents.iter().filter(|doc| matches(doc, filter)).cloned();
        Ok(match limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    async fn insert_one(&self, document: Document) -> StoreResult<()> {
        self.documents.write().await.push(document);
        Ok(())
    }

    async fn insert_if_absent(&self, key: &Query, document: Document) -> StoreResult<bool> {
        let mut documents = self.documents.write().await;
        if documents.iter().any(|doc| matches(doc, key)) {
            return Ok(false);
        }
        documents.push(document);
        Ok(true)
    }

    async fn replace(&self, key: &Query, document: Document) -> StoreResult<usize> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|doc| !matches(doc, key));
        let replaced = before - documents.len();
        documents.push(document);
        Ok(replaced)
    }

    async fn update_many(&self, filter: &Query, update: &Document) -> StoreResult<usize> {
        let mut documents = self.documents.write().await;
        let mut updated = 0;
        for doc in documents.iter_mut().filter(|doc| matches(doc, filter)) {
            apply_update(doc, update)?;
            updated += 1;
        }
        Ok(updated)
    }

    async fn update_one(&self, filter: &Query, update: &Document) -> StoreResult<bool> {
        let mut documents = self.documents.write().await;
        match documents.iter_mut().find(|doc| matches(doc, filter)) {
            Some(doc) => {
                apply_update(doc, update)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_many(&self, filter: &Query) -> StoreResult<usize> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|doc| !matches(doc, filter));
        Ok(before - documents.len())
    }

    async fn delete_one(&self, filter: &Query) -> StoreResult<bool> {
        let mut documents = self.documents.write().await;
        match documents.iter().position(|doc| matches(doc, filter)) {
            Some(index) => {
                documents.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// In-process collections keyed by database and collection name.
#[derive(Debug, Default)]
pub struct MemoryCollections {
    collections: Mutex<HashMap<(String, String), Arc<MemoryCollection>>>,
}

impl CollectionProvider for MemoryCollections {
    fn collection(&self, database: &str, name: &str) -> Arc<dyn Collection> {
        let mut collections = self.collections.lock();
        let collection = collections
            .entry((database.to_string(), name.to_string()))
            .or_insert_with(|| Arc::new(MemoryCollection::new(name)));
        Arc::clone(collection) as Arc<dyn Collection>
    }
}

/// An in-process store that caches databases and their collections.
///
/// Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<MemoryCollections>,
    databases: Arc<Mutex<HashMap<String, Database>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the database `name`, creating it on first use.
    pub fn database(&self, name: &str) -> Database {
        let mut databases = self.databases.lock();
        databases
            .entry(name.to_string())
            .or_insert_with(|| {
                let provider: Arc<dyn CollectionProvider> = self.collections.clone();
                Database::new(name, provider)
            })
            .clone()
    }

    /// Returns the collection provider backing this store.
    pub fn collections(&self) -> &MemoryCollections {
        &self.collections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{field, set};
    use serde_json::{json, Value};

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    async fn seeded() -> MemoryCollection {
        let collection = MemoryCollection::new("users");
        for (id, team) in [("u1", "red"), ("u2", "blue"), ("u3", "red")] {
            collection
                .insert_one(doc(json!({"id": id, "team": team})))
                .await
                .unwrap();
        }
        collection
    }

    #[tokio::test]
    async fn test_find_preserves_insertion_order() {
        let collection = seeded().await;
        let reds = collection.find(&field("team", "red"), None).await.unwrap();
        let ids: Vec<_> = reds.iter().map(|d| d["id"].clone()).collect();
        assert_eq!(ids, vec![json!("u1"), json!("u3")]);
    }

    #[tokio::test]
    async fn test_find_with_limit() {
        let collection = seeded().await;
        let found = collection.find(&Query::new(), Some(2)).await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_find_one_absent() {
        let collection = seeded().await;
        assert!(collection.find_one(&field("id", "nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let collection = seeded().await;
        let changed = collection
            .update_many(&field("team", "red"), &set(doc(json!({"team": "green"}))))
            .await
            .unwrap();
        assert_eq!(changed, 2);

        assert!(collection.delete_one(&field("id", "u2")).await.unwrap());
        assert_eq!(collection.delete_many(&field("team", "green")).await.unwrap(), 2);
        assert!(collection.is_empty().await);
    }

    #[test]
    fn test_store_caches_databases_and_collections() {
        let store = MemoryStore::new();
        let a = store.collections().collection("app", "users");
        let b = store.collections().collection("app", "users");
        assert!(Arc::ptr_eq(&a, &b));
        store.database("app").create_table::<Value>("users", "id");
        assert!(store.database("app").table::<Value>("users").is_ok());
    }
}
