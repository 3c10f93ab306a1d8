//! Typed tables.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::collection::Collection;
use crate::document::{field, Document, Query};
use crate::error::{StoreError, StoreResult};

/// A type that can be stored in a [`Table`].
///
/// Loading a document into a record is the validation step: a document that
/// does not deserialize into the record type is rejected with
/// [`StoreError::Validation`].
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Record for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// A collection bound to a record type and a primary-key field.
///
/// Tables are cheap handles; clones refer to the same collection.
pub struct Table<T> {
    collection: Arc<dyn Collection>,
    primary_key: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            collection: Arc::clone(&self.collection),
            primary_key: self.primary_key.clone(),
            _record: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("collection", &self.collection.name())
            .field("primary_key", &self.primary_key)
            .field("record", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: Record> Table<T> {
    /// Creates a table over `collection` identified by `primary_key`.
    pub fn new(collection: Arc<dyn Collection>, primary_key: impl Into<String>) -> Self {
        Self {
            collection,
            primary_key: primary_key.into(),
            _record: PhantomData,
        }
    }

    /// Returns the collection name.
    pub fn name(&self) -> &str {
        self.collection.name()
    }

    /// Returns the primary-key field name.
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Returns the underlying collection.
    pub fn collection(&self) -> &Arc<dyn Collection> {
        &self.collection
    }

    /// Validates a stored document into a record.
    pub fn load(&self, document: Document) -> StoreResult<T> {
        serde_json::from_value(Value::Object(document)).map_err(|source| StoreError::Validation {
            collection: self.name().to_string(),
            source,
        })
    }

    /// Serializes a record into a document.
    pub fn dump(&self, record: &T) -> StoreResult<Document> {
        match serde_json::to_value(record) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(other) => Err(self.not_a_document(format!("serialized to {other}"))),
            Err(err) => Err(self.not_a_document(err.to_string())),
        }
    }

    /// Returns the primary-key value of a record.
    pub fn id_of(&self, record: &T) -> StoreResult<Value> {
        self.dump(record)?
            .remove(&self.primary_key)
            .ok_or_else(|| StoreError::MissingPrimaryKey {
                collection: self.name().to_string(),
                key: self.primary_key.clone(),
            })
    }

    /// Fetches a record by primary key.
    pub async fn get(&self, id: impl Into<Value> + Send) -> StoreResult<Option<T>> {
        self.find_one(&self.by_id(id.into())).await
    }

    /// Returns records matching `query`, up to `limit`.
    pub async fn find(&self, query: &Query, limit: Option<usize>) -> StoreResult<Vec<T>> {
        self.collection
            .find(query, limit)
            .await?
            .into_iter()
            .map(|doc| self.load(doc))
            .collect()
    }

    /// Returns the first record matching `query`.
    pub async fn find_one(&self, query: &Query) -> StoreResult<Option<T>> {
        self.collection
            .find_one(query)
            .await?
            .map(|doc| self.load(doc))
            .transpose()
    }

    /// Inserts a new record.
    ///
    /// Fails with [`StoreError::AlreadyExists`] when the primary key is taken;
    /// use [`Table::push`] to replace instead.
    pub async fn insert(&self, record: &T) -> StoreResult<()> {
        let (id, document) = self.keyed_document(record)?;
        if self.collection.insert_if_absent(&self.by_id(id.clone()), document).await? {
            Ok(())
        } else {
            Err(StoreError::AlreadyExists {
                collection: self.name().to_string(),
                key: self.primary_key.clone(),
                value: id.to_string(),
            })
        }
    }

    /// Inserts records one by one, stopping at the first failure.
    pub async fn insert_many(&self, records: &[T]) -> StoreResult<()> {
        for record in records {
            self.insert(record).await?;
        }
        Ok(())
    }

    /// Applies an operator update to the record with the given primary key.
    pub async fn update(&self, id: impl Into<Value> + Send, update: &Document) -> StoreResult<bool> {
        self.collection.update_one(&self.by_id(id.into()), update).await
    }

    /// Applies an operator update to every record matching `filter`.
    pub async fn update_many(&self, filter: &Query, update: &Document) -> StoreResult<usize> {
        self.collection.update_many(filter, update).await
    }

    /// Removes the record with the given primary key.
    pub async fn remove(&self, id: impl Into<Value> + Send) -> StoreResult<bool> {
        self.collection.delete_one(&self.by_id(id.into())).await
    }

    /// Removes every record matching `filter`.
    pub async fn remove_many(&self, filter: &Query) -> StoreResult<usize> {
        self.collection.delete_many(filter).await
    }

    /// Inserts a record, replacing any stored record with the same primary key.
    pub async fn push(&self, record: &T) -> StoreResult<()> {
        let (id, document) = self.keyed_document(record)?;
        let replaced = self.collection.replace(&self.by_id(id), document).await?;
        if replaced > 0 {
            tracing::trace!(collection = %self.name(), replaced, "replacing record");
        }
        Ok(())
    }

    fn keyed_document(&self, record: &T) -> StoreResult<(Value, Document)> {
        let document = self.dump(record)?;
        let id = document
            .get(&self.primary_key)
            .cloned()
            .ok_or_else(|| StoreError::MissingPrimaryKey {
                collection: self.name().to_string(),
                key: self.primary_key.clone(),
            })?;
        Ok((id, document))
    }

    fn by_id(&self, id: Value) -> Query {
        field(self.primary_key.clone(), id)
    }

    fn not_a_document(&self, reason: String) -> StoreError {
        StoreError::NotADocument {
            collection: self.name().to_string(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::MemoryCollection;
    use crate::document::set;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        id: String,
        name: String,
        #[serde(default)]
        team: Option<String>,
    }

    fn user(id: &str, name: &str) -> User {
        User {
            id: id.into(),
            name: name.into(),
            team: None,
        }
    }

    fn table() -> Table<User> {
        Table::new(Arc::new(MemoryCollection::new("users")), "id")
    }

    #[tokio::test]
    async fn test_insert_then_get() {
        let users = table();
        users.insert(&user("u1", "Ada")).await.unwrap();
        assert_eq!(users.get("u1").await.unwrap(), Some(user("u1", "Ada")));
        assert_eq!(users.get("u2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_insert_duplicate_fails() {
        let users = table();
        users.insert(&user("u1", "Ada")).await.unwrap();
        let err = users.insert(&user("u1", "Grace")).await.unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn test_push_replaces() {
        let users = table();
        users.push(&user("u1", "Ada")).await.unwrap();
        users.push(&user("u1", "Grace")).await.unwrap();

        let all = users.find(&Query::new(), None).await.unwrap();
        assert_eq!(all, vec![user("u1", "Grace")]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_of_one_key() {
        let users = table();
        let tasks: Vec<_> = (0..16)
            .map(|n| {
                let users = users.clone();
                tokio::spawn(async move { users.insert(&user("u1", &format!("writer {n}"))).await })
            })
            .collect();

        let mut inserted = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(()) => inserted += 1,
                Err(err) => assert!(err.is_already_exists()),
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(users.find(&Query::new(), None).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_pushes_keep_one_record() {
        let users = table();
        let tasks: Vec<_> = (0..16)
            .map(|n| {
                let users = users.clone();
                tokio::spawn(async move { users.push(&user("u1", &format!("writer {n}"))).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(users.find(&Query::new(), None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_remove() {
        let users = table();
        users.insert(&user("u1", "Ada")).await.unwrap();

        let mut fields = Document::new();
        fields.insert("team".into(), json!("red"));
        assert!(users.update("u1", &set(fields)).await.unwrap());
        assert_eq!(
            users.get("u1").await.unwrap().and_then(|u| u.team),
            Some("red".to_string())
        );

        assert!(users.remove("u1").await.unwrap());
        assert!(!users.remove("u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_document_fails_validation() {
        let collection = Arc::new(MemoryCollection::new("users"));
        let mut bad = Document::new();
        bad.insert("id".into(), json!("u1"));
        collection.insert_one(bad).await.unwrap();

        let users: Table<User> = Table::new(collection, "id");
        let err = users.get("u1").await.unwrap_err();
        assert!(matches!(err, StoreError::Validation { .. }));
    }

    #[test]
    fn test_id_of() {
        let users = table();
        assert_eq!(users.id_of(&user("u9", "Zed")).unwrap(), json!("u9"));

        let by_name: Table<User> = Table::new(Arc::new(MemoryCollection::new("u")), "email");
        assert!(matches!(
            by_name.id_of(&user("u9", "Zed")),
            Err(StoreError::MissingPrimaryKey { .. })
        ));
    }
}
