//! Database table registry.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::collection::{Collection, CollectionProvider};
use crate::error::{StoreError, StoreResult};
use crate::table::{Record, Table};

struct TableEntry {
    collection: Arc<dyn Collection>,
    primary_key: String,
}

struct Inner {
    name: String,
    provider: Arc<dyn CollectionProvider>,
    tables: RwLock<IndexMap<String, TableEntry>>,
}

/// A named database holding the tables registered by the application.
///
/// Only registered tables can be looked up; [`Database::table`] fails with
/// [`StoreError::TableNotFound`] otherwise. Clones share the registry.
#[derive(Clone)]
pub struct Database {
    inner: Arc<Inner>,
}

impl Database {
    /// Creates an empty database backed by `provider`.
    pub fn new(name: impl Into<String>, provider: Arc<dyn CollectionProvider>) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                provider,
                tables: RwLock::new(IndexMap::new()),
            }),
        }
    }

    /// Returns the database name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Creates a table over the collection `collection` and registers it.
    pub fn create_table<T: Record>(&self, collection: &str, primary_key: &str) -> Table<T> {
        let table = Table::new(
            self.inner.provider.collection(&self.inner.name, collection),
            primary_key,
        );
        self.add_table(&table);
        table
    }

    /// Registers an existing table under its collection name.
    ///
    /// A later registration for the same collection replaces the earlier one.
    pub fn add_table<T: Record>(&self, table: &Table<T>) {
        tracing::debug!(database = %self.name(), table = %table.name(), "registering table");
        self.inner.tables.write().insert(
            table.name().to_string(),
            TableEntry {
                collection: Arc::clone(table.collection()),
                primary_key: table.primary_key().to_string(),
            },
        );
    }

    /// Looks up a registered table, typed as `T`.
    pub fn table<T: Record>(&self, name: &str) -> StoreResult<Table<T>> {
        let tables = self.inner.tables.read();
        let entry = tables.get(name).ok_or_else(|| StoreError::TableNotFound {
            database: self.name().to_string(),
            table: name.to_string(),
        })?;
        Ok(Table::new(
            Arc::clone(&entry.collection),
            entry.primary_key.clone(),
        ))
    }

    /// Returns the registered table names in registration order.
    pub fn table_names(&self) -> Vec<String> {
        self.inner.tables.read().keys().cloned().collect()
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.inner.name)
            .field("tables", &self.table_names())
            .finish_non_exhaustive()
    }
}
