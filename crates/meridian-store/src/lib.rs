//! # Meridian Store
//!
//! Typed tables over schemaless document collections.
//!
//! The dispatch layer only ever calls [`Table::get`], [`Table::find`] and
//! [`Table::find_one`]; the rest of the surface exists for applications that
//! manage their own data through the same table handles.
//!
//! - [`Collection`] - The document-store driver boundary
//! - [`MemoryCollection`] / [`MemoryStore`] - In-process driver used by tests and demos
//! - [`Table`] - A collection bound to a record type and a primary key
//! - [`Database`] - Registry of named tables
//! - [`StoreError`] - Errors raised by tables and drivers
//!
//! # Example
//!
//! ```rust
//! use meridian_store::{MemoryStore, Query};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize, PartialEq)]
//! struct User {
//!     id: String,
//!     name: String,
//! }
//!
//! # tokio_test::block_on(async {
//! let store = MemoryStore::new();
//! let db = store.database("app");
//! let users = db.create_table::<User>("users", "id");
//!
//! users.insert(&User { id: "u1".into(), name: "Ada".into() }).await.unwrap();
//! let found = users.get("u1").await.unwrap();
//! assert_eq!(found.map(|u| u.name), Some("Ada".to_string()));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/meridian-store/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod collection;
mod database;
pub mod document;
mod error;
mod table;

pub use collection::{Collection, CollectionProvider, MemoryCollection, MemoryCollections, MemoryStore};
pub use database::Database;
pub use document::{Document, Query};
pub use error::{StoreError, StoreResult};
pub use table::{Record, Table};
