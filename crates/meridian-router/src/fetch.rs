//! Fetch descriptors: declarative rules that turn a captured path parameter
//! into objects loaded from a table.
//!
//! ```
//! use meridian_router::FetchDescriptor;
//! use meridian_store::MemoryStore;
//! use serde_json::Value;
//!
//! let users = MemoryStore::new().database("app").create_table::<Value>("users", "id");
//!
//! // `{id}` resolves to one user; absent users fail the request with a 404.
//! let by_id = FetchDescriptor::one(&users);
//!
//! // `{team}` resolves to every user whose `team_id` equals the captured value.
//! let by_team = FetchDescriptor::many(&users).key("team_id");
//! # let _ = (by_id, by_team);
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use meridian_core::{ApiError, ArgValue, DispatchResult};
use meridian_store::document::field;
use meridian_store::{Query, Record, StoreResult, Table};
use serde_json::Value;

/// How many objects a lookup yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// One object, or none.
    Single,
    /// A possibly-empty ordered sequence.
    Multiple,
}

/// How the captured text is turned into a lookup value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyFormat {
    /// Look up by the captured string.
    #[default]
    Text,
    /// Look up by the captured string parsed as an integer.
    Integer,
}

/// Outcome of a lookup.
pub enum Resolved {
    /// The argument value to hand to the handler.
    Value(ArgValue),
    /// A required single object was absent.
    Missing,
}

/// A source of objects for fetch descriptors.
///
/// Implemented for every [`Table`]; the argument values it produces are the
/// table's record type `T` (single), `Option<T>` (nullable single) or
/// `Vec<T>` (multiple).
#[async_trait]
pub trait Lookup: Send + Sync {
    /// Returns a name for logging.
    fn source_name(&self) -> &str;

    /// Runs the lookup.
    async fn resolve(
        &self,
        query: &Query,
        cardinality: Cardinality,
        nullable: bool,
    ) -> StoreResult<Resolved>;
}

#[async_trait]
impl<T: Record> Lookup for Table<T> {
    fn source_name(&self) -> &str {
        self.name()
    }

    async fn resolve(
        &self,
        query: &Query,
        cardinality: Cardinality,
        nullable: bool,
    ) -> StoreResult<Resolved> {
        match cardinality {
            Cardinality::Single => {
                let found = self.find_one(query).await?;
                Ok(match (found, nullable) {
                    (Some(object), true) => Resolved::Value(Box::new(Some(object))),
                    (Some(object), false) => Resolved::Value(Box::new(object)),
                    (None, true) => Resolved::Value(Box::new(None::<T>)),
                    (None, false) => Resolved::Missing,
                })
            }
            Cardinality::Multiple => {
                let found = self.find(query, None).await?;
                Ok(Resolved::Value(Box::new(found)))
            }
        }
    }
}

/// Resolves one path parameter from a table.
#[derive(Clone)]
pub struct FetchDescriptor {
    source: Arc<dyn Lookup>,
    key: Option<String>,
    cardinality: Cardinality,
    nullable: bool,
    key_format: KeyFormat,
}

impl FetchDescriptor {
    /// Resolves to a single object of `table`.
    pub fn one<T: Record>(table: &Table<T>) -> Self {
        Self::from_source(Arc::new(table.clone()), Cardinality::Single)
    }

    /// Resolves to every matching object of `table`.
    pub fn many<T: Record>(table: &Table<T>) -> Self {
        Self::from_source(Arc::new(table.clone()), Cardinality::Multiple)
    }

    /// Resolves from an arbitrary source.
    pub fn from_source(source: Arc<dyn Lookup>, cardinality: Cardinality) -> Self {
        Self {
            source,
            key: None,
            cardinality,
            nullable: false,
            key_format: KeyFormat::Text,
        }
    }

    /// Looks up by `key` instead of the parameter name.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Lets a single lookup resolve to `None` instead of failing.
    ///
    /// Has no effect on multiple lookups, which never fail when empty.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Parses the captured value as an integer before looking it up.
    pub fn integer_key(mut self) -> Self {
        self.key_format = KeyFormat::Integer;
        self
    }

    /// Returns the cardinality.
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Returns `true` if a missing single object resolves to `None`.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns the lookup key used for parameter `param`.
    pub fn key_for<'a>(&'a self, param: &'a str) -> &'a str {
        self.key.as_deref().unwrap_or(param)
    }

    /// Resolves the raw value captured for `param`.
    pub async fn resolve(&self, param: &str, raw: &str) -> DispatchResult<ArgValue> {
        let key = self.key_for(param);
        let value = match self.key_format {
            KeyFormat::Text => Value::String(raw.to_string()),
            KeyFormat::Integer => raw.parse::<i64>().map(Value::from).map_err(|_| {
                ApiError::bad_request(
                    "parameter.invalid",
                    format!("`{param}` must be an integer, got `{raw}`"),
                )
            })?,
        };

        match self
            .source
            .resolve(&field(key, value), self.cardinality, self.nullable)
            .await?
        {
            Resolved::Value(value) => Ok(value),
            Resolved::Missing => {
                tracing::warn!(
                    param,
                    key,
                    table = %self.source.source_name(),
                    "required object not found"
                );
                Err(ApiError::object_not_found(key, raw).into())
            }
        }
    }
}

impl fmt::Debug for FetchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchDescriptor")
            .field("source", &self.source.source_name())
            .field("key", &self.key)
            .field("cardinality", &self.cardinality)
            .field("nullable", &self.nullable)
            .field("key_format", &self.key_format)
            .finish()
    }
}
