//! Store error types.

use thiserror::Error;

/// Result type alias using [`StoreError`].
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by tables, databases and collection drivers.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An insert targeted a primary key that is already present.
    #[error("object with {key} = {value} already exists in `{collection}`; use push to replace it")]
    AlreadyExists {
        /// Collection the insert targeted.
        collection: String,
        /// Primary key field name.
        key: String,
        /// Rendered primary key value.
        value: String,
    },

    /// A table was requested that was never registered on the database.
    #[error("table `{table}` is not registered in database `{database}`")]
    TableNotFound {
        /// Database name.
        database: String,
        /// Requested table name.
        table: String,
    },

    /// A stored document could not be loaded into the table's record type.
    #[error("document in `{collection}` failed validation: {source}")]
    Validation {
        /// Collection the document came from.
        collection: String,
        /// The underlying deserialization error.
        #[source]
        source: serde_json::Error,
    },

    /// A record did not serialize into a document.
    #[error("record for `{collection}` is not a document: {reason}")]
    NotADocument {
        /// Collection the record was destined for.
        collection: String,
        /// What went wrong.
        reason: String,
    },

    /// A record has no value for the table's primary key.
    #[error("record for `{collection}` has no primary key field `{key}`")]
    MissingPrimaryKey {
        /// Collection the record was destined for.
        collection: String,
        /// Primary key field name.
        key: String,
    },

    /// The driver rejected the operation.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Creates a backend error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }

    /// Returns `true` for [`StoreError::AlreadyExists`].
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_not_found_message() {
        let err = StoreError::TableNotFound {
            database: "app".into(),
            table: "users".into(),
        };
        assert_eq!(
            err.to_string(),
            "table `users` is not registered in database `app`"
        );
    }

    #[test]
    fn test_is_already_exists() {
        let err = StoreError::AlreadyExists {
            collection: "users".into(),
            key: "id".into(),
            value: "\"u1\"".into(),
        };
        assert!(err.is_already_exists());
        assert!(!StoreError::backend("down").is_already_exists());
    }
}
