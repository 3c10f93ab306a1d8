//! Error kinds and the "is-a" relation between them.
//!
//! Every failure raised during dispatch carries an [`ErrorKind`]. Error
//! handlers are registered against a kind and match any failure whose kind
//! is that kind or one of its descendants, as recorded in a [`KindRegistry`].
//!
//! Built-in hierarchy:
//!
//! ```text
//! error
//! ├── http
//! │   ├── api
//! │   │   ├── api.not_found
//! │   │   ├── api.bad_request
//! │   │   └── api.internal
//! │   └── respond
//! ├── store
//! │   ├── store.already_exists
//! │   ├── store.table_not_found
//! │   └── store.validation
//! └── argument
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use crate::error::SetupError;

/// A tag identifying a class of failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorKind(Cow<'static, str>);

impl ErrorKind {
    /// Root of every kind.
    pub const ERROR: Self = Self::from_static("error");
    /// Failures that map onto an HTTP response.
    pub const HTTP: Self = Self::from_static("http");
    /// Domain API errors with a code and status.
    pub const API: Self = Self::from_static("api");
    /// A required object could not be found.
    pub const API_NOT_FOUND: Self = Self::from_static("api.not_found");
    /// The request was malformed.
    pub const API_BAD_REQUEST: Self = Self::from_static("api.bad_request");
    /// An internal API error.
    pub const API_INTERNAL: Self = Self::from_static("api.internal");
    /// Immediate-response signals.
    pub const RESPOND: Self = Self::from_static("respond");
    /// Storage failures.
    pub const STORE: Self = Self::from_static("store");
    /// Insert of an existing primary key.
    pub const STORE_ALREADY_EXISTS: Self = Self::from_static("store.already_exists");
    /// Lookup of an unregistered table.
    pub const STORE_TABLE_NOT_FOUND: Self = Self::from_static("store.table_not_found");
    /// A stored document failed validation.
    pub const STORE_VALIDATION: Self = Self::from_static("store.validation");
    /// A handler argument was missing or had the wrong type.
    pub const ARGUMENT: Self = Self::from_static("argument");

    const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Creates an application-defined kind.
    ///
    /// Application kinds must be registered with [`KindRegistry::register`]
    /// to take part in hierarchy matching.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Returns the kind name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ErrorKind {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

/// Records the parent of every known [`ErrorKind`].
///
/// Registration only accepts new kinds under already-known parents, so the
/// relation is always a tree rooted at [`ErrorKind::ERROR`].
#[derive(Debug, Clone)]
pub struct KindRegistry {
    parents: HashMap<ErrorKind, ErrorKind>,
}

impl KindRegistry {
    /// Creates a registry holding the built-in hierarchy.
    pub fn new() -> Self {
        let builtin = [
            (ErrorKind::HTTP, ErrorKind::ERROR),
            (ErrorKind::API, ErrorKind::HTTP),
            (ErrorKind::API_NOT_FOUND, ErrorKind::API),
            (ErrorKind::API_BAD_REQUEST, ErrorKind::API),
            (ErrorKind::API_INTERNAL, ErrorKind::API),
            (ErrorKind::RESPOND, ErrorKind::HTTP),
            (ErrorKind::STORE, ErrorKind::ERROR),
            (ErrorKind::STORE_ALREADY_EXISTS, ErrorKind::STORE),
            (ErrorKind::STORE_TABLE_NOT_FOUND, ErrorKind::STORE),
            (ErrorKind::STORE_VALIDATION, ErrorKind::STORE),
            (ErrorKind::ARGUMENT, ErrorKind::ERROR),
        ];
        Self {
            parents: builtin.into_iter().collect(),
        }
    }

    /// Registers `kind` as a child of `parent`.
    pub fn register(&mut self, kind: ErrorKind, parent: ErrorKind) -> Result<(), SetupError> {
        if self.contains(&kind) {
            return Err(SetupError::DuplicateKind(kind.to_string()));
        }
        if !self.contains(&parent) {
            return Err(SetupError::UnknownKind(parent.to_string()));
        }
        self.parents.insert(kind, parent);
        Ok(())
    }

    /// Returns `true` if the kind is the root or has been registered.
    pub fn contains(&self, kind: &ErrorKind) -> bool {
        *kind == ErrorKind::ERROR || self.parents.contains_key(kind)
    }

    /// Returns the parent of a kind.
    pub fn parent(&self, kind: &ErrorKind) -> Option<&ErrorKind> {
        self.parents.get(kind)
    }

    /// Returns `true` if `kind` is `ancestor` or descends from it.
    ///
    /// Unregistered kinds only match themselves and the root.
    pub fn is_a(&self, kind: &ErrorKind, ancestor: &ErrorKind) -> bool {
        if *ancestor == ErrorKind::ERROR {
            return true;
        }
        let mut current = Some(kind);
        while let Some(k) = current {
            if k == ancestor {
                return true;
            }
            current = self.parents.get(k);
        }
        false
    }

    /// Returns `kind` followed by its ancestors up to the root.
    pub fn ancestry(&self, kind: &ErrorKind) -> Vec<ErrorKind> {
        let mut chain = vec![kind.clone()];
        let mut current = kind;
        while let Some(parent) = self.parents.get(current) {
            chain.push(parent.clone());
            current = parent;
        }
        if chain.last() != Some(&ErrorKind::ERROR) {
            chain.push(ErrorKind::ERROR);
        }
        chain
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_hierarchy() {
        let kinds = KindRegistry::new();
        assert!(kinds.is_a(&ErrorKind::API_NOT_FOUND, &ErrorKind::API));
        assert!(kinds.is_a(&ErrorKind::API_NOT_FOUND, &ErrorKind::HTTP));
        assert!(kinds.is_a(&ErrorKind::API_NOT_FOUND, &ErrorKind::ERROR));
        assert!(!kinds.is_a(&ErrorKind::API, &ErrorKind::API_NOT_FOUND));
        assert!(!kinds.is_a(&ErrorKind::STORE_VALIDATION, &ErrorKind::HTTP));
    }

    #[test]
    fn test_register_application_kind() {
        let mut kinds = KindRegistry::new();
        let quota = ErrorKind::new("billing.quota");
        kinds.register(quota.clone(), ErrorKind::API).unwrap();

        assert!(kinds.is_a(&quota, &ErrorKind::HTTP));
        assert_eq!(
            kinds.ancestry(&quota),
            vec![
                quota,
                ErrorKind::API,
                ErrorKind::HTTP,
                ErrorKind::ERROR
            ]
        );
    }

    #[test]
    fn test_register_rejects_duplicates_and_unknown_parents() {
        let mut kinds = KindRegistry::new();
        assert_eq!(
            kinds.register(ErrorKind::API, ErrorKind::ERROR),
            Err(SetupError::DuplicateKind("api".into()))
        );
        assert_eq!(
            kinds.register(ErrorKind::new("a.b"), ErrorKind::new("a")),
            Err(SetupError::UnknownKind("a".into()))
        );
    }

    #[test]
    fn test_unregistered_kind_matches_itself_and_root() {
        let kinds = KindRegistry::new();
        let stray = ErrorKind::new("stray");
        assert!(kinds.is_a(&stray, &stray));
        assert!(kinds.is_a(&stray, &ErrorKind::ERROR));
        assert!(!kinds.is_a(&stray, &ErrorKind::HTTP));
        assert_eq!(kinds.ancestry(&stray), vec![stray, ErrorKind::ERROR]);
    }
}
