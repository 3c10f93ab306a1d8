//! The named argument pool handed to handlers.

use std::any::{type_name, Any};
use std::fmt;

use indexmap::IndexMap;

use crate::error::DispatchError;

/// A type-erased argument value.
pub type ArgValue = Box<dyn Any + Send + Sync>;

/// Named, type-erased handler arguments.
///
/// Resolved path arguments and values injected through the context are
/// merged into one pool, filtered down to the names the handler declares,
/// and handed over. Handlers take their arguments out by name and type.
///
/// ```
/// use meridian_core::Arguments;
///
/// let mut args = Arguments::new();
/// args.insert("limit", 10_u32);
/// assert_eq!(args.take::<u32>("limit").unwrap(), 10);
/// assert!(args.take::<u32>("limit").is_err());
/// ```
#[derive(Default)]
pub struct Arguments {
    values: IndexMap<String, ArgValue>,
}

impl Arguments {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing any previous value of the same name.
    pub fn insert<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.values.insert(name.into(), Box::new(value));
    }

    /// Inserts an already boxed value.
    pub fn insert_boxed(&mut self, name: impl Into<String>, value: ArgValue) {
        self.values.insert(name.into(), value);
    }

    /// Returns `true` if a value with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Borrows a value by name and type.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.values.get(name).and_then(|value| value.downcast_ref())
    }

    /// Removes and returns a value by name and type.
    pub fn take<T: Any>(&mut self, name: &str) -> Result<T, DispatchError> {
        let value = self
            .values
            .shift_remove(name)
            .ok_or_else(|| DispatchError::argument(name, "missing"))?;
        value.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
            DispatchError::argument(name, format!("expected a value of type {}", type_name::<T>()))
        })
    }

    /// Removes and returns an optional value; absent names yield `None`.
    pub fn take_opt<T: Any>(&mut self, name: &str) -> Result<Option<T>, DispatchError> {
        if self.contains(name) {
            self.take(name).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Moves every value of `other` into this pool; `other` wins on clashes.
    pub fn merge(&mut self, other: Self) {
        self.values.extend(other.values);
    }

    /// Drops every value whose name is not in `declared`.
    pub fn retain_declared<S: AsRef<str>>(&mut self, declared: &[S]) {
        self.values
            .retain(|name, _| declared.iter().any(|d| d.as_ref() == name));
    }

    /// Returns the argument names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Returns the number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_wrong_type() {
        let mut args = Arguments::new();
        args.insert("id", "u1".to_string());
        let err = args.take::<u64>("id").unwrap_err();
        assert!(err.to_string().contains("expected a value of type u64"));
    }

    #[test]
    fn test_merge_other_wins() {
        let mut resolved = Arguments::new();
        resolved.insert("id", "from-path".to_string());
        resolved.insert("user", 1_u8);

        let mut injected = Arguments::new();
        injected.insert("id", "from-hook".to_string());
        resolved.merge(injected);

        assert_eq!(resolved.get::<String>("id").map(String::as_str), Some("from-hook"));
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_retain_declared() {
        let mut args = Arguments::new();
        args.insert("id", 1_u8);
        args.insert("extra", 2_u8);
        args.retain_declared(&["id", "missing"]);
        assert_eq!(args.names().collect::<Vec<_>>(), vec!["id"]);
    }

    #[test]
    fn test_take_opt() {
        let mut args = Arguments::new();
        args.insert("n", Some(3_i32));
        assert_eq!(args.take_opt::<Option<i32>>("n").unwrap(), Some(Some(3)));
        assert_eq!(args.take_opt::<Option<i32>>("n").unwrap(), None);
    }
}
