//! Documents, equality queries and update operators.
//!
//! Documents are plain JSON objects. A [`Query`] is a document whose fields
//! must all be equal in a matching document; when the stored field is an
//! array and the query value is not, the query matches if the array contains
//! the value.
//!
//! Updates use the `$set` / `$unset` operator documents familiar from
//! document databases.

use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// A stored document.
pub type Document = Map<String, Value>;

/// A field-equality filter.
pub type Query = Map<String, Value>;

/// Builds a single-field equality query.
///
/// ```rust
/// use meridian_store::document::field;
///
/// let q = field("id", "u1");
/// assert_eq!(q.get("id"), Some(&serde_json::json!("u1")));
/// ```
pub fn field(key: impl Into<String>, value: impl Into<Value>) -> Query {
    let mut query = Query::new();
    query.insert(key.into(), value.into());
    query
}

/// Returns `true` if `document` satisfies every field of `filter`.
pub fn matches(document: &Document, filter: &Query) -> bool {
    filter.iter().all(|(key, expected)| match document.get(key) {
        Some(Value::Array(items)) if !expected.is_array() => items.contains(expected),
        Some(actual) => actual == expected,
        None => expected.is_null(),
    })
}

/// Applies an operator update document in place.
///
/// Supported operators are `$set` (merge fields) and `$unset` (remove fields).
pub fn apply_update(document: &mut Document, update: &Document) -> StoreResult<()> {
    for (operator, arguments) in update {
        let Value::Object(fields) = arguments else {
            return Err(StoreError::backend(format!(
                "update operator `{operator}` expects a document"
            )));
        };
        match operator.as_str() {
            "$set" => {
                for (key, value) in fields {
                    document.insert(key.clone(), value.clone());
                }
            }
            "$unset" => {
                for key in fields.keys() {
                    document.remove(key);
                }
            }
            other => {
                return Err(StoreError::backend(format!(
                    "unsupported update operator `{other}`"
                )))
            }
        }
    }
    Ok(())
}

/// Builds a `$set` update document.
pub fn set(fields: Document) -> Document {
    let mut update = Document::new();
    update.insert("$set".to_string(), Value::Object(fields));
    update
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_matches_equality() {
        let d = doc(json!({"id": "u1", "age": 3}));
        assert!(matches(&d, &field("id", "u1")));
        assert!(!matches(&d, &field("id", "u2")));
        assert!(matches(&d, &Query::new()));
    }

    #[test]
    fn test_matches_array_membership() {
        let d = doc(json!({"tags": ["a", "b"]}));
        assert!(matches(&d, &field("tags", "b")));
        assert!(!matches(&d, &field("tags", "c")));
        assert!(matches(&d, &field("tags", json!(["a", "b"]))));
    }

    #[test]
    fn test_missing_field_matches_null_only() {
        let d = doc(json!({"id": "u1"}));
        assert!(matches(&d, &field("deleted", Value::Null)));
        assert!(!matches(&d, &field("deleted", true)));
    }

    #[test]
    fn test_apply_set_and_unset() {
        let mut d = doc(json!({"id": "u1", "name": "Ada", "tmp": 1}));
        let update = doc(json!({"$set": {"name": "Grace"}, "$unset": {"tmp": ""}}));
        apply_update(&mut d, &update).unwrap();
        assert_eq!(Value::Object(d), json!({"id": "u1", "name": "Grace"}));
    }

    #[test]
    fn test_apply_unknown_operator() {
        let mut d = doc(json!({"n": 1}));
        let err = apply_update(&mut d, &doc(json!({"$inc": {"n": 1}}))).unwrap_err();
        assert!(err.to_string().contains("$inc"));
    }
}
