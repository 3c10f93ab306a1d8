//! Handler return values.
//!
//! Handlers return a [`Reply`]: a tree of domain objects, lists, maps, plain
//! JSON, pagination envelopes and raw responses. The encoder turns that tree
//! into a single JSON value or a wire response.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use indexmap::IndexMap;
use serde_json::Value;

/// Media type of JSON responses.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// A domain object with one or more presentations.
///
/// The presentation mode selects which fields are exposed, e.g. `"public"`
/// for anonymous callers or `"personal"` for the owner of the object.
///
/// ```
/// use meridian_core::ApiObject;
/// use serde_json::{json, Value};
///
/// #[derive(Debug)]
/// struct User { id: String, email: String }
///
/// impl ApiObject for User {
///     fn api_data(&self, mode: &str) -> Value {
///         match mode {
///             "personal" => json!({"id": self.id, "email": self.email}),
///             _ => json!({"id": self.id}),
///         }
///     }
/// }
/// ```
pub trait ApiObject: fmt::Debug + Send + Sync {
    /// Returns the presentation of this object for `mode`.
    fn api_data(&self, mode: &str) -> Value;
}

/// A wire-level response produced directly by a handler or hook.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    media_type: String,
    body: Bytes,
}

impl RawResponse {
    /// Creates a response with the given status, media type and body.
    pub fn new(status: StatusCode, media_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            media_type: media_type.into(),
            body: body.into(),
        }
    }

    /// Creates a JSON response.
    pub fn json(status: StatusCode, value: &Value) -> Self {
        Self::new(status, JSON_MEDIA_TYPE, value.to_string())
    }

    /// Creates a plain-text response.
    pub fn text(status: StatusCode, text: impl Into<String>) -> Self {
        Self::new(status, "text/plain; charset=utf-8", text.into())
    }

    /// Adds a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replaces the body, keeping status, headers and media type.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns the status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the extra headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the media type.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Returns the body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns `true` if the media type is JSON.
    pub fn is_json(&self) -> bool {
        let essence = self
            .media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim();
        essence.eq_ignore_ascii_case(JSON_MEDIA_TYPE) || essence.ends_with("+json")
    }

    /// Decodes a JSON body.
    pub fn json_body(&self) -> Option<Value> {
        if self.is_json() {
            serde_json::from_slice(&self.body).ok()
        } else {
            None
        }
    }
}

/// A pagination envelope.
#[derive(Debug, Clone)]
pub struct Page {
    /// Items of the current page.
    pub items: Vec<Reply>,
    /// Current page, 1-indexed.
    pub page: u64,
    /// Page size.
    pub per_page: u64,
    /// Next page number, if there is one.
    pub next_page: Option<u64>,
}

/// A value returned by a handler, hook or error handler.
#[derive(Debug, Clone, Default)]
pub enum Reply {
    /// No content; encodes to `null`.
    #[default]
    Empty,
    /// Plain JSON, passed through unchanged.
    Json(Value),
    /// A domain object, encoded through its presentation.
    Object(Arc<dyn ApiObject>),
    /// An ordered sequence.
    List(Vec<Reply>),
    /// An ordered mapping.
    Map(IndexMap<String, Reply>),
    /// A pagination envelope.
    Page(Page),
    /// A wire-level response.
    Response(RawResponse),
}

impl Reply {
    /// Wraps a domain object.
    pub fn object(object: impl ApiObject + 'static) -> Self {
        Self::Object(Arc::new(object))
    }

    /// Wraps a sequence of domain objects.
    pub fn objects<T: ApiObject + 'static>(objects: impl IntoIterator<Item = T>) -> Self {
        Self::List(objects.into_iter().map(Self::object).collect())
    }

    /// Builds a list from anything convertible into replies.
    pub fn list<R: Into<Reply>>(items: impl IntoIterator<Item = R>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    /// Returns the JSON value if this is a [`Reply::Json`].
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<RawResponse> for Reply {
    fn from(response: RawResponse) -> Self {
        Self::Response(response)
    }
}

impl From<Page> for Reply {
    fn from(page: Page) -> Self {
        Self::Page(page)
    }
}

impl From<Vec<Reply>> for Reply {
    fn from(items: Vec<Reply>) -> Self {
        Self::List(items)
    }
}

impl From<IndexMap<String, Reply>> for Reply {
    fn from(map: IndexMap<String, Reply>) -> Self {
        Self::Map(map)
    }
}

impl From<Arc<dyn ApiObject>> for Reply {
    fn from(object: Arc<dyn ApiObject>) -> Self {
        Self::Object(object)
    }
}

impl From<()> for Reply {
    fn from((): ()) -> Self {
        Self::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_is_json() {
        let ok = RawResponse::new(StatusCode::OK, "application/json; charset=utf-8", "{}");
        assert!(ok.is_json());
        assert!(RawResponse::new(StatusCode::OK, "application/problem+json", "{}").is_json());
        assert!(!RawResponse::text(StatusCode::OK, "hi").is_json());
    }

    #[test]
    fn test_json_body() {
        let resp = RawResponse::json(StatusCode::CREATED, &json!({"a": 1}));
        assert_eq!(resp.json_body(), Some(json!({"a": 1})));
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(RawResponse::text(StatusCode::OK, "{}").json_body(), None);
    }

    #[test]
    fn test_list_from_values() {
        let reply = Reply::list(vec![json!(1), json!(2)]);
        match reply {
            Reply::List(items) => assert_eq!(items.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }
}
