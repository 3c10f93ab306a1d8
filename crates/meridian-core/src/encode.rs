//! Response encoding.
//!
//! [`encode`] normalizes a [`Reply`] tree for a presentation mode:
//!
//! - domain objects become their presentation data
//! - lists and maps are encoded recursively, order and keys preserved
//! - pagination envelopes become `{"type": "paginable", ...}` objects
//! - a top-level JSON response has its body decoded, encoded and re-wrapped
//!   with identical status, headers and media type; other responses pass
//!   through untouched
//!
//! Encoding is idempotent: encoding the result of an encoding yields the
//! same value.

use serde_json::{json, Map, Value};

use crate::reply::{Page, RawResponse, Reply};

/// Type tag of pagination envelopes.
pub const PAGINABLE_TYPE: &str = "paginable";

/// The presentation mode used when nothing else selects one.
pub const DEFAULT_PRESENTATION_MODE: &str = "public";

/// An encoded reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Encoded {
    /// A JSON value to be serialized with status 200.
    Json(Value),
    /// A wire-level response.
    Response(RawResponse),
}

impl Encoded {
    /// Returns the JSON value, if this is one.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Response(_) => None,
        }
    }
}

impl From<Encoded> for Reply {
    fn from(encoded: Encoded) -> Self {
        match encoded {
            Encoded::Json(value) => Self::Json(value),
            Encoded::Response(response) => Self::Response(response),
        }
    }
}

/// Encodes a reply for the given presentation mode.
pub fn encode(reply: &Reply, mode: &str) -> Encoded {
    match reply {
        Reply::Response(response) => Encoded::Response(encode_response(response, mode)),
        other => Encoded::Json(encode_value(other, mode)),
    }
}

/// Encodes a reply nested inside another value.
///
/// Nested responses contribute their decoded JSON body, or their body as a
/// string when it is not JSON.
pub fn encode_value(reply: &Reply, mode: &str) -> Value {
    match reply {
        Reply::Empty => Value::Null,
        Reply::Json(value) => value.clone(),
        Reply::Object(object) => object.api_data(mode),
        Reply::List(items) => Value::Array(items.iter().map(|r| encode_value(r, mode)).collect()),
        Reply::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(key, r)| (key.clone(), encode_value(r, mode)))
                .collect::<Map<String, Value>>(),
        ),
        Reply::Page(page) => encode_page(page, mode),
        Reply::Response(response) => response
            .json_body()
            .unwrap_or_else(|| Value::String(String::from_utf8_lossy(response.body()).into_owned())),
    }
}

fn encode_page(page: &Page, mode: &str) -> Value {
    json!({
        "type": PAGINABLE_TYPE,
        "items": page.items.iter().map(|r| encode_value(r, mode)).collect::<Vec<_>>(),
        "page": page.page,
        "perPage": page.per_page,
        "nextPage": page.next_page,
    })
}

fn encode_response(response: &RawResponse, mode: &str) -> RawResponse {
    match response.json_body() {
        Some(body) => {
            let encoded = encode_value(&Reply::Json(body), mode);
            response.clone().with_body(encoded.to_string())
        }
        None => response.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::ApiObject;
    use http::header::{HeaderName, HeaderValue};
    use http::StatusCode;
    use indexmap::IndexMap;
    use proptest::prelude::*;

    #[derive(Debug)]
    struct User {
        id: u32,
        email: &'static str,
    }

    impl ApiObject for User {
        fn api_data(&self, mode: &str) -> Value {
            if mode == "personal" {
                json!({"id": self.id, "email": self.email})
            } else {
                json!({"id": self.id})
            }
        }
    }

    #[test]
    fn test_object_uses_presentation_mode() {
        let reply = Reply::object(User { id: 1, email: "a@b" });
        assert_eq!(encode(&reply, "public"), Encoded::Json(json!({"id": 1})));
        assert_eq!(
            encode(&reply, "personal"),
            Encoded::Json(json!({"id": 1, "email": "a@b"}))
        );
    }

    #[test]
    fn test_nested_structures_preserve_order() {
        let mut map = IndexMap::new();
        map.insert("zeta".to_string(), Reply::objects(vec![User { id: 2, email: "" }]));
        map.insert("alpha".to_string(), Reply::Json(json!(true)));

        let encoded = encode_value(&Reply::Map(map), "public");
        let keys: Vec<_> = encoded.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(encoded["zeta"], json!([{"id": 2}]));
    }

    #[test]
    fn test_page_envelope() {
        let page = Page {
            items: vec![Reply::object(User { id: 7, email: "" })],
            page: 2,
            per_page: 1,
            next_page: None,
        };
        assert_eq!(
            encode_value(&Reply::Page(page), "public"),
            json!({"type": "paginable", "items": [{"id": 7}], "page": 2, "perPage": 1, "nextPage": null})
        );
    }

    #[test]
    fn test_json_response_rewrapped() {
        let response = RawResponse::new(StatusCode::ACCEPTED, "application/json", "{ \"a\" : [1, 2] }")
            .with_header(HeaderName::from_static("x-trace"), HeaderValue::from_static("t1"));

        let Encoded::Response(out) = encode(&Reply::Response(response.clone()), "public") else {
            panic!("expected a response");
        };
        assert_eq!(out.status(), StatusCode::ACCEPTED);
        assert_eq!(out.headers(), response.headers());
        assert_eq!(out.media_type(), "application/json");
        assert_eq!(out.body().as_ref(), br#"{"a":[1,2]}"#);
    }

    #[test]
    fn test_non_json_response_passes_through() {
        let response = RawResponse::text(StatusCode::OK, "plain");
        assert_eq!(
            encode(&Reply::Response(response.clone()), "public"),
            Encoded::Response(response)
        );
    }

    #[test]
    fn test_encoding_is_idempotent_for_responses() {
        let reply = Reply::Response(RawResponse::new(StatusCode::OK, "application/json", "[ 1 ,2 ]"));
        let once = encode(&reply, "public");
        let twice = encode(&Reply::from(once.clone()), "public");
        assert_eq!(once, twice);
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z]{0,8}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::vec(("[a-z]{1,4}", inner), 0..4)
                    .prop_map(|entries| Value::Object(entries.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_encode_is_idempotent(value in arb_json(), wrap in any::<bool>()) {
            let reply = if wrap {
                Reply::Response(RawResponse::json(StatusCode::OK, &value))
            } else {
                Reply::Json(value)
            };
            let once = encode(&reply, "public");
            let twice = encode(&Reply::from(once.clone()), "public");
            prop_assert_eq!(once, twice);
        }
    }
}
