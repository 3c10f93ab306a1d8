//! Buffered responses with assertion helpers.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use http_body_util::BodyExt;
use meridian_server::HttpResponse;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::TestError;

/// A fully read response.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Reads a dispatcher response.
    pub async fn from_http(response: HttpResponse) -> Result<Self, TestError> {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| TestError::BodyRead(e.to_string()))?
            .to_bytes();
        Ok(Self {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    /// Returns the status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status as a number.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// Returns a header value as text.
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Returns `Content-Type`.
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decodes the body as UTF-8.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Deserializes the JSON body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Parses the body as an untyped JSON value.
    pub fn json_value(&self) -> Result<Value, TestError> {
        self.json()
    }

    /// Asserts the status.
    #[track_caller]
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "expected status {expected}, got {} with body {}",
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts a header value.
    #[track_caller]
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let actual = self
            .header_str(name)
            .unwrap_or_else(|| panic!("header `{name}` not found"));
        assert_eq!(actual, expected.as_ref(), "header `{name}`");
        self
    }

    /// Asserts that the body is exactly this JSON value.
    #[track_caller]
    pub fn assert_json(&self, expected: &Value) -> &Self {
        let actual = self
            .json_value()
            .unwrap_or_else(|e| panic!("body is not JSON: {e}"));
        assert_eq!(&actual, expected);
        self
    }

    /// Asserts a structured API error body.
    #[track_caller]
    pub fn assert_api_error(&self, status: StatusCode, code: &str) -> &Self {
        self.assert_status(status);
        let body = self
            .json_value()
            .unwrap_or_else(|e| panic!("body is not JSON: {e}"));
        assert_eq!(body["error"], code, "error code");
        assert_eq!(body["statusCode"], status.as_u16(), "statusCode");
        assert!(body.get("message").is_some(), "message key missing");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use serde_json::json;

    fn response(status: StatusCode, body: &'static str) -> TestResponse {
        let mut response = http::Response::new(Full::new(Bytes::from_static(body.as_bytes())));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        tokio_test::block_on(TestResponse::from_http(response)).unwrap()
    }

    #[test]
    fn test_json_accessors() {
        let response = response(StatusCode::OK, r#"{"id":"u1"}"#);
        assert_eq!(response.status_code(), 200);
        assert_eq!(response.content_type(), Some("application/json"));
        assert_eq!(response.json_value().unwrap(), json!({"id": "u1"}));
        response.assert_json(&json!({"id": "u1"}));
    }

    #[test]
    fn test_api_error_assertion() {
        let response = response(
            StatusCode::NOT_FOUND,
            r#"{"error":"object.notfound","statusCode":404,"message":null}"#,
        );
        response.assert_api_error(StatusCode::NOT_FOUND, "object.notfound");
    }

    #[test]
    #[should_panic(expected = "expected status 200")]
    fn test_status_assertion_fails() {
        response(StatusCode::BAD_REQUEST, "{}").assert_status(StatusCode::OK);
    }
}
