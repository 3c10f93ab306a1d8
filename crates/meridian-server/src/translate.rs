//! Conversion of dispatch outcomes into HTTP responses.
//!
//! Two errors have built-in translations: [`ApiError`] becomes its JSON
//! error body with its own status, and an immediate-response signal is
//! encoded like a normal reply. Everything else that reaches the
//! application boundary is logged and answered with a generic 500.

use bytes::Bytes;
use http::header::{HeaderValue, ALLOW, CONTENT_TYPE};
use http::{Method, Response, StatusCode};
use http_body_util::Full;
use meridian_core::{encode, ApiError, DispatchError, Encoded, RawResponse, JSON_MEDIA_TYPE};
use serde_json::Value;

/// Response body type.
pub type ResponseBody = Full<Bytes>;

/// HTTP response produced by the dispatcher.
pub type HttpResponse = Response<ResponseBody>;

/// Error code of the generic 500 response.
pub const INTERNAL_ERROR_CODE: &str = "internal_error";

/// Error code returned for paths no route matches.
pub const ROUTE_NOT_FOUND_CODE: &str = "route.notfound";

/// Error code returned when the path matches under other methods only.
pub const METHOD_NOT_ALLOWED_CODE: &str = "method.notallowed";

/// Renders an encoded reply.
pub fn encoded_response(encoded: Encoded) -> HttpResponse {
    match encoded {
        Encoded::Json(value) => json_response(StatusCode::OK, &value),
        Encoded::Response(raw) => raw_response(raw),
    }
}

/// Renders an error that no error handler recovered.
pub fn error_response(err: DispatchError, mode: &str) -> HttpResponse {
    match err {
        DispatchError::Api(api) => api_error_response(&api),
        DispatchError::Respond(reply) => encoded_response(encode(&reply, mode)),
        other => {
            tracing::error!(error.kind = %other.kind(), error = %other, "unhandled dispatch error");
            internal_error_response()
        }
    }
}

/// Renders an API error body with the error's status.
pub fn api_error_response(err: &ApiError) -> HttpResponse {
    json_response(err.status(), &err.to_body())
}

/// The generic 500 response.
pub fn internal_error_response() -> HttpResponse {
    api_error_response(&ApiError::new(
        INTERNAL_ERROR_CODE,
        StatusCode::INTERNAL_SERVER_ERROR,
    ))
}

/// 404 for an unmatched path.
pub fn not_found_response(path: &str) -> HttpResponse {
    api_error_response(
        &ApiError::new(ROUTE_NOT_FOUND_CODE, StatusCode::NOT_FOUND)
            .with_message(format!("no route for {path}")),
    )
}

/// 405 listing the methods registered for the path.
pub fn method_not_allowed_response(allowed: &[Method]) -> HttpResponse {
    let mut response = api_error_response(&ApiError::new(
        METHOD_NOT_ALLOWED_CODE,
        StatusCode::METHOD_NOT_ALLOWED,
    ));
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

/// Serializes `value` as a JSON response.
pub fn json_response(status: StatusCode, value: &Value) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::from(value.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_MEDIA_TYPE));
    response
}

fn raw_response(raw: RawResponse) -> HttpResponse {
    let mut response = Response::new(Full::new(raw.body().clone()));
    *response.status_mut() = raw.status();
    let headers = response.headers_mut();
    for (name, value) in raw.headers() {
        headers.append(name, value.clone());
    }
    if !headers.contains_key(CONTENT_TYPE) {
        if let Ok(value) = HeaderValue::from_str(raw.media_type()) {
            headers.insert(CONTENT_TYPE, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use meridian_core::{ErrorKind, Reply};
    use serde_json::json;

    fn body_json(response: HttpResponse) -> Value {
        let bytes = tokio_test::block_on(response.into_body().collect())
            .unwrap()
            .to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_api_error_body() {
        let response = error_response(ApiError::object_not_found("id", "u9").into(), "public");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            JSON_MEDIA_TYPE
        );
        let body = body_json(response);
        assert_eq!(body["error"], "object.notfound");
        assert_eq!(body["statusCode"], 404);
        assert!(body.get("message").is_some());
    }

    #[test]
    fn test_respond_signal_is_encoded() {
        let raw = RawResponse::json(StatusCode::CREATED, &json!({"ok": true}));
        let response = error_response(DispatchError::respond(Reply::Response(raw)), "public");
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response), json!({"ok": true}));
    }

    #[test]
    fn test_other_errors_become_internal() {
        let err = DispatchError::custom(ErrorKind::new("billing"), std::io::Error::other("down"));
        let response = error_response(err, "public");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response);
        assert_eq!(body["error"], INTERNAL_ERROR_CODE);
        assert_eq!(body["statusCode"], 500);
        assert_eq!(body["message"], Value::Null);
    }

    #[test]
    fn test_raw_response_keeps_headers() {
        let raw = RawResponse::text(StatusCode::ACCEPTED, "queued").with_header(
            http::header::HeaderName::from_static("x-job"),
            HeaderValue::from_static("42"),
        );
        let response = encoded_response(Encoded::Response(raw));
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.headers().get("x-job").unwrap(), "42");
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let response = method_not_allowed_response(&[Method::GET, Method::POST]);
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(ALLOW).unwrap(), "GET, POST");
    }
}
