//! Error types for Meridian.
//!
//! Three families of failure exist:
//!
//! - [`SetupError`] - fatal misconfiguration detected while building routes
//! - [`ApiError`] - a domain error with a machine-readable code and a status,
//!   rendered as `{"error": code, "statusCode": status, "message": message}`
//! - [`DispatchError`] - anything raised while serving a request; every
//!   variant reports an [`ErrorKind`] used for error-handler matching

use http::StatusCode;
use meridian_store::StoreError;
use serde_json::{json, Value};
use thiserror::Error;

use crate::kind::ErrorKind;
use crate::reply::Reply;

/// Result type alias using [`DispatchError`].
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Machine-readable code for objects that could not be found.
pub const OBJECT_NOT_FOUND: &str = "object.notfound";

/// Machine-readable code for internal errors.
pub const INTERNAL_ERROR: &str = "internal_error";

/// A domain API error.
///
/// # Example
///
/// ```
/// use meridian_core::ApiError;
///
/// let err = ApiError::object_not_found("id", "u42");
/// assert_eq!(err.status().as_u16(), 404);
/// assert_eq!(err.to_body()["error"], "object.notfound");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code} ({status})")]
pub struct ApiError {
    code: String,
    status: StatusCode,
    message: Option<String>,
    kind: ErrorKind,
}

impl ApiError {
    /// Creates an API error with a code and status.
    pub fn new(code: impl Into<String>, status: StatusCode) -> Self {
        Self {
            code: code.into(),
            status,
            message: None,
            kind: ErrorKind::API,
        }
    }

    /// Creates the error raised when a required object is absent.
    pub fn object_not_found(key: &str, value: impl std::fmt::Display) -> Self {
        Self::new(OBJECT_NOT_FOUND, StatusCode::NOT_FOUND)
            .with_message(format!("no object with {key} = {value}"))
            .with_kind(ErrorKind::API_NOT_FOUND)
    }

    /// Creates a 400 error.
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, StatusCode::BAD_REQUEST)
            .with_message(message)
            .with_kind(ErrorKind::API_BAD_REQUEST)
    }

    /// Creates a 500 error.
    pub fn internal(message: Option<String>) -> Self {
        Self {
            code: INTERNAL_ERROR.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message,
            kind: ErrorKind::API_INTERNAL,
        }
    }

    /// Sets the human-readable message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Overrides the kind used for error-handler matching.
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = kind;
        self
    }

    /// Returns the machine-readable code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the HTTP status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the human-readable message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns the error kind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Renders the JSON error body.
    pub fn to_body(&self) -> Value {
        json!({
            "error": self.code,
            "statusCode": self.status.as_u16(),
            "message": self.message,
        })
    }
}

/// Failures raised while dispatching a request.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// A domain API error.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Stop processing and answer with the attached reply.
    #[error("immediate response")]
    Respond(Box<Reply>),

    /// A storage failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A handler argument was missing or had an unexpected type.
    #[error("argument `{name}`: {reason}")]
    Argument {
        /// Argument name.
        name: String,
        /// What went wrong.
        reason: String,
    },

    /// An application error tagged with an application kind.
    #[error("{kind}: {source}")]
    Custom {
        /// Kind used for error-handler matching.
        kind: ErrorKind,
        /// The underlying error.
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    /// Creates an immediate-response signal.
    pub fn respond(reply: impl Into<Reply>) -> Self {
        Self::Respond(Box::new(reply.into()))
    }

    /// Creates an argument error.
    pub fn argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Argument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Wraps an application error under an application kind.
    pub fn custom(kind: ErrorKind, source: impl Into<anyhow::Error>) -> Self {
        Self::Custom {
            kind,
            source: source.into(),
        }
    }

    /// Returns the kind used for error-handler matching.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Api(err) => err.kind().clone(),
            Self::Respond(_) => ErrorKind::RESPOND,
            Self::Store(StoreError::AlreadyExists { .. }) => ErrorKind::STORE_ALREADY_EXISTS,
            Self::Store(StoreError::TableNotFound { .. }) => ErrorKind::STORE_TABLE_NOT_FOUND,
            Self::Store(StoreError::Validation { .. }) => ErrorKind::STORE_VALIDATION,
            Self::Store(_) => ErrorKind::STORE,
            Self::Argument { .. } => ErrorKind::ARGUMENT,
            Self::Custom { kind, .. } => kind.clone(),
        }
    }

    /// Returns the API error, if this is one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }
}

/// Fatal misconfiguration detected while the application is being built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    /// A path parameter has no matching handler parameter.
    #[error("route `{route}`: path parameter `{param}` is not a handler parameter")]
    UndeclaredPathParam {
        /// Route name.
        route: String,
        /// Offending path parameter.
        param: String,
    },

    /// A fetch rule names something that is not a path parameter.
    #[error("route `{route}`: fetch rule `{param}` does not name a path parameter")]
    FetchWithoutPathParam {
        /// Route name.
        route: String,
        /// Offending parameter.
        param: String,
    },

    /// The path template could not be parsed or registered.
    #[error("route `{route}`: invalid path template: {reason}")]
    InvalidTemplate {
        /// Route name.
        route: String,
        /// What went wrong.
        reason: String,
    },

    /// The same method and template were registered twice.
    #[error("duplicate route {method} {template}")]
    DuplicateRoute {
        /// HTTP method.
        method: String,
        /// Path template.
        template: String,
    },

    /// An error kind was registered twice.
    #[error("error kind `{0}` is already registered")]
    DuplicateKind(String),

    /// An error kind was registered under an unknown parent.
    #[error("unknown parent error kind `{0}`")]
    UnknownKind(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_body() {
        let err = ApiError::new("user.banned", StatusCode::FORBIDDEN).with_message("nope");
        assert_eq!(
            err.to_body(),
            json!({"error": "user.banned", "statusCode": 403, "message": "nope"})
        );
    }

    #[test]
    fn test_api_error_body_without_message() {
        let err = ApiError::internal(None);
        assert_eq!(
            err.to_body(),
            json!({"error": "internal_error", "statusCode": 500, "message": null})
        );
    }

    #[test]
    fn test_not_found_kind_and_status() {
        let err = ApiError::object_not_found("id", "u1");
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.kind(), &ErrorKind::API_NOT_FOUND);
        assert_eq!(err.message(), Some("no object with id = u1"));
    }

    #[test]
    fn test_dispatch_error_kinds() {
        assert_eq!(
            DispatchError::from(ApiError::bad_request("x", "y")).kind(),
            ErrorKind::API_BAD_REQUEST
        );
        assert_eq!(DispatchError::respond(Reply::Empty).kind(), ErrorKind::RESPOND);
        assert_eq!(
            DispatchError::from(StoreError::backend("down")).kind(),
            ErrorKind::STORE
        );
        assert_eq!(DispatchError::argument("a", "missing").kind(), ErrorKind::ARGUMENT);

        let custom = DispatchError::custom(ErrorKind::new("billing"), anyhow::anyhow!("card"));
        assert_eq!(custom.kind(), ErrorKind::new("billing"));
        assert_eq!(custom.to_string(), "billing: card");
    }
}
