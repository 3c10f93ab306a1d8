//! Kind-matched error handlers.

use std::fmt;
use std::sync::Arc;

use meridian_core::{BoxFuture, Context, DispatchError, DispatchResult, ErrorKind, KindRegistry, Reply};

type HandlerFn =
    Arc<dyn for<'a> Fn(DispatchError, &'a mut Context) -> BoxFuture<'a, DispatchResult<Reply>> + Send + Sync>;

/// Recovers from failures of one [`ErrorKind`] and its descendants.
///
/// The handler's reply replaces the failed response and is encoded like any
/// handler reply. A failing error handler is not matched again.
///
/// # Example
///
/// ```
/// use meridian_core::{ErrorKind, Reply};
/// use meridian_middleware::ErrorHandler;
/// use serde_json::json;
///
/// let fallback = ErrorHandler::new(ErrorKind::API_NOT_FOUND, |_err, _ctx| {
///     Box::pin(async move { Ok(Reply::Json(json!({"found": false}))) })
/// });
/// assert_eq!(fallback.kind(), &ErrorKind::API_NOT_FOUND);
/// ```
#[derive(Clone)]
pub struct ErrorHandler {
    kind: ErrorKind,
    handler: HandlerFn,
}

impl ErrorHandler {
    /// Creates a handler for `kind`.
    pub fn new<F>(kind: ErrorKind, handler: F) -> Self
    where
        F: for<'a> Fn(DispatchError, &'a mut Context) -> BoxFuture<'a, DispatchResult<Reply>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            kind,
            handler: Arc::new(handler),
        }
    }

    /// Returns the handled kind.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns `true` if this handler accepts failures of kind `raised`.
    pub fn matches(&self, kinds: &KindRegistry, raised: &ErrorKind) -> bool {
        kinds.is_a(raised, &self.kind)
    }

    /// Runs the handler.
    pub async fn handle(&self, error: DispatchError, ctx: &mut Context) -> DispatchResult<Reply> {
        (self.handler)(error, ctx).await
    }
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// Returns the first handler, in order, that accepts `raised`.
pub fn select_handler<'h>(
    handlers: &'h [Arc<ErrorHandler>],
    kinds: &KindRegistry,
    raised: &ErrorKind,
) -> Option<&'h Arc<ErrorHandler>> {
    handlers.iter().find(|h| h.matches(kinds, raised))
}
