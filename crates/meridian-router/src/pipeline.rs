//! The per-route dispatch pipeline.
//!
//! ```text
//! resolve arguments -> before hooks -> handler -> after hooks -> encode
//!        \________________\_____________\__________\
//!                          first matching error handler -> encode
//! ```

use std::sync::Arc;

use meridian_core::{
    encode, Context, DispatchError, DispatchRequest, DispatchResult, Encoded, KindRegistry, Reply,
};
use meridian_middleware::{run_after_hooks, run_before_hooks, select_handler};
use tracing::Instrument;

use crate::route::CompiledRoute;

impl CompiledRoute {
    /// Dispatches `request` through this route.
    ///
    /// Failures from argument resolution, hooks and the handler are offered
    /// once to the route's effective error handlers; the first handler whose
    /// kind is the raised kind or one of its ancestors produces the reply.
    /// Unmatched failures, and failures of the error handler itself, are
    /// returned to the caller, except immediate-response signals: their reply
    /// is encoded here like any other, in the request's presentation mode.
    pub async fn dispatch(
        &self,
        request: Arc<DispatchRequest>,
        kinds: &KindRegistry,
        default_mode: &str,
    ) -> DispatchResult<Encoded> {
        let mut ctx = Context::new(request, Arc::clone(self.info()));
        let span = tracing::debug_span!(
            "dispatch",
            request_id = %ctx.request_id(),
            http.method = %self.method(),
            http.route = %self.name(),
        );

        async move {
            let reply = match self.run(&mut ctx).await {
                Ok(reply) => reply,
                Err(error) => match self.recover(error, kinds, &mut ctx).await {
                    Ok(reply) => reply,
                    Err(DispatchError::Respond(reply)) => *reply,
                    Err(error) => return Err(error),
                },
            };
            let mode = ctx.effective_presentation_mode(default_mode);
            tracing::debug!(mode, "encoding reply");
            Ok(encode(&reply, mode))
        }
        .instrument(span)
        .await
    }

    async fn run(&self, ctx: &mut Context) -> DispatchResult<Reply> {
        let mut args = self.plan().resolve(ctx.request()).await?;
        tracing::trace!(args = ?args, "arguments resolved");

        run_before_hooks(self.services(), ctx).await?;

        args.merge(ctx.take_injected());
        args.retain_declared(self.handler().params());
        let reply = self.handler().call(ctx, args).await?;

        run_after_hooks(self.services(), ctx, reply).await
    }

    async fn recover(
        &self,
        error: DispatchError,
        kinds: &KindRegistry,
        ctx: &mut Context,
    ) -> DispatchResult<Reply> {
        let kind = error.kind();
        match select_handler(self.error_handlers(), kinds, &kind) {
            Some(handler) => {
                tracing::debug!(error.kind = %kind, handler = %handler.kind(), "error handled");
                handler.handle(error, ctx).await
            }
            None => {
                if !matches!(error, DispatchError::Respond(_)) {
                    tracing::warn!(error.kind = %kind, error = %error, "unhandled dispatch error");
                }
                Err(error)
            }
        }
    }
}
