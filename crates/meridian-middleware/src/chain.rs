//! Sequential execution of service hooks.

use std::sync::Arc;

use meridian_core::{Context, DispatchResult, Reply};

use crate::service::Service;

/// Runs every before hook in order, stopping at the first failure.
pub async fn run_before_hooks(services: &[Arc<Service>], ctx: &mut Context) -> DispatchResult<()> {
    for service in services.iter().filter(|s| s.has_before()) {
        tracing::debug!(service = %service.name(), "before hook");
        service.run_before(ctx).await?;
    }
    Ok(())
}

/// Runs every after hook in order and returns the final reply.
///
/// Each hook sees the reply as replaced by the hooks before it.
pub async fn run_after_hooks(
    services: &[Arc<Service>],
    ctx: &mut Context,
    reply: Reply,
) -> DispatchResult<Reply> {
    let mut current = reply;
    for service in services.iter().filter(|s| s.has_after()) {
        tracing::debug!(service = %service.name(), "after hook");
        let replacement = service.run_after(ctx, &current).await?;
        if let Some(next) = replacement {
            tracing::trace!(service = %service.name(), "reply replaced");
            current = next;
        }
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use meridian_core::{ApiError, DispatchRequest, RouteInfo};
    use serde_json::{json, Value};

    fn context() -> Context {
        let request = DispatchRequest::new(Method::GET, "/".parse().unwrap());
        Context::new(Arc::new(request), Arc::new(RouteInfo::new(Method::GET, "/")))
    }

    fn appender(name: &str, marker: &'static str) -> Arc<Service> {
        Arc::new(Service::new(name).after(move |_ctx, reply| {
            Box::pin(async move {
                let mut seen = reply.as_json().cloned().unwrap_or(Value::Null);
                if let Some(items) = seen.as_array_mut() {
                    items.push(json!(marker));
                }
                Ok(Some(Reply::Json(seen)))
            })
        }))
    }

    #[tokio::test]
    async fn test_after_hooks_observe_replacements() {
        let services = vec![appender("a", "first"), appender("b", "second")];
        let mut ctx = context();

        let reply = run_after_hooks(&services, &mut ctx, Reply::Json(json!([])))
            .await
            .unwrap();
        assert_eq!(reply.as_json(), Some(&json!(["first", "second"])));
    }

    #[tokio::test]
    async fn test_after_hook_none_keeps_reply() {
        let passive = Arc::new(Service::new("passive").after(|_ctx, _reply| {
            Box::pin(async move { Ok(None) })
        }));
        let mut ctx = context();

        let reply = run_after_hooks(&[passive], &mut ctx, Reply::Json(json!(1)))
            .await
            .unwrap();
        assert_eq!(reply.as_json(), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_before_hooks_run_in_order_and_stop_on_failure() {
        let record = |name: &'static str| {
            Arc::new(Service::new(name).before(move |ctx| {
                Box::pin(async move {
                    let mut trail = ctx.state_value("trail").cloned().unwrap_or(json!([]));
                    if let Some(items) = trail.as_array_mut() {
                        items.push(json!(name));
                    }
                    ctx.set_state("trail", trail);
                    Ok(())
                })
            }))
        };
        let deny = Arc::new(Service::new("deny").before(|_ctx| {
            Box::pin(async move { Err(ApiError::bad_request("denied", "no").into()) })
        }));

        let mut ctx = context();
        let services = vec![record("one"), record("two"), deny, record("three")];
        let err = run_before_hooks(&services, &mut ctx).await.unwrap_err();

        assert_eq!(err.as_api().map(ApiError::code), Some("denied"));
        assert_eq!(ctx.state_value("trail"), Some(&json!(["one", "two"])));
    }
}
