//! Context propagation helpers for request and application spans.
//!
//! # Design
//! - The request id and matched route live in a task-local scoped to the handler future.
//! - An application-level span carries service name and build SHA for the whole process.

use std::future::Future;
use std::sync::Arc;

use tracing::{Span, span::Entered};

use crate::init::build_sha;

/// Guard that keeps the application-level span entered for the lifetime of the process.
pub struct GlobalContextGuard {
    _guard: Entered<'static>,
}

impl GlobalContextGuard {
    #[must_use]
    /// Enter the application-level tracing span for the lifetime of the guard.
    pub fn new(service: impl Into<String>) -> Self {
        let service = service.into();
        let span: &'static Span = Box::leak(Box::new(
            tracing::info_span!("app", service = %service, build_sha = %build_sha()),
        ));
        let guard = span.enter();
        Self { _guard: guard }
    }
}

/// Identifiers of the request currently being served.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Arc<str>,
    route: Arc<str>,
}

impl RequestContext {
    /// Context of the active request; `None` outside [`with_request_context`].
    #[must_use]
    pub fn current() -> Option<Self> {
        ACTIVE_REQUEST.try_with(Clone::clone).ok()
    }

    /// Value of the `x-request-id` header; empty when the request carried none.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Matched route template, or the raw path when no route matched.
    #[must_use]
    pub fn route(&self) -> &str {
        &self.route
    }
}

/// Run `fut` with a [`RequestContext`] visible to everything it awaits.
pub async fn with_request_context<Fut, T>(
    request_id: impl Into<String>,
    route: impl Into<String>,
    fut: Fut,
) -> T
where
    Fut: Future<Output = T>,
{
    let context = RequestContext {
        request_id: Arc::from(request_id.into()),
        route: Arc::from(route.into()),
    };
    ACTIVE_REQUEST.scope(context, fut).await
}

tokio::task_local! {
    static ACTIVE_REQUEST: RequestContext;
}
