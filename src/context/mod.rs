//! Per-request execution context.
//!
//! Every request runs inside a task-local scope carrying the request id, the session and
//! the shared lifespan context. Handlers receive a [`RequestContext`] explicitly; code
//! further down the call chain can recover it with [`RequestContext::current`] or
//! [`lifespan_context`]. Outside a request scope both return
//! [`ContextError::OutsideRequest`].

use crate::error::ContextError;
use crate::protocol::types::{JsonRpcRequest, RequestId};
use std::any::{Any, type_name};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

tokio::task_local! {
    static REQUEST_SCOPE: RequestScope;
}

/// Type-erased form of [`RequestContext`] stored in the task-local.
#[derive(Clone)]
struct RequestScope {
    request_id: Option<RequestId>,
    method: String,
    session: Arc<dyn Any + Send + Sync>,
    lifespan_context: Arc<dyn Any + Send + Sync>,
}

/// Context handed to handlers, generic over the session type `S` and the lifespan
/// context type `C`.
pub struct RequestContext<S, C> {
    request_id: Option<RequestId>,
    method: String,
    session: Arc<S>,
    lifespan_context: Arc<C>,
}

impl<S, C> RequestContext<S, C>
where
    S: Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    pub fn new(request: &JsonRpcRequest, session: Arc<S>, lifespan_context: Arc<C>) -> Self {
        Self {
            request_id: request.id.clone(),
            method: request.method.clone(),
            session,
            lifespan_context,
        }
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    /// Resources acquired at startup.
    pub fn lifespan_context(&self) -> &C {
        &self.lifespan_context
    }

    /// Shared handle to the lifespan context.
    pub fn shared_context(&self) -> &Arc<C> {
        &self.lifespan_context
    }

    /// Run `future` with this context installed as the active request.
    pub async fn scope<F: Future>(&self, future: F) -> F::Output {
        let scope = RequestScope {
            request_id: self.request_id.clone(),
            method: self.method.clone(),
            session: Arc::clone(&self.session) as Arc<dyn Any + Send + Sync>,
            lifespan_context: Arc::clone(&self.lifespan_context) as Arc<dyn Any + Send + Sync>,
        };
        REQUEST_SCOPE.scope(scope, future).await
    }

    /// The context of the request currently executing on this task.
    ///
    /// # Errors
    ///
    /// [`ContextError::OutsideRequest`] when no request is active,
    /// [`ContextError::TypeMismatch`] when `S` or `C` differ from the active request's.
    pub fn current() -> Result<Self, ContextError> {
        let scope = REQUEST_SCOPE
            .try_with(RequestScope::clone)
            .map_err(|_| ContextError::OutsideRequest)?;

        let session = scope
            .session
            .downcast::<S>()
            .map_err(|_| ContextError::TypeMismatch {
                expected: type_name::<S>(),
            })?;
        let lifespan_context =
            scope
                .lifespan_context
                .downcast::<C>()
                .map_err(|_| ContextError::TypeMismatch {
                    expected: type_name::<C>(),
                })?;

        Ok(Self {
            request_id: scope.request_id,
            method: scope.method,
            session,
            lifespan_context,
        })
    }
}

impl<S, C> Clone for RequestContext<S, C> {
    fn clone(&self) -> Self {
        Self {
            request_id: self.request_id.clone(),
            method: self.method.clone(),
            session: Arc::clone(&self.session),
            lifespan_context: Arc::clone(&self.lifespan_context),
        }
    }
}

impl<S, C> fmt::Debug for RequestContext<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

/// Lifespan context of the active request.
///
/// # Errors
///
/// Same as [`RequestContext::current`].
pub fn lifespan_context<C: Send + Sync + 'static>() -> Result<Arc<C>, ContextError> {
    let scope = REQUEST_SCOPE
        .try_with(RequestScope::clone)
        .map_err(|_| ContextError::OutsideRequest)?;

    scope
        .lifespan_context
        .downcast::<C>()
        .map_err(|_| ContextError::TypeMismatch {
            expected: type_name::<C>(),
        })
}

/// Whether the current task is executing a request.
pub fn in_request() -> bool {
    REQUEST_SCOPE.try_with(|_| ()).is_ok()
}
