//! Lifespan management: startup/shutdown hooks bracketing the serving loop.
//!
//! A [`Lifespan`] acquires long-lived resources once before the first request and
//! releases them once after the last. The value returned by [`Lifespan::startup`] becomes
//! the shared context every handler reads through
//! [`RequestContext::lifespan_context`](crate::context::RequestContext::lifespan_context).

pub mod guard;
pub mod state;

pub use guard::LifespanGuard;
pub use state::{Lifecycle, LifecycleState};

use crate::error::LifespanResult;
use async_trait::async_trait;

/// Startup and shutdown hooks for the resources shared by all handlers.
#[async_trait]
pub trait Lifespan: Send + Sync + 'static {
    /// Bundle of resources handed to every request.
    type Context: Send + Sync + 'static;

    /// Acquire resources. Called exactly once, before any request is read.
    ///
    /// # Errors
    ///
    /// Returns [`LifespanError::Startup`](crate::error::LifespanError::Startup) when a
    /// resource cannot be acquired; the server then stops without serving.
    async fn startup(&self) -> LifespanResult<Self::Context>;

    /// Release resources. Called exactly once, after in-flight requests have completed.
    ///
    /// # Errors
    ///
    /// Returns [`LifespanError::Shutdown`](crate::error::LifespanError::Shutdown) when a
    /// resource is not released cleanly. The failure is reported, not retried.
    async fn shutdown(&self, context: &Self::Context) -> LifespanResult<()>;
}

/// A lifespan with no resources.
#[async_trait]
impl Lifespan for () {
    type Context = ();

    async fn startup(&self) -> LifespanResult<()> {
        Ok(())
    }

    async fn shutdown(&self, _context: &()) -> LifespanResult<()> {
        Ok(())
    }
}
