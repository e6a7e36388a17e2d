//! Scoped ownership of the shared context.

use crate::error::{LifespanError, LifespanResult};
use crate::lifespan::{Lifecycle, LifecycleState, Lifespan};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Owns the shared context for one server run and guarantees the finalizer runs once.
///
/// [`release`](Self::release) runs the finalizer explicitly. If the guard is dropped
/// without being released (the serving future panicked or was cancelled), the finalizer
/// is spawned on the current Tokio runtime instead. Either way the lifecycle ends in
/// `Stopped`.
pub struct LifespanGuard<L: Lifespan> {
    lifespan: Arc<L>,
    lifecycle: Arc<Lifecycle>,
    context: Arc<L::Context>,
    released: bool,
}

impl<L: Lifespan> LifespanGuard<L> {
    /// Run the startup hook and wrap its result as the shared context.
    ///
    /// Moves `lifecycle` to `Initializing`, and to `Stopped` if startup fails.
    pub async fn acquire(lifespan: Arc<L>, lifecycle: Arc<Lifecycle>) -> LifespanResult<Self> {
        lifecycle.transition(LifecycleState::Initializing)?;

        match lifespan.startup().await {
            Ok(context) => {
                info!("Lifespan resources acquired");
                Ok(Self {
                    lifespan,
                    lifecycle,
                    context: Arc::new(context),
                    released: false,
                })
            }
            Err(e) => {
                error!("Lifespan startup failed: {}", e);
                lifecycle.transition(LifecycleState::Stopped)?;
                Err(match e {
                    LifespanError::Shutdown(msg) => LifespanError::Startup(msg),
                    other => other,
                })
            }
        }
    }

    /// The shared context. Every call returns the same allocation.
    pub fn context(&self) -> Arc<L::Context> {
        Arc::clone(&self.context)
    }

    /// Run the shutdown hook, moving the lifecycle through `ShuttingDown` to `Stopped`.
    ///
    /// A failing hook is reported as [`LifespanError::Shutdown`]; the lifecycle still
    /// reaches `Stopped`.
    pub async fn release(mut self) -> LifespanResult<()> {
        self.released = true;
        let outstanding = Arc::strong_count(&self.context) - 1;
        if outstanding > 0 {
            warn!(
                "Releasing lifespan resources with {} outstanding context references",
                outstanding
            );
        }

        finalize(&*self.lifespan, &self.lifecycle, &self.context).await
    }
}

async fn finalize<L: Lifespan>(
    lifespan: &L,
    lifecycle: &Lifecycle,
    context: &L::Context,
) -> LifespanResult<()> {
    if lifecycle.state() == LifecycleState::Running {
        advance(lifecycle, LifecycleState::ShuttingDown);
    }

    let result = match lifespan.shutdown(context).await {
        Ok(()) => {
            info!("Lifespan resources released");
            Ok(())
        }
        Err(e) => {
            error!("Lifespan shutdown failed: {}", e);
            Err(match e {
                LifespanError::Startup(msg) => LifespanError::Shutdown(msg),
                other => other,
            })
        }
    };

    advance(lifecycle, LifecycleState::Stopped);
    result
}

fn advance(lifecycle: &Lifecycle, next: LifecycleState) {
    if let Err(e) = lifecycle.transition(next) {
        warn!("{}", e);
    }
}

impl<L: Lifespan> Drop for LifespanGuard<L> {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        warn!("Lifespan guard dropped without release, scheduling shutdown");
        let lifespan = Arc::clone(&self.lifespan);
        let lifecycle = Arc::clone(&self.lifecycle);
        let context = Arc::clone(&self.context);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    // Failures are already logged by finalize.
                    let _ = finalize(&*lifespan, &lifecycle, &context).await;
                });
            }
            Err(_) => error!("No runtime available, lifespan resources were not released"),
        }
    }
}
