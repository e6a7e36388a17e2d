//! Lifecycle state machine for a single server run.

use crate::error::{LifespanError, LifespanResult};
use parking_lot::Mutex;
use std::fmt;
use tokio::sync::watch;
use tracing::info;

/// Lifecycle state of a server run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Server built, lifespan not entered.
    NotStarted,
    /// Resource initializer is running.
    Initializing,
    /// Shared context exists and requests are being served.
    Running,
    /// Serving loop exited, in-flight requests drain and the finalizer runs.
    ShuttingDown,
    /// Terminal.
    Stopped,
}

impl LifecycleState {
    /// Whether `self -> next` is an edge of the state machine.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (NotStarted, Initializing)
                | (Initializing, Running)
                | (Initializing, Stopped)
                | (Running, ShuttingDown)
                | (ShuttingDown, Stopped)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == LifecycleState::Stopped
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "NotStarted",
            Self::Initializing => "Initializing",
            Self::Running => "Running",
            Self::ShuttingDown => "ShuttingDown",
            Self::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

/// Tracks the current state and every transition taken during the run.
pub struct Lifecycle {
    state: watch::Sender<LifecycleState>,
    history: Mutex<Vec<LifecycleState>>,
}

impl Lifecycle {
    pub fn new() -> Self {
        let (state, _) = watch::channel(LifecycleState::NotStarted);
        Self {
            state,
            history: Mutex::new(vec![LifecycleState::NotStarted]),
        }
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// All states visited so far, oldest first.
    pub fn history(&self) -> Vec<LifecycleState> {
        self.history.lock().clone()
    }

    /// Move to `next`, rejecting edges the state machine does not have.
    pub fn transition(&self, next: LifecycleState) -> LifespanResult<()> {
        let mut rejected = None;
        // Hold the history lock across the update so the trace order matches.
        let mut history = self.history.lock();
        self.state.send_if_modified(|current| {
            if current.can_transition_to(next) {
                *current = next;
                true
            } else {
                rejected = Some(*current);
                false
            }
        });

        if let Some(from) = rejected {
            return Err(LifespanError::InvalidTransition { from, to: next });
        }

        history.push(next);
        info!(state = %next, "Lifecycle transition");
        Ok(())
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
