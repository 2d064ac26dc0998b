//! View state — the generation panel's presentation state machine.
//!
//! DESIGN
//! ======
//! `ViewState::apply` is a pure transition function over `ViewEvent`s
//! emitted by the coordinator. `ViewStateMachine` owns the current value
//! and publishes every committed transition on a `watch` channel, so the
//! presentation layer only ever reads snapshots.
//!
//! ```text
//! Idle ──Submit──▶ Submitting ──Resolved(Ok)──▶ Success
//!   ▲                  │                           │
//!   │                  └──Resolved(Err)──▶ Failed  │
//!   └── Detach (any)   Submit from Success/Failed re-enters Submitting
//! ```

use tokio::sync::watch;

use crate::model::{GenerationRequest, GenerationResult};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Idle,
    Submitting(GenerationRequest),
    Success(GenerationResult),
    Failed(String),
}

/// Events the coordinator feeds into the machine.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Submit(GenerationRequest),
    Resolved(Result<GenerationResult, String>),
    /// Show a result that did not come from a live submission (opening a
    /// history entry).
    Inspect(GenerationResult),
    /// The owning panel was torn down; back to the initial state.
    Detach,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
#[error("cannot apply {event} while {state}")]
pub struct InvalidTransition {
    pub state: &'static str,
    pub event: &'static str,
}

impl ViewState {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Submitting(_) => "submitting",
            Self::Success(_) => "success",
            Self::Failed(_) => "failed",
        }
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting(_))
    }

    /// Compute the next state.
    ///
    /// # Errors
    ///
    /// `Submit` and `Inspect` are rejected while submitting; `Resolved` is
    /// only accepted while submitting. `Detach` is always accepted.
    pub fn apply(&self, event: ViewEvent) -> Result<Self, InvalidTransition> {
        match (self, event) {
            (_, ViewEvent::Detach) => Ok(Self::Idle),
            (Self::Submitting(_), ViewEvent::Resolved(Ok(result))) => Ok(Self::Success(result)),
            (Self::Submitting(_), ViewEvent::Resolved(Err(message))) => Ok(Self::Failed(message)),
            (Self::Submitting(_), event) => Err(InvalidTransition { state: self.name(), event: event.name() }),
            (_, ViewEvent::Submit(request)) => Ok(Self::Submitting(request)),
            (_, ViewEvent::Inspect(result)) => Ok(Self::Success(result)),
            (_, event @ ViewEvent::Resolved(_)) => {
                Err(InvalidTransition { state: self.name(), event: event.name() })
            }
        }
    }
}

impl ViewEvent {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submit(_) => "submit",
            Self::Resolved(_) => "resolved",
            Self::Inspect(_) => "inspect",
            Self::Detach => "detach",
        }
    }
}

// =============================================================================
// MACHINE
// =============================================================================

/// Holds the current `ViewState` and publishes each transition.
pub struct ViewStateMachine {
    tx: watch::Sender<ViewState>,
}

impl ViewStateMachine {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ViewState::Idle);
        Self { tx }
    }

    #[must_use]
    pub fn current(&self) -> ViewState {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.tx.subscribe()
    }

    /// Apply an event and publish the result.
    ///
    /// # Errors
    ///
    /// Returns the rejected transition; the current state is left as is.
    pub fn dispatch(&self, event: ViewEvent) -> Result<(), InvalidTransition> {
        let mut outcome = Ok(());
        self.tx.send_if_modified(|state| match state.apply(event) {
            Ok(next) => {
                tracing::debug!(from = state.name(), to = next.name(), "view transition");
                *state = next;
                true
            }
            Err(e) => {
                outcome = Err(e);
                false
            }
        });
        outcome
    }
}

impl Default for ViewStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "view_state_test.rs"]
mod tests;
