//! Generation coordinator — owns the single in-flight generation request.
//!
//! DESIGN
//! ======
//! One mutex guards `{next_seq, active}`. Accepting a submission
//! (check nothing is active, record it, move the view to `Submitting`) is
//! one critical section; resolving it (check the seq still matches, clear
//! it, move the view to `Success`/`Failed`) is another. The lock is never
//! held across the remote call.
//!
//! On success a history refresh is spawned only after the `Success`
//! transition is committed. Its failure stays in the history store and
//! never touches the view state.
//!
//! `teardown()` forgets the active request and detaches the view. A
//! response that arrives afterwards no longer matches and is dropped
//! without any state change.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::types::GenerateBody;
use crate::api::{ApiError, ContentService};
use crate::history::HistoryStore;
use crate::model::{GenerationRequest, GenerationResult, ValidationError};
use crate::view_state::{InvalidTransition, ViewEvent, ViewState, ViewStateMachine};

// =============================================================================
// ERROR TYPE
// =============================================================================

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
    #[error("a generation is already in flight")]
    ConcurrentSubmission,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("response discarded: panel was closed while the request was in flight")]
    Discarded,
}

// =============================================================================
// COORDINATOR
// =============================================================================

pub struct GenerationCoordinator {
    api: Arc<dyn ContentService>,
    history: HistoryStore,
    view: ViewStateMachine,
    flight: Mutex<Flight>,
    refresh: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Default)]
struct Flight {
    next_seq: u64,
    active: Option<Active>,
}

struct Active {
    seq: u64,
    request: GenerationRequest,
}

impl GenerationCoordinator {
    #[must_use]
    pub fn new(api: Arc<dyn ContentService>, history: HistoryStore) -> Self {
        Self {
            api,
            history,
            view: ViewStateMachine::new(),
            flight: Mutex::new(Flight::default()),
            refresh: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn view(&self) -> ViewState {
        self.view.current()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view.subscribe()
    }

    #[must_use]
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.lock_flight().active.is_some()
    }

    /// The request currently in flight, if any.
    #[must_use]
    pub fn in_flight(&self) -> Option<GenerationRequest> {
        self.lock_flight()
            .active
            .as_ref()
            .map(|a| a.request.clone())
    }

    /// Validate and run one generation.
    ///
    /// # Errors
    ///
    /// - `Validation` / `ConcurrentSubmission`: rejected before any network
    ///   call; view state unchanged.
    /// - `Api`: the call failed; view state is `Failed`.
    /// - `Discarded`: `teardown()` ran while the call was in flight.
    pub async fn submit(&self, request: GenerationRequest) -> Result<GenerationResult, SubmitError> {
        request.validate()?;
        let seq = self.accept(&request)?;
        tracing::info!(seq, topic = request.topic(), platform = %request.platform(), "generation submitted");

        let body = GenerateBody::single(&request);
        let response = self.api.generate(&body).await;

        self.resolve(seq, &response)?;
        match response {
            Ok(result) => {
                tracing::info!(seq, score = ?result.quality_score, "generation completed");
                self.spawn_refresh();
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(seq, error = %e, "generation failed");
                Err(SubmitError::Api(e))
            }
        }
    }

    /// Show a past result (e.g. from a history entry).
    ///
    /// # Errors
    ///
    /// Rejected while a submission is in flight.
    pub fn inspect(&self, result: GenerationResult) -> Result<(), InvalidTransition> {
        let _flight = self.lock_flight();
        self.view.dispatch(ViewEvent::Inspect(result))
    }

    /// Wait for the history refresh spawned by the last successful
    /// submission, if it is still running.
    pub async fn await_refresh(&self) {
        let handle = self
            .refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "history refresh task ended abnormally");
            }
        }
    }

    /// Forget the in-flight request so its response is discarded, and put
    /// the view back in its initial state.
    pub fn teardown(&self) {
        let mut flight = self.lock_flight();
        if let Some(active) = flight.active.take() {
            tracing::debug!(seq = active.seq, "in-flight generation abandoned");
        }
        if let Err(e) = self.view.dispatch(ViewEvent::Detach) {
            tracing::warn!(error = %e, "view detach rejected");
        }
    }

    fn accept(&self, request: &GenerationRequest) -> Result<u64, SubmitError> {
        let mut flight = self.lock_flight();
        if flight.active.is_some() {
            tracing::debug!("submission rejected: generation already in flight");
            return Err(SubmitError::ConcurrentSubmission);
        }
        self.view
            .dispatch(ViewEvent::Submit(request.clone()))
            .map_err(|_| SubmitError::ConcurrentSubmission)?;
        flight.next_seq += 1;
        let seq = flight.next_seq;
        flight.active = Some(Active { seq, request: request.clone() });
        Ok(seq)
    }

    fn resolve(&self, seq: u64, response: &Result<GenerationResult, ApiError>) -> Result<(), SubmitError> {
        let mut flight = self.lock_flight();
        if flight.active.as_ref().map(|a| a.seq) != Some(seq) {
            tracing::debug!(seq, "stale generation response discarded");
            return Err(SubmitError::Discarded);
        }
        flight.active = None;
        let event = ViewEvent::Resolved(response.clone().map_err(|e| e.to_string()));
        if let Err(e) = self.view.dispatch(event) {
            tracing::warn!(seq, error = %e, "view transition rejected");
        }
        Ok(())
    }

    fn spawn_refresh(&self) {
        let history = self.history.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = history.refresh().await {
                tracing::warn!(error = %e, "post-generation history refresh failed");
            }
        });
        let previous = self
            .refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        drop(previous);
    }

    fn lock_flight(&self) -> std::sync::MutexGuard<'_, Flight> {
        self.flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod tests;
