//! Panels — what the dashboard shell mounts behind each tab.
//!
//! DESIGN
//! ======
//! `ContentPanel` is the only stateful panel. It owns one coordinator and
//! one history store for as long as it is mounted, issues a history
//! refresh on mount, and tears both down on unmount so late responses are
//! dropped.
//!
//! The insight panels hold nothing but a service handle. Each `load()` is
//! a one-shot fetch with no caching; the caller renders whatever comes
//! back.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::api::types::{
    AbTestingReport, DEFAULT_SLACK_TEST_MESSAGE, HistoryQuery, MetricsReport, SentimentReport, SlackAck,
};
use crate::api::{ApiError, ContentService, InsightsService};
use crate::coordinator::{GenerationCoordinator, SubmitError};
use crate::history::{HistoryFetchError, HistoryStore, PendingEntry, RefreshOutcome};
use crate::model::{GenerationRequest, GenerationResult};
use crate::view_state::InvalidTransition;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PanelError {
    #[error("no completed generation to show")]
    NothingToInspect,
    #[error("no history entry with id {0}")]
    UnknownEntry(Uuid),
    #[error(transparent)]
    Transition(#[from] InvalidTransition),
}

// =============================================================================
// CONTENT PANEL
// =============================================================================

pub struct ContentPanel {
    coordinator: GenerationCoordinator,
    latest: Mutex<Option<(GenerationRequest, GenerationResult)>>,
    mount_refresh: Mutex<Option<JoinHandle<()>>>,
}

impl ContentPanel {
    /// Build the panel and start the initial history fetch.
    #[must_use]
    pub fn mount(api: Arc<dyn ContentService>, query: HistoryQuery) -> Self {
        let history = HistoryStore::with_query(api.clone(), query);
        let initial = history.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = initial.refresh().await {
                tracing::warn!(error = %e, "initial history fetch failed");
            }
        });
        tracing::debug!("content panel mounted");
        Self {
            coordinator: GenerationCoordinator::new(api, history),
            latest: Mutex::new(None),
            mount_refresh: Mutex::new(Some(handle)),
        }
    }

    #[must_use]
    pub fn coordinator(&self) -> &GenerationCoordinator {
        &self.coordinator
    }

    #[must_use]
    pub fn history(&self) -> &HistoryStore {
        self.coordinator.history()
    }

    /// Submit a generation. Remembers the request and result on success;
    /// forgets any earlier success once an accepted submission fails.
    ///
    /// # Errors
    ///
    /// See [`GenerationCoordinator::submit`].
    pub async fn submit(&self, request: GenerationRequest) -> Result<GenerationResult, SubmitError> {
        match self.coordinator.submit(request.clone()).await {
            Ok(result) => {
                *self.lock_latest() = Some((request, result.clone()));
                Ok(result)
            }
            Err(e @ (SubmitError::Api(_) | SubmitError::Discarded)) => {
                *self.lock_latest() = None;
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// # Errors
    ///
    /// Returns the fetch error when this refresh was the newest and failed.
    pub async fn refresh(&self) -> Result<RefreshOutcome, HistoryFetchError> {
        self.history().refresh().await
    }

    /// Put the latest successful generation in front of the history list
    /// until the next refresh confirms it.
    ///
    /// # Errors
    ///
    /// `NothingToInspect` when the last accepted submission did not succeed
    /// or one is still in flight.
    pub fn inspect_latest(&self) -> Result<PendingEntry, PanelError> {
        if self.coordinator.is_in_flight() {
            return Err(PanelError::NothingToInspect);
        }
        let latest = self.lock_latest();
        let (request, result) = latest.as_ref().ok_or(PanelError::NothingToInspect)?;
        let entry = PendingEntry::from_generation(request, result);
        self.history().append_optimistic(entry.clone());
        Ok(entry)
    }

    /// Show a confirmed history entry in the result view.
    ///
    /// # Errors
    ///
    /// `UnknownEntry` when the id is not in the current list; `Transition`
    /// while a submission is in flight.
    pub fn inspect_entry(&self, id: Uuid) -> Result<GenerationResult, PanelError> {
        let snapshot = self.history().snapshot();
        let entry = snapshot.find(id).ok_or(PanelError::UnknownEntry(id))?;
        let result = GenerationResult::from_history(entry);
        self.coordinator.inspect(result.clone())?;
        Ok(result)
    }

    /// Wait for the fetch issued on mount.
    pub async fn await_mounted(&self) {
        let handle = self
            .mount_refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "initial history fetch ended abnormally");
            }
        }
    }

    /// Drop every outstanding response. The panel must not be used again.
    pub fn unmount(&self) {
        self.coordinator.teardown();
        self.history().teardown();
        tracing::debug!("content panel unmounted");
    }

    fn lock_latest(&self) -> std::sync::MutexGuard<'_, Option<(GenerationRequest, GenerationResult)>> {
        self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// =============================================================================
// INSIGHT PANELS
// =============================================================================

#[derive(Clone)]
pub struct SentimentPanel {
    api: Arc<dyn InsightsService>,
}

impl SentimentPanel {
    #[must_use]
    pub fn new(api: Arc<dyn InsightsService>) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Any transport or remote error from the service.
    pub async fn load(&self) -> Result<SentimentReport, ApiError> {
        self.api.sentiment().await
    }
}

#[derive(Clone)]
pub struct MetricsPanel {
    api: Arc<dyn InsightsService>,
}

impl MetricsPanel {
    #[must_use]
    pub fn new(api: Arc<dyn InsightsService>) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Any transport or remote error from the service.
    pub async fn load(&self) -> Result<MetricsReport, ApiError> {
        self.api.metrics().await
    }

    /// # Errors
    ///
    /// Any transport or remote error from the service.
    pub async fn send_report(&self) -> Result<SlackAck, ApiError> {
        self.api.send_slack_report().await
    }

    /// Send a Slack test message; blank input falls back to the default.
    ///
    /// # Errors
    ///
    /// Any transport or remote error from the service.
    pub async fn send_test(&self, message: Option<&str>) -> Result<SlackAck, ApiError> {
        let message = message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_SLACK_TEST_MESSAGE);
        self.api.send_slack_test(message).await
    }
}

#[derive(Clone)]
pub struct AbTestingPanel {
    api: Arc<dyn InsightsService>,
}

impl AbTestingPanel {
    #[must_use]
    pub fn new(api: Arc<dyn InsightsService>) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Any transport or remote error from the service.
    pub async fn load(&self) -> Result<AbTestingReport, ApiError> {
        self.api.ab_testing().await
    }
}

#[cfg(test)]
#[path = "panels_test.rs"]
mod tests;
