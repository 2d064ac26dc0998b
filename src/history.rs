//! History store — the authoritative list of past generations.
//!
//! DESIGN
//! ======
//! `refresh()` replaces the whole collection or keeps the old one; there is
//! no partial merge. Every refresh takes a sequence number when issued and
//! its response is applied only if that number is higher than the last
//! settled one (applied or failed), so an older response that lands late
//! is dropped no matter the completion order. `teardown()` raises a floor under which every
//! outstanding response is treated as stale.
//!
//! A single optimistic `PendingEntry` may sit in front of the list until
//! the next successful refresh. It is a different type from `HistoryEntry`
//! and never enters the authoritative collection.
//!
//! Snapshots are published on a `watch` channel after every change.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use time::OffsetDateTime;
use tokio::sync::watch;
use uuid::Uuid;

use crate::api::types::HistoryQuery;
use crate::api::{ApiError, ContentService};
use crate::model::{GenerationRequest, GenerationResult, HistoryEntry, Platform};

// =============================================================================
// TYPES
// =============================================================================

/// Non-fatal history refresh failure. The previous collection is kept.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("history fetch failed: {message}")]
pub struct HistoryFetchError {
    pub status: Option<u16>,
    pub message: String,
}

impl From<ApiError> for HistoryFetchError {
    fn from(err: ApiError) -> Self {
        Self { status: err.status(), message: err.to_string() }
    }
}

/// Client-only placeholder for a just-completed generation.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEntry {
    pub content_id: Option<Uuid>,
    pub platform: Platform,
    pub topic: String,
    pub final_content: String,
    pub quality_score: Option<f64>,
    pub observed_at: OffsetDateTime,
}

impl PendingEntry {
    #[must_use]
    pub fn from_generation(request: &GenerationRequest, result: &GenerationResult) -> Self {
        Self {
            content_id: result.content_id,
            platform: request.platform(),
            topic: request.topic().to_owned(),
            final_content: result.final_content.clone().unwrap_or_default(),
            quality_score: result.quality_score,
            observed_at: OffsetDateTime::now_utc(),
        }
    }
}

/// One rendered row: the optimistic entry is tagged apart from server rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HistoryRow<'a> {
    Pending(&'a PendingEntry),
    Confirmed(&'a HistoryEntry),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistorySnapshot {
    pub entries: Arc<[HistoryEntry]>,
    pub pending: Option<PendingEntry>,
    pub error: Option<HistoryFetchError>,
    /// True while a non-stale refresh is outstanding.
    pub loading: bool,
}

impl HistorySnapshot {
    /// Rows in display order. The pending entry is skipped when the server
    /// list already holds the same content id.
    #[must_use]
    pub fn rows(&self) -> Vec<HistoryRow<'_>> {
        let mut rows = Vec::with_capacity(self.entries.len() + 1);
        if let Some(pending) = &self.pending {
            let confirmed = pending
                .content_id
                .is_some_and(|id| self.entries.iter().any(|e| e.id == id));
            if !confirmed {
                rows.push(HistoryRow::Pending(pending));
            }
        }
        rows.extend(self.entries.iter().map(HistoryRow::Confirmed));
        rows
    }

    #[must_use]
    pub fn find(&self, id: Uuid) -> Option<&HistoryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied { count: usize },
    /// A newer refresh settled first, or the store was torn down.
    Stale,
}

// =============================================================================
// STORE
// =============================================================================

#[derive(Clone)]
pub struct HistoryStore {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn ContentService>,
    query: HistoryQuery,
    ledger: Mutex<Ledger>,
    tx: watch::Sender<HistorySnapshot>,
}

#[derive(Default)]
struct Ledger {
    snapshot: HistorySnapshot,
    /// Last issued sequence number.
    issued: u64,
    /// Highest sequence number that completed without being stale,
    /// whether it succeeded or failed.
    settled: u64,
    /// Responses at or below this number are stale.
    floor: u64,
    outstanding: BTreeSet<u64>,
}

impl Ledger {
    fn is_stale(&self, seq: u64) -> bool {
        seq <= self.settled || seq <= self.floor
    }
}

impl HistoryStore {
    #[must_use]
    pub fn new(api: Arc<dyn ContentService>) -> Self {
        Self::with_query(api, HistoryQuery::default())
    }

    #[must_use]
    pub fn with_query(api: Arc<dyn ContentService>, query: HistoryQuery) -> Self {
        let (tx, _rx) = watch::channel(HistorySnapshot::default());
        Self { inner: Arc::new(Inner { api, query, ledger: Mutex::new(Ledger::default()), tx }) }
    }

    #[must_use]
    pub fn snapshot(&self) -> HistorySnapshot {
        self.inner.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HistorySnapshot> {
        self.inner.tx.subscribe()
    }

    /// Fetch the server's list and replace the held collection with it.
    ///
    /// # Errors
    ///
    /// Returns the fetch error when this refresh was the newest one and it
    /// failed; the previous collection stays in place and the error is
    /// recorded in the snapshot.
    pub async fn refresh(&self) -> Result<RefreshOutcome, HistoryFetchError> {
        let seq = {
            let mut ledger = self.lock();
            ledger.issued += 1;
            let seq = ledger.issued;
            ledger.outstanding.insert(seq);
            self.publish(&mut ledger);
            seq
        };
        tracing::debug!(seq, "history refresh issued");

        let response = self.inner.api.history(&self.inner.query).await;

        let mut ledger = self.lock();
        ledger.outstanding.remove(&seq);
        if ledger.is_stale(seq) {
            tracing::debug!(seq, settled = ledger.settled, "stale history response discarded");
            self.publish(&mut ledger);
            return Ok(RefreshOutcome::Stale);
        }

        ledger.settled = seq;
        match response {
            Ok(page) => {
                let count = page.items.len();
                ledger.snapshot.entries = page.items.into();
                ledger.snapshot.pending = None;
                ledger.snapshot.error = None;
                self.publish(&mut ledger);
                tracing::info!(seq, count, "history refreshed");
                Ok(RefreshOutcome::Applied { count })
            }
            Err(e) => {
                let err = HistoryFetchError::from(e);
                tracing::warn!(seq, error = %err, "history refresh failed; keeping previous list");
                ledger.snapshot.error = Some(err.clone());
                self.publish(&mut ledger);
                Err(err)
            }
        }
    }

    /// Show a pending entry in front of the list until the next successful
    /// refresh. Replaces any earlier pending entry.
    pub fn append_optimistic(&self, entry: PendingEntry) {
        let mut ledger = self.lock();
        ledger.snapshot.pending = Some(entry);
        self.publish(&mut ledger);
    }

    /// Discard every outstanding refresh response.
    pub fn teardown(&self) {
        let mut ledger = self.lock();
        ledger.floor = ledger.issued;
        ledger.outstanding.clear();
        self.publish(&mut ledger);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Ledger> {
        self.inner
            .ledger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, ledger: &mut Ledger) {
        let floor = ledger.floor.max(ledger.settled);
        ledger.snapshot.loading = ledger.outstanding.iter().any(|seq| *seq > floor);
        self.inner.tx.send_replace(ledger.snapshot.clone());
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
