//! API — client side of the content service REST contract.
//!
//! DESIGN
//! ======
//! Two seams: `ContentService` (generate + history) is all the generation
//! workflow needs; `InsightsService` backs the stateless read-only panels.
//! `HttpServiceClient` implements both over reqwest. Tests substitute
//! `test_helpers::MockContentService` and `MockInsightsService`.

pub mod http;
pub mod types;

use crate::model::GenerationResult;
use types::{
    AbTestingReport, GenerateBody, HealthStatus, HistoryPage, HistoryQuery, MetricsReport, SentimentReport, SlackAck,
};

pub use http::HttpServiceClient;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by remote service calls.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ApiError {
    /// The request never got a response (connect, timeout, reset).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("{message}")]
    Remote { status: u16, message: String },

    /// A success response body could not be deserialized.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Build a remote error from the status and raw error body.
    ///
    /// The message carries the HTTP status text; a FastAPI-style `detail`
    /// string in the body is appended when present.
    #[must_use]
    pub fn remote(status: u16, reason: Option<&str>, body: &str) -> Self {
        let reason = reason.unwrap_or("Unknown Status");
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(ToOwned::to_owned))
            .filter(|d| !d.is_empty());
        let message = match detail {
            Some(detail) => format!("API Error: {reason} ({detail})"),
            None => format!("API Error: {reason}"),
        };
        Self::Remote { status, message }
    }

    /// HTTP status, when the service answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// =============================================================================
// SERVICE TRAITS
// =============================================================================

/// Content generation and history endpoints.
#[async_trait::async_trait]
pub trait ContentService: Send + Sync {
    /// `POST /content/generate?use_async=false`.
    async fn generate(&self, body: &GenerateBody) -> Result<GenerationResult, ApiError>;

    /// `GET /content/history`.
    async fn history(&self, query: &HistoryQuery) -> Result<HistoryPage, ApiError>;
}

/// Read-only insight endpoints and the Slack actions on the metrics panel.
#[async_trait::async_trait]
pub trait InsightsService: Send + Sync {
    async fn sentiment(&self) -> Result<SentimentReport, ApiError>;
    async fn metrics(&self) -> Result<MetricsReport, ApiError>;
    async fn ab_testing(&self) -> Result<AbTestingReport, ApiError>;
    async fn send_slack_report(&self) -> Result<SlackAck, ApiError>;
    async fn send_slack_test(&self, message: &str) -> Result<SlackAck, ApiError>;
    async fn health(&self) -> Result<HealthStatus, ApiError>;
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use time::OffsetDateTime;
    use tokio::sync::Notify;
    use uuid::Uuid;

    use super::*;
    use crate::model::HistoryEntry;

    /// Scripted `ContentService`. Unscripted generate calls succeed with
    /// [`completed_result`]; unscripted history calls return an empty page.
    #[derive(Default)]
    pub struct MockContentService {
        generate_responses: Mutex<VecDeque<Result<GenerationResult, ApiError>>>,
        history_responses: Mutex<VecDeque<Result<HistoryPage, ApiError>>>,
        generate_calls: AtomicUsize,
        history_calls: AtomicUsize,
        bodies: Mutex<Vec<GenerateBody>>,
        gate: Option<Gate>,
        stalled_history: bool,
    }

    /// Holds generate calls open until released.
    struct Gate {
        entered: Notify,
        release: Notify,
    }

    impl MockContentService {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Generate calls block until [`MockContentService::release`].
        #[must_use]
        pub fn gated() -> Self {
            Self { gate: Some(Gate { entered: Notify::new(), release: Notify::new() }), ..Self::default() }
        }

        /// History calls never complete.
        #[must_use]
        pub fn stalled_history() -> Self {
            Self { stalled_history: true, ..Self::default() }
        }

        pub fn push_generate(&self, response: Result<GenerationResult, ApiError>) {
            self.generate_responses.lock().unwrap().push_back(response);
        }

        pub fn push_history(&self, response: Result<HistoryPage, ApiError>) {
            self.history_responses.lock().unwrap().push_back(response);
        }

        /// Wait until a gated generate call has started.
        pub async fn entered(&self) {
            if let Some(gate) = &self.gate {
                gate.entered.notified().await;
            }
        }

        pub fn release(&self) {
            if let Some(gate) = &self.gate {
                gate.release.notify_one();
            }
        }

        #[must_use]
        pub fn generate_calls(&self) -> usize {
            self.generate_calls.load(Ordering::SeqCst)
        }

        #[must_use]
        pub fn history_calls(&self) -> usize {
            self.history_calls.load(Ordering::SeqCst)
        }

        #[must_use]
        pub fn bodies(&self) -> Vec<GenerateBody> {
            self.bodies.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl ContentService for MockContentService {
        async fn generate(&self, body: &GenerateBody) -> Result<GenerationResult, ApiError> {
            self.generate_calls.fetch_add(1, Ordering::SeqCst);
            self.bodies.lock().unwrap().push(body.clone());
            if let Some(gate) = &self.gate {
                gate.entered.notify_one();
                gate.release.notified().await;
            }
            let next = self.generate_responses.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(completed_result(8.0)))
        }

        async fn history(&self, _query: &HistoryQuery) -> Result<HistoryPage, ApiError> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            if self.stalled_history {
                std::future::pending::<()>().await;
            }
            let next = self.history_responses.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(HistoryPage::default()))
        }
    }

    /// `InsightsService` with canned reports. Records every call by
    /// endpoint name and every Slack test message.
    #[derive(Default)]
    pub struct MockInsightsService {
        calls: Mutex<Vec<&'static str>>,
        messages: Mutex<Vec<String>>,
        failing: bool,
    }

    impl MockInsightsService {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Every call answers 503.
        #[must_use]
        pub fn failing() -> Self {
            Self { failing: true, ..Self::default() }
        }

        #[must_use]
        pub fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }

        #[must_use]
        pub fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }

        fn record<T>(&self, endpoint: &'static str, value: T) -> Result<T, ApiError> {
            self.calls.lock().unwrap().push(endpoint);
            if self.failing {
                return Err(server_error(503, "Service Unavailable"));
            }
            Ok(value)
        }
    }

    #[async_trait::async_trait]
    impl InsightsService for MockInsightsService {
        async fn sentiment(&self) -> Result<SentimentReport, ApiError> {
            self.record("sentiment", sentiment_report())
        }

        async fn metrics(&self) -> Result<MetricsReport, ApiError> {
            self.record("metrics", metrics_report())
        }

        async fn ab_testing(&self) -> Result<AbTestingReport, ApiError> {
            self.record("ab", ab_report())
        }

        async fn send_slack_report(&self) -> Result<SlackAck, ApiError> {
            self.record("send-report", SlackAck { success: true, message: "Report sent to Slack".into() })
        }

        async fn send_slack_test(&self, message: &str) -> Result<SlackAck, ApiError> {
            self.messages.lock().unwrap().push(message.to_owned());
            self.record("slack-test", SlackAck { success: true, message: "Test notification sent".into() })
        }

        async fn health(&self) -> Result<HealthStatus, ApiError> {
            self.record("health", HealthStatus { status: "healthy".into() })
        }
    }

    #[must_use]
    pub fn sentiment_report() -> SentimentReport {
        SentimentReport {
            sentiment_score: 0.72,
            trending_topics: vec![types::TrendingTopic { topic: "AI in Healthcare".into(), change: "+24%".into() }],
            viral_potential: 81,
            platform_reactions: vec![types::PlatformReaction {
                platform: "LinkedIn".into(),
                sentiment: "positive".into(),
                score: 0.8,
            }],
            predicted_performance: Vec::new(),
        }
    }

    #[must_use]
    pub fn metrics_report() -> MetricsReport {
        MetricsReport {
            key_metrics: vec![types::MetricItem {
                label: "Engagement".into(),
                value: "4.2%".into(),
                change: "+0.6%".into(),
                icon: String::new(),
                color: String::new(),
            }],
            campaign_performance: vec![types::CampaignPoint { value: 62, label: "Mon".into() }],
            slack_alerts: Vec::new(),
            integration_status: Vec::new(),
        }
    }

    #[must_use]
    pub fn ab_report() -> AbTestingReport {
        AbTestingReport {
            active_tests: vec![types::AbTest {
                name: "Headline tone".into(),
                variant_a: 48,
                variant_b: 52,
                status: "running".into(),
            }],
            recommendation: types::Recommendation::default(),
            performance_forecast: Vec::new(),
            quick_insights: vec!["Questions outperform statements".into()],
            recent_results: Vec::new(),
        }
    }

    #[must_use]
    pub fn completed_result(score: f64) -> GenerationResult {
        GenerationResult {
            status: "completed".into(),
            content_id: Some(Uuid::new_v4()),
            quality_score: Some(score),
            final_content: Some("Healthcare teams ship faster with AI.".into()),
            critique_notes: Some("Strong hook; add a CTA.".into()),
        }
    }

    #[must_use]
    pub fn history_entry(topic: &str, score: f64) -> HistoryEntry {
        HistoryEntry {
            id: Uuid::new_v4(),
            platform: "LinkedIn".into(),
            topic: topic.into(),
            final_content: format!("Post about {topic}"),
            quality_score: score,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[must_use]
    pub fn page_of(items: Vec<HistoryEntry>) -> HistoryPage {
        HistoryPage { total: items.len() as u64, items, page: 1, page_size: 10 }
    }

    #[must_use]
    pub fn server_error(status: u16, reason: &str) -> ApiError {
        ApiError::remote(status, Some(reason), "")
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
