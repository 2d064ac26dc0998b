//! Wire types for the content service REST API.
//!
//! Field names follow the service's snake_case JSON. Envelopes are
//! converted to model types at the edge so nothing above `api` sees them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{GenerationRequest, GenerationResult, HistoryEntry, Platform, checked_quality_score};

// =============================================================================
// GENERATE
// =============================================================================

/// Body of `POST /content/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateBody {
    pub topic: String,
    pub platform: Platform,
    pub product_info: String,
    pub num_variations: u32,
}

impl GenerateBody {
    /// The dashboard only uses the synchronous single-variation path, so
    /// `num_variations` is always sent as 1.
    #[must_use]
    pub fn single(request: &GenerationRequest) -> Self {
        Self {
            topic: request.topic().to_owned(),
            platform: request.platform(),
            product_info: request.product_info().to_owned(),
            num_variations: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusWire {
    #[serde(default)]
    pub job_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub result: Option<ContentWire>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentWire {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub quality_score: Option<f64>,
    #[serde(default)]
    pub final_content: Option<String>,
    #[serde(default)]
    pub critique_notes: Option<String>,
}

impl From<JobStatusWire> for GenerationResult {
    fn from(wire: JobStatusWire) -> Self {
        let content = wire.result.unwrap_or_default();
        let quality_score = checked_quality_score(content.quality_score);
        if content.quality_score.is_some() && quality_score.is_none() {
            tracing::warn!(score = ?content.quality_score, "quality score out of range; dropping");
        }
        Self {
            status: wire.status,
            content_id: content.id,
            quality_score,
            final_content: content.final_content,
            critique_notes: content.critique_notes,
        }
    }
}

// =============================================================================
// HISTORY
// =============================================================================

pub const MAX_HISTORY_PAGE_SIZE: u32 = 100;

/// Optional filters for `GET /content/history`. The default sends none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub platform: Option<Platform>,
}

impl HistoryQuery {
    /// Query-string pairs, skipping unset filters. Page size is clamped to
    /// the service's accepted range.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.max(1).to_string()));
        }
        if let Some(size) = self.page_size {
            pairs.push(("page_size", size.clamp(1, MAX_HISTORY_PAGE_SIZE).to_string()));
        }
        if let Some(platform) = self.platform {
            pairs.push(("platform", platform.as_str().to_owned()));
        }
        pairs
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryPage {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub items: Vec<HistoryEntry>,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_size: u32,
}

// =============================================================================
// INSIGHT PANELS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    pub sentiment_score: f64,
    pub trending_topics: Vec<TrendingTopic>,
    pub viral_potential: i64,
    pub platform_reactions: Vec<PlatformReaction>,
    pub predicted_performance: Vec<PredictedPerformance>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingTopic {
    pub topic: String,
    pub change: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformReaction {
    pub platform: String,
    pub sentiment: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedPerformance {
    pub label: String,
    pub value: String,
    pub progress: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub key_metrics: Vec<MetricItem>,
    pub campaign_performance: Vec<CampaignPoint>,
    pub slack_alerts: Vec<SlackAlert>,
    #[serde(default)]
    pub integration_status: Vec<IntegrationStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricItem {
    pub label: String,
    pub value: String,
    pub change: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignPoint {
    pub value: i64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackAlert {
    pub msg: String,
    pub time: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationStatus {
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbTestingReport {
    pub active_tests: Vec<AbTest>,
    #[serde(default)]
    pub recommendation: Recommendation,
    pub performance_forecast: Vec<ForecastItem>,
    pub quick_insights: Vec<String>,
    pub recent_results: Vec<AbTestResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbTest {
    pub name: String,
    #[serde(rename = "variantA")]
    pub variant_a: i64,
    #[serde(rename = "variantB")]
    pub variant_b: i64,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastItem {
    pub label: String,
    pub value: String,
    #[serde(default)]
    pub confidence: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbTestResult {
    pub name: String,
    pub winner: String,
    pub improvement: String,
    pub date: String,
}

pub const DEFAULT_SLACK_TEST_MESSAGE: &str = "Test notification from TrendForgeAI Dashboard!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlackTestBody {
    pub message: String,
}

/// Acknowledgement returned by the Slack report/test endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackAck {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
