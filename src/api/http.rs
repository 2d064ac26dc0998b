//! reqwest-backed client for the content service.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{
    AbTestingReport, GenerateBody, HealthStatus, HistoryPage, HistoryQuery, JobStatusWire, MetricsReport,
    SentimentReport, SlackAck, SlackTestBody,
};
use super::{ApiError, ContentService, InsightsService};
use crate::config::{API_PREFIX, DashboardConfig};
use crate::model::GenerationResult;

pub struct HttpServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpServiceClient {
    /// Build a client from config.
    ///
    /// # Errors
    ///
    /// Returns an error if the reqwest client cannot be constructed.
    pub fn new(config: &DashboardConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.trim_end_matches('/').to_owned() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String, query: &[(&str, String)]) -> Result<T, ApiError> {
        let request = self.http.get(url);
        let request = if query.is_empty() { request } else { request.query(query) };
        send_json(request).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, &str)],
        body: &impl Serialize,
    ) -> Result<T, ApiError> {
        let request = self.http.post(url).json(body);
        let request = if query.is_empty() { request } else { request.query(query) };
        send_json(request).await
    }
}

async fn send_json<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<T, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    if !status.is_success() {
        return Err(ApiError::remote(status.as_u16(), status.canonical_reason(), &text));
    }
    serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait::async_trait]
impl ContentService for HttpServiceClient {
    async fn generate(&self, body: &GenerateBody) -> Result<GenerationResult, ApiError> {
        let wire: JobStatusWire = self
            .post_json(self.api_url("/content/generate"), &[("use_async", "false")], body)
            .await?;
        tracing::debug!(job_id = ?wire.job_id, status = %wire.status, "generate response");
        Ok(wire.into())
    }

    async fn history(&self, query: &HistoryQuery) -> Result<HistoryPage, ApiError> {
        self.get_json(self.api_url("/content/history"), &query.to_pairs())
            .await
    }
}

#[async_trait::async_trait]
impl InsightsService for HttpServiceClient {
    async fn sentiment(&self) -> Result<SentimentReport, ApiError> {
        self.get_json(self.api_url("/sentiment"), &[]).await
    }

    async fn metrics(&self) -> Result<MetricsReport, ApiError> {
        self.get_json(self.api_url("/metrics"), &[]).await
    }

    async fn ab_testing(&self) -> Result<AbTestingReport, ApiError> {
        self.get_json(self.api_url("/ab"), &[]).await
    }

    async fn send_slack_report(&self) -> Result<SlackAck, ApiError> {
        self.post_json(self.api_url("/metrics/send-report"), &[], &serde_json::json!({}))
            .await
    }

    async fn send_slack_test(&self, message: &str) -> Result<SlackAck, ApiError> {
        let body = SlackTestBody { message: message.to_owned() };
        self.post_json(self.api_url("/metrics/slack-test"), &[], &body)
            .await
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.get_json(self.url("/health"), &[]).await
    }
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
