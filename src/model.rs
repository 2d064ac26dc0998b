//! Content model — generation requests, results, and history entries.
//!
//! DESIGN
//! ======
//! These are the client-side shapes of the generation workflow. Wire
//! envelopes live in `api::types`; everything here is what the
//! coordinator, the history store, and the view state pass around.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime};
use uuid::Uuid;

pub const MIN_QUALITY_SCORE: f64 = 0.0;
pub const MAX_QUALITY_SCORE: f64 = 10.0;

// =============================================================================
// PLATFORM
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    LinkedIn,
    Twitter,
    Facebook,
    Instagram,
}

impl Platform {
    pub const ALL: [Self; 4] = [Self::LinkedIn, Self::Twitter, Self::Facebook, Self::Instagram];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LinkedIn => "LinkedIn",
            Self::Twitter => "Twitter",
            Self::Facebook => "Facebook",
            Self::Instagram => "Instagram",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown platform: {0} (expected LinkedIn, Twitter, Facebook or Instagram)")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownPlatform(s.to_owned()))
    }
}

// =============================================================================
// GENERATION REQUEST
// =============================================================================

#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("topic must not be empty")]
    EmptyTopic,
    #[error("product info must not be empty")]
    EmptyProductInfo,
    #[error("number of variations must be at least 1")]
    ZeroVariations,
}

/// A single request to produce content for a topic/platform/product
/// combination. Immutable once handed to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    topic: String,
    platform: Platform,
    product_info: String,
    num_variations: u32,
}

impl GenerationRequest {
    #[must_use]
    pub fn new(topic: impl Into<String>, platform: Platform, product_info: impl Into<String>) -> Self {
        Self { topic: topic.into(), platform, product_info: product_info.into(), num_variations: 1 }
    }

    #[must_use]
    pub fn with_num_variations(mut self, num_variations: u32) -> Self {
        self.num_variations = num_variations;
        self
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    #[must_use]
    pub fn product_info(&self) -> &str {
        &self.product_info
    }

    #[must_use]
    pub fn num_variations(&self) -> u32 {
        self.num_variations
    }

    /// Check required fields. Whitespace-only text counts as empty.
    ///
    /// # Errors
    ///
    /// Returns the first failing field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.topic.trim().is_empty() {
            return Err(ValidationError::EmptyTopic);
        }
        if self.product_info.trim().is_empty() {
            return Err(ValidationError::EmptyProductInfo);
        }
        if self.num_variations == 0 {
            return Err(ValidationError::ZeroVariations);
        }
        Ok(())
    }
}

// =============================================================================
// GENERATION RESULT
// =============================================================================

/// Outcome of a completed generation call. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub status: String,
    /// Server-side id of the stored content, when reported.
    pub content_id: Option<Uuid>,
    pub quality_score: Option<f64>,
    pub final_content: Option<String>,
    pub critique_notes: Option<String>,
}

impl GenerationResult {
    /// Result shown when an operator opens a past entry from history.
    #[must_use]
    pub fn from_history(entry: &HistoryEntry) -> Self {
        Self {
            status: "completed".to_owned(),
            content_id: Some(entry.id),
            quality_score: Some(entry.quality_score),
            final_content: Some(entry.final_content.clone()),
            critique_notes: None,
        }
    }
}

/// Keep a score only if it lies in `[0, 10]`.
#[must_use]
pub fn checked_quality_score(score: Option<f64>) -> Option<f64> {
    score.filter(|s| (MIN_QUALITY_SCORE..=MAX_QUALITY_SCORE).contains(s))
}

// =============================================================================
// HISTORY ENTRY
// =============================================================================

/// A server-persisted record of one past successful generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub platform: String,
    pub topic: String,
    #[serde(default)]
    pub final_content: String,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub quality_score: f64,
    #[serde(serialize_with = "serialize_timestamp", deserialize_with = "deserialize_timestamp")]
    pub created_at: OffsetDateTime,
}

/// Parse an RFC 3339 timestamp, falling back to an offset-less ISO 8601
/// timestamp read as UTC.
///
/// # Errors
///
/// Returns the ISO 8601 parse error when neither format matches.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(raw, &Rfc3339)
        .or_else(|_| PrimitiveDateTime::parse(raw, &Iso8601::DEFAULT).map(PrimitiveDateTime::assume_utc))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

fn serialize_timestamp<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let rendered = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&rendered)
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
#[path = "model_test.rs"]
mod tests;
