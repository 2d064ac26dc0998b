//! Dashboard shell — mounts exactly one panel per selected tab.
//!
//! Panels share nothing. Switching away from the content tab unmounts it,
//! and switching back mounts a fresh one that refetches history.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::api::types::HistoryQuery;
use crate::api::{ContentService, InsightsService};
use crate::panels::{AbTestingPanel, ContentPanel, MetricsPanel, SentimentPanel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    Content,
    Sentiment,
    Performance,
    AbTesting,
}

impl Tab {
    pub const ALL: [Self; 4] = [Self::Content, Self::Sentiment, Self::Performance, Self::AbTesting];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Sentiment => "sentiment",
            Self::Performance => "performance",
            Self::AbTesting => "ab-testing",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Content => "Content Generation",
            Self::Sentiment => "Sentiment & Trends",
            Self::Performance => "Performance Metrics",
            Self::AbTesting => "A/B Testing",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown tab: {0} (expected content, sentiment, metrics or ab)")]
pub struct UnknownTab(pub String);

impl FromStr for Tab {
    type Err = UnknownTab;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "content" => Ok(Self::Content),
            "sentiment" => Ok(Self::Sentiment),
            "performance" | "metrics" => Ok(Self::Performance),
            "ab-testing" | "ab" => Ok(Self::AbTesting),
            _ => Err(UnknownTab(s.to_owned())),
        }
    }
}

/// The panel currently behind the selected tab.
#[derive(Clone)]
pub enum MountedPanel {
    Content(Arc<ContentPanel>),
    Sentiment(SentimentPanel),
    Performance(MetricsPanel),
    AbTesting(AbTestingPanel),
}

impl MountedPanel {
    #[must_use]
    pub fn tab(&self) -> Tab {
        match self {
            Self::Content(_) => Tab::Content,
            Self::Sentiment(_) => Tab::Sentiment,
            Self::Performance(_) => Tab::Performance,
            Self::AbTesting(_) => Tab::AbTesting,
        }
    }
}

pub struct DashboardShell {
    content_api: Arc<dyn ContentService>,
    insights_api: Arc<dyn InsightsService>,
    query: HistoryQuery,
    mounted: MountedPanel,
}

impl DashboardShell {
    /// Open on the content tab. Must run inside a tokio runtime.
    #[must_use]
    pub fn open(content_api: Arc<dyn ContentService>, insights_api: Arc<dyn InsightsService>) -> Self {
        Self::open_with_query(content_api, insights_api, HistoryQuery::default())
    }

    #[must_use]
    pub fn open_with_query(
        content_api: Arc<dyn ContentService>,
        insights_api: Arc<dyn InsightsService>,
        query: HistoryQuery,
    ) -> Self {
        let content = ContentPanel::mount(content_api.clone(), query.clone());
        Self { content_api, insights_api, query, mounted: MountedPanel::Content(Arc::new(content)) }
    }

    #[must_use]
    pub fn active(&self) -> Tab {
        self.mounted.tab()
    }

    #[must_use]
    pub fn current(&self) -> MountedPanel {
        self.mounted.clone()
    }

    /// Switch tabs. Selecting the active tab keeps its panel mounted.
    pub fn select(&mut self, tab: Tab) -> MountedPanel {
        if tab == self.active() {
            return self.current();
        }
        if let MountedPanel::Content(panel) = &self.mounted {
            panel.unmount();
        }
        self.mounted = match tab {
            Tab::Content => {
                MountedPanel::Content(Arc::new(ContentPanel::mount(self.content_api.clone(), self.query.clone())))
            }
            Tab::Sentiment => MountedPanel::Sentiment(SentimentPanel::new(self.insights_api.clone())),
            Tab::Performance => MountedPanel::Performance(MetricsPanel::new(self.insights_api.clone())),
            Tab::AbTesting => MountedPanel::AbTesting(AbTestingPanel::new(self.insights_api.clone())),
        };
        tracing::info!(tab = tab.id(), "tab selected");
        self.current()
    }

    /// Unmount whatever is showing.
    pub fn close(&self) {
        if let MountedPanel::Content(panel) = &self.mounted {
            panel.unmount();
        }
    }
}

#[cfg(test)]
#[path = "shell_test.rs"]
mod tests;
