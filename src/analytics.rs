//! Usage analytics — per-day counters and a bounded interaction log.
//!
//! DESIGN
//! ======
//! `Analytics` is an explicit context object built at the application root
//! and handed to whoever records events; there is no process-wide
//! instance. Tracking only touches memory. State is a single JSON snapshot
//! file written by [`Analytics::save`], or by a [`SnapshotWrite`] taken with
//! [`Analytics::snapshot`] when the write should run off the async runtime.
//! A missing file starts empty; an unreadable one is logged and reset so
//! analytics never blocks the chat.
//!
//! Counters are keyed by UTC date (`YYYY-MM-DD`). Interactions carry an
//! RFC 3339 timestamp, and the log keeps only the newest
//! [`MAX_INTERACTIONS`] entries.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, warn};

pub const MAX_INTERACTIONS: usize = 1000;
pub const DEFAULT_ANALYTICS_PATH: &str = "finbot-analytics.json";

#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("analytics io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("analytics snapshot invalid: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl crate::error::ErrorCode for AnalyticsError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "E_ANALYTICS_IO",
            Self::Snapshot(_) => "E_ANALYTICS_SNAPSHOT",
        }
    }
}

// =============================================================================
// SNAPSHOT TYPES
// =============================================================================

/// date → count
pub type DailyCounts = BTreeMap<String, u64>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsData {
    #[serde(default)]
    pub page_views: BTreeMap<String, DailyCounts>,
    #[serde(default)]
    pub article_views: BTreeMap<String, ArticleViews>,
    #[serde(default)]
    pub user_interactions: Vec<Interaction>,
    #[serde(default)]
    pub tool_usage: BTreeMap<String, DailyCounts>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleViews {
    pub title: String,
    pub views: DailyCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: String,
    /// RFC 3339, UTC.
    pub timestamp: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRank {
    pub id: String,
    pub title: String,
    pub views: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRank {
    pub name: String,
    pub usage: u64,
}

// =============================================================================
// ANALYTICS
// =============================================================================

pub struct Analytics {
    path: Option<PathBuf>,
    data: AnalyticsData,
    clock: fn() -> OffsetDateTime,
}

impl Analytics {
    /// In-memory analytics; nothing is written to disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self { path: None, data: AnalyticsData::default(), clock: OffsetDateTime::now_utc }
    }

    /// Load the snapshot at `path`, starting empty if it is missing and
    /// resetting it if it cannot be parsed.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match read_snapshot(&path) {
            Ok(Some(data)) => data,
            Ok(None) => AnalyticsData::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "analytics: snapshot unreadable, resetting");
                let fresh = Self { path: Some(path), data: AnalyticsData::default(), clock: OffsetDateTime::now_utc };
                if let Err(e) = fresh.save() {
                    warn!(error = %e, "analytics: reset snapshot not written");
                }
                return fresh;
            }
        };
        Self { path: Some(path), data, clock: OffsetDateTime::now_utc }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> OffsetDateTime) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn data(&self) -> &AnalyticsData {
        &self.data
    }

    // ---- tracking ----

    pub fn track_page_view(&mut self, page_path: &str) {
        let today = self.today();
        bump(self.data.page_views.entry(page_path.to_string()).or_default(), today);
    }

    pub fn track_article_view(&mut self, article_id: &str, title: &str) {
        let today = self.today();
        let entry = self
            .data
            .article_views
            .entry(article_id.to_string())
            .or_insert_with(|| ArticleViews { title: title.to_string(), views: DailyCounts::new() });
        bump(&mut entry.views, today);
    }

    pub fn track_tool_usage(&mut self, tool_name: &str) {
        let today = self.today();
        bump(self.data.tool_usage.entry(tool_name.to_string()).or_default(), today);
    }

    pub fn track_interaction(&mut self, kind: &str, details: serde_json::Value) {
        let timestamp = rfc3339((self.clock)());
        self.data
            .user_interactions
            .push(Interaction { kind: kind.to_string(), timestamp, details });
        let len = self.data.user_interactions.len();
        if len > MAX_INTERACTIONS {
            self.data.user_interactions.drain(..len - MAX_INTERACTIONS);
        }
    }

    // ---- summaries ----

    #[must_use]
    pub fn total_page_views(&self) -> u64 {
        self.data.page_views.values().map(sum).sum()
    }

    #[must_use]
    pub fn total_article_views(&self) -> u64 {
        self.data.article_views.values().map(|a| sum(&a.views)).sum()
    }

    /// Articles by total views, highest first.
    #[must_use]
    pub fn most_viewed_articles(&self, limit: usize) -> Vec<ArticleRank> {
        let mut ranked: Vec<ArticleRank> = self
            .data
            .article_views
            .iter()
            .map(|(id, a)| ArticleRank { id: id.clone(), title: a.title.clone(), views: sum(&a.views) })
            .collect();
        ranked.sort_by(|a, b| b.views.cmp(&a.views));
        ranked.truncate(limit);
        ranked
    }

    /// Tools by total usage, highest first.
    #[must_use]
    pub fn most_used_tools(&self, limit: usize) -> Vec<ToolRank> {
        let mut ranked: Vec<ToolRank> = self
            .data
            .tool_usage
            .iter()
            .map(|(name, counts)| ToolRank { name: name.clone(), usage: sum(counts) })
            .collect();
        ranked.sort_by(|a, b| b.usage.cmp(&a.usage));
        ranked.truncate(limit);
        ranked
    }

    /// Newest interactions first.
    #[must_use]
    pub fn recent_interactions(&self, limit: usize) -> Vec<&Interaction> {
        self.data.user_interactions.iter().rev().take(limit).collect()
    }

    pub fn reset(&mut self) {
        self.data = AnalyticsData::default();
    }

    // ---- persistence ----

    /// Serialize the current state for writing. `None` for in-memory
    /// analytics.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Snapshot`] if serialization fails.
    pub fn snapshot(&self) -> Result<Option<SnapshotWrite>, AnalyticsError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let bytes = serde_json::to_vec_pretty(&self.data)?;
        Ok(Some(SnapshotWrite { path: path.clone(), bytes }))
    }

    /// Write the snapshot to disk on the calling thread. A no-op for
    /// in-memory analytics.
    ///
    /// # Errors
    ///
    /// Returns an [`AnalyticsError`] if serialization or the write fails.
    pub fn save(&self) -> Result<(), AnalyticsError> {
        match self.snapshot()? {
            Some(write) => write.write(),
            None => Ok(()),
        }
    }

    fn today(&self) -> String {
        (self.clock)().date().to_string()
    }
}

/// A serialized snapshot detached from [`Analytics`], so the blocking write
/// can happen without holding the analytics lock.
#[derive(Debug)]
pub struct SnapshotWrite {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl SnapshotWrite {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// # Errors
    ///
    /// Returns [`AnalyticsError::Io`] if the file cannot be written.
    pub fn write(self) -> Result<(), AnalyticsError> {
        std::fs::write(&self.path, &self.bytes)?;
        debug!(path = %self.path.display(), bytes = self.bytes.len(), "analytics: snapshot saved");
        Ok(())
    }
}

fn read_snapshot(path: &Path) -> Result<Option<AnalyticsData>, AnalyticsError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn bump(counts: &mut DailyCounts, date: String) {
    *counts.entry(date).or_insert(0) += 1;
}

fn sum(counts: &DailyCounts) -> u64 {
    counts.values().sum()
}

/// Years outside 0..=9999 have no RFC 3339 form; those fall back to the
/// crate's own display format.
fn rfc3339(now: OffsetDateTime) -> String {
    now.format(&Rfc3339).unwrap_or_else(|_| now.to_string())
}

#[cfg(test)]
#[path = "analytics_test.rs"]
mod tests;
