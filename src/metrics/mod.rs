//! Metrics over a service's live rows.
//!
//! A `MetricsSnapshot` is recomputed wholesale from the row collection on every
//! refresh (schema change, row mutation, window change). Nothing is patched in
//! place, so two calls with the same inputs serialize identically.

mod aggregator;
mod histogram;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::Row;

pub use aggregator::{aggregate, aggregate_with};
pub use histogram::{timeline, HistogramBucket, TimelineSpan};

pub const DEFAULT_RECENT_DAYS: u32 = 7;
pub const DEFAULT_TOP_VALUES_LIMIT: usize = 5;
pub const DEFAULT_RECENT_ACTIVITY_LIMIT: usize = 10;
pub const DEFAULT_STATUS_COLOR: &str = "#94a3b8";

/// Presentation limits applied after the aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AggregateOptions {
    pub recent_days: u32,
    pub top_values_limit: usize,
    pub recent_activity_limit: usize,
    pub neutral_status_color: String,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            recent_days: DEFAULT_RECENT_DAYS,
            top_values_limit: DEFAULT_TOP_VALUES_LIMIT,
            recent_activity_limit: DEFAULT_RECENT_ACTIVITY_LIMIT,
            neutral_status_color: DEFAULT_STATUS_COLOR.to_string(),
        }
    }
}

/// Rows sharing one exact status string.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusGroup {
    pub status: String,
    pub count: usize,
    pub color: String,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertEntry {
    pub row: Row,
    pub deadline: DateTime<Utc>,
    pub days_until: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueEntry {
    pub row: Row,
    pub value: f64,
}

/// Fields that were present but unreadable for their role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFields {
    pub currency: usize,
    pub date: usize,
    pub status: usize,
}

impl SkippedFields {
    pub fn total(&self) -> usize {
        self.currency + self.date + self.status
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub computed_at: DateTime<Utc>,
    pub total_count: usize,
    pub total_value: f64,
    pub top_values: Vec<ValueEntry>,
    pub short_term_count: usize,
    pub long_term_count: usize,
    pub short_term_alerts: Vec<AlertEntry>,
    pub long_term_alerts: Vec<AlertEntry>,
    pub overdue_count: usize,
    pub active_count: usize,
    pub pending_count: usize,
    pub done_count: usize,
    pub other_count: usize,
    pub recent_update_count: usize,
    pub recent_activity: Vec<Row>,
    pub status_groups: Vec<StatusGroup>,
    pub skipped: SkippedFields,
}

impl MetricsSnapshot {
    pub fn status_group(&self, status: &str) -> Option<&StatusGroup> {
        self.status_groups.iter().find(|g| g.status == status)
    }
}
