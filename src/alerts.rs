//! Deadline alert windows.
//!
//! Upcoming deadlines are split into a short-term and a long-term bucket by
//! per-user day thresholds. Past deadlines are never alerts; the aggregator
//! counts them separately as overdue.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::metrics::MetricsSnapshot;

pub const DEFAULT_SHORT_TERM_DAYS: u32 = 30;
pub const DEFAULT_LONG_TERM_DAYS: u32 = 90;

/// Day thresholds for the two alert buckets. `short_term_days < long_term_days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertWindowConfig {
    pub short_term_days: u32,
    pub long_term_days: u32,
}

impl Default for AlertWindowConfig {
    fn default() -> Self {
        Self {
            short_term_days: DEFAULT_SHORT_TERM_DAYS,
            long_term_days: DEFAULT_LONG_TERM_DAYS,
        }
    }
}

impl AlertWindowConfig {
    /// Build a config, rejecting windows that would overlap or be empty.
    pub fn new(short_term_days: u32, long_term_days: u32) -> Result<Self, ConfigError> {
        let config = Self {
            short_term_days,
            long_term_days,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.short_term_days == 0 || self.short_term_days >= self.long_term_days {
            return Err(ConfigError::InvalidAlertWindow {
                short_term_days: self.short_term_days,
                long_term_days: self.long_term_days,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertBucket {
    None,
    ShortTerm,
    LongTerm,
}

/// Place a deadline relative to `now`. Both upper edges are exclusive. An
/// edge past the representable calendar is unbounded.
pub fn bucket(date: DateTime<Utc>, now: DateTime<Utc>, config: &AlertWindowConfig) -> AlertBucket {
    if date <= now {
        return AlertBucket::None;
    }
    let before_edge = |days: u32| {
        now.checked_add_signed(Duration::days(i64::from(days)))
            .map_or(true, |edge| date < edge)
    };
    if before_edge(config.short_term_days) {
        AlertBucket::ShortTerm
    } else if before_edge(config.long_term_days) {
        AlertBucket::LongTerm
    } else {
        AlertBucket::None
    }
}

/// One upcoming deadline as seen by a notification rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertItem {
    pub row_id: String,
    pub deadline: DateTime<Utc>,
    pub days_until: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCount {
    pub status: String,
    pub count: usize,
}

/// Compact input for the notification subsystem, derived from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDigest {
    pub short_term: Vec<AlertItem>,
    pub long_term: Vec<AlertItem>,
    pub overdue_count: usize,
    pub status_counts: Vec<StatusCount>,
}

impl AlertDigest {
    pub fn from_snapshot(snapshot: &MetricsSnapshot) -> Self {
        let items = |entries: &[crate::metrics::AlertEntry]| {
            entries
                .iter()
                .map(|e| AlertItem {
                    row_id: e.row.id.clone(),
                    deadline: e.deadline,
                    days_until: e.days_until,
                })
                .collect::<Vec<_>>()
        };
        Self {
            short_term: items(&snapshot.short_term_alerts),
            long_term: items(&snapshot.long_term_alerts),
            overdue_count: snapshot.overdue_count,
            status_counts: snapshot
                .status_groups
                .iter()
                .map(|g| StatusCount {
                    status: g.status.clone(),
                    count: g.count,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.short_term.is_empty() && self.long_term.is_empty()
    }
}
