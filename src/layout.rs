//! Customizable dashboard widget layout.
//!
//! A layout is an ordered list of unique widget keys, stored per user and
//! dashboard context. Fixed keys name built-in tiles; `status-<value>` keys
//! name a tile for one exact status string. Dynamic keys are resolved against
//! the current snapshot at render time and survive their status disappearing.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::StoreError;
use crate::metrics::{AlertEntry, MetricsSnapshot, StatusGroup, ValueEntry};
use crate::store::{LayoutScope, LayoutStore};

const STATUS_PREFIX: &str = "status-";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WidgetKey {
    Total,
    Values,
    Alerts,
    Active,
    ConsolidatedStatus,
    Status(String),
}

impl WidgetKey {
    pub const FIXED: [WidgetKey; 5] = [
        WidgetKey::Total,
        WidgetKey::Values,
        WidgetKey::Alerts,
        WidgetKey::Active,
        WidgetKey::ConsolidatedStatus,
    ];
}

impl fmt::Display for WidgetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WidgetKey::Total => f.write_str("total"),
            WidgetKey::Values => f.write_str("values"),
            WidgetKey::Alerts => f.write_str("alerts"),
            WidgetKey::Active => f.write_str("active"),
            WidgetKey::ConsolidatedStatus => f.write_str("consolidated_status"),
            WidgetKey::Status(status) => write!(f, "{STATUS_PREFIX}{status}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown widget key '{0}'")]
pub struct UnknownWidgetKey(pub String);

impl FromStr for WidgetKey {
    type Err = UnknownWidgetKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "total" => Ok(WidgetKey::Total),
            "values" => Ok(WidgetKey::Values),
            "alerts" => Ok(WidgetKey::Alerts),
            "active" => Ok(WidgetKey::Active),
            "consolidated_status" => Ok(WidgetKey::ConsolidatedStatus),
            _ => match s.strip_prefix(STATUS_PREFIX) {
                Some(status) if !status.is_empty() => Ok(WidgetKey::Status(status.to_string())),
                _ => Err(UnknownWidgetKey(s.to_string())),
            },
        }
    }
}

impl TryFrom<String> for WidgetKey {
    type Error = UnknownWidgetKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WidgetKey> for String {
    fn from(key: WidgetKey) -> Self {
        key.to_string()
    }
}

/// Result of a layout operation. Repeated or stale requests are reported
/// here rather than as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum LayoutOutcome {
    Added,
    AlreadyPresent,
    Removed,
    NotPresent,
    Reordered {
        ignored: Vec<String>,
        appended: Vec<WidgetKey>,
    },
    /// None of the submitted keys exist in the layout; nothing changed.
    NoOverlap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WidgetLayout {
    keys: Vec<WidgetKey>,
}

impl Default for WidgetLayout {
    fn default() -> Self {
        Self {
            keys: WidgetKey::FIXED.to_vec(),
        }
    }
}

impl WidgetLayout {
    pub fn empty() -> Self {
        Self { keys: Vec::new() }
    }

    /// Rebuild a layout from its stored form. Duplicate and unreadable keys
    /// are dropped.
    pub fn from_stored(stored: &[String]) -> Self {
        let mut layout = Self::empty();
        for raw in stored {
            match raw.parse::<WidgetKey>() {
                Ok(key) => {
                    if layout.contains(&key) {
                        log::warn!("layout: dropping duplicate key '{}'", raw);
                    } else {
                        layout.keys.push(key);
                    }
                }
                Err(e) => log::warn!("layout: dropping stored entry: {}", e),
            }
        }
        layout
    }

    pub fn to_stored(&self) -> Vec<String> {
        self.keys.iter().map(ToString::to_string).collect()
    }

    pub fn keys(&self) -> &[WidgetKey] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn contains(&self, key: &WidgetKey) -> bool {
        self.keys.contains(key)
    }

    pub fn add(&mut self, key: WidgetKey) -> LayoutOutcome {
        if self.contains(&key) {
            return LayoutOutcome::AlreadyPresent;
        }
        self.keys.push(key);
        LayoutOutcome::Added
    }

    pub fn remove(&mut self, key: &WidgetKey) -> LayoutOutcome {
        match self.keys.iter().position(|k| k == key) {
            Some(i) => {
                self.keys.remove(i);
                LayoutOutcome::Removed
            }
            None => LayoutOutcome::NotPresent,
        }
    }

    /// Apply a client-submitted order. Keys not in the layout are ignored and
    /// layout keys missing from the submission keep their relative order at
    /// the end, so no widget is ever dropped.
    pub fn reorder<S: AsRef<str>>(&mut self, submitted: &[S]) -> LayoutOutcome {
        let mut ordered: Vec<WidgetKey> = Vec::with_capacity(self.keys.len());
        let mut ignored = Vec::new();
        for raw in submitted {
            let raw = raw.as_ref();
            match raw.parse::<WidgetKey>() {
                Ok(key) if self.contains(&key) && !ordered.contains(&key) => ordered.push(key),
                _ => ignored.push(raw.to_string()),
            }
        }

        if ordered.is_empty() {
            return LayoutOutcome::NoOverlap;
        }

        let placed: HashSet<WidgetKey> = ordered.iter().cloned().collect();
        let appended: Vec<WidgetKey> = self
            .keys
            .iter()
            .filter(|k| !placed.contains(*k))
            .cloned()
            .collect();
        ordered.extend(appended.iter().cloned());
        self.keys = ordered;
        LayoutOutcome::Reordered { ignored, appended }
    }

    /// Per-status widgets the user could add: one per current status group
    /// not already on the layout.
    pub fn candidates(&self, snapshot: &MetricsSnapshot) -> Vec<WidgetKey> {
        snapshot
            .status_groups
            .iter()
            .map(|g| WidgetKey::Status(g.status.clone()))
            .filter(|k| !self.contains(k))
            .collect()
    }

    pub fn render(&self, snapshot: &MetricsSnapshot) -> Vec<ResolvedWidget> {
        self.keys
            .iter()
            .map(|key| ResolvedWidget {
                key: key.clone(),
                view: resolve_widget(key, snapshot),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub status: String,
    pub count: usize,
    pub color: String,
}

impl From<&StatusGroup> for StatusSummary {
    fn from(group: &StatusGroup) -> Self {
        Self {
            status: group.status.clone(),
            count: group.count,
            color: group.color.clone(),
        }
    }
}

/// The slice of a snapshot one widget displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WidgetView {
    Total {
        count: usize,
    },
    #[serde(rename_all = "camelCase")]
    Values {
        total_value: f64,
        top_values: Vec<ValueEntry>,
    },
    #[serde(rename_all = "camelCase")]
    Alerts {
        short_term: Vec<AlertEntry>,
        long_term: Vec<AlertEntry>,
    },
    Active {
        count: usize,
    },
    ConsolidatedStatus {
        groups: Vec<StatusSummary>,
    },
    /// `group` is `None` when no row currently has this status.
    Status {
        status: String,
        group: Option<StatusSummary>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedWidget {
    pub key: WidgetKey,
    pub view: WidgetView,
}

pub fn resolve_widget(key: &WidgetKey, snapshot: &MetricsSnapshot) -> WidgetView {
    match key {
        WidgetKey::Total => WidgetView::Total {
            count: snapshot.total_count,
        },
        WidgetKey::Values => WidgetView::Values {
            total_value: snapshot.total_value,
            top_values: snapshot.top_values.clone(),
        },
        WidgetKey::Alerts => WidgetView::Alerts {
            short_term: snapshot.short_term_alerts.clone(),
            long_term: snapshot.long_term_alerts.clone(),
        },
        WidgetKey::Active => WidgetView::Active {
            count: snapshot.active_count,
        },
        WidgetKey::ConsolidatedStatus => WidgetView::ConsolidatedStatus {
            groups: snapshot.status_groups.iter().map(StatusSummary::from).collect(),
        },
        WidgetKey::Status(status) => WidgetView::Status {
            status: status.clone(),
            group: snapshot.status_group(status).map(StatusSummary::from),
        },
    }
}

/// Layout operations against a store. Every mutation re-reads the stored
/// list, applies the change and writes the whole list back when it changed,
/// so concurrent writers can never leave duplicates or lose keys.
pub struct LayoutManager<'a, S: LayoutStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: LayoutStore + ?Sized> LayoutManager<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Stored layout, or the default ordering when none was saved yet.
    pub fn load(&self, scope: &LayoutScope) -> Result<WidgetLayout, StoreError> {
        Ok(match self.store.load_layout(scope)? {
            Some(stored) => WidgetLayout::from_stored(&stored),
            None => WidgetLayout::default(),
        })
    }

    pub fn add(
        &self,
        scope: &LayoutScope,
        key: WidgetKey,
    ) -> Result<(WidgetLayout, LayoutOutcome), StoreError> {
        self.mutate(scope, |layout| layout.add(key))
    }

    pub fn remove(
        &self,
        scope: &LayoutScope,
        key: &WidgetKey,
    ) -> Result<(WidgetLayout, LayoutOutcome), StoreError> {
        self.mutate(scope, |layout| layout.remove(key))
    }

    pub fn reorder<K: AsRef<str>>(
        &self,
        scope: &LayoutScope,
        submitted: &[K],
    ) -> Result<(WidgetLayout, LayoutOutcome), StoreError> {
        self.mutate(scope, |layout| layout.reorder(submitted))
    }

    fn mutate<F>(
        &self,
        scope: &LayoutScope,
        op: F,
    ) -> Result<(WidgetLayout, LayoutOutcome), StoreError>
    where
        F: FnOnce(&mut WidgetLayout) -> LayoutOutcome,
    {
        let mut applied: Option<(WidgetLayout, LayoutOutcome, bool)> = None;
        self.store.update_layout(
            scope,
            Box::new(|stored: Option<Vec<String>>| {
                let mut layout = match &stored {
                    Some(keys) => WidgetLayout::from_stored(keys),
                    None => WidgetLayout::default(),
                };
                let outcome = op(&mut layout);
                let next = layout.to_stored();
                let changed = stored.as_ref() != Some(&next);
                applied = Some((layout, outcome, changed));
                changed.then_some(next)
            }),
        )?;

        let Some((layout, outcome, changed)) = applied else {
            return Err(StoreError::UpdateNotApplied {
                user_id: scope.user_id.clone(),
                context_id: scope.context_id.clone(),
            });
        };
        if changed {
            log::debug!(
                "layout: saved {} keys for {}/{}",
                layout.len(),
                scope.user_id,
                scope.context_id
            );
        }
        Ok((layout, outcome))
    }
}
