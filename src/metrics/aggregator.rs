use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use super::{
    AggregateOptions, AlertEntry, MetricsSnapshot, SkippedFields, StatusGroup, ValueEntry,
};
use crate::alerts::{bucket, AlertBucket, AlertWindowConfig};
use crate::fields::{parse_amount, parse_deadline, parse_status, Field};
use crate::roles::ResolvedRoles;
use crate::schema::{Row, Schema};
use crate::status::{categorize, StatusCategory};

/// Role-relevant values of one row, parsed once.
struct RowFacts {
    amount: Field<f64>,
    deadline: Field<DateTime<Utc>>,
    status: Field<String>,
}

impl RowFacts {
    fn read(row: &Row, roles: &ResolvedRoles) -> Self {
        let field = |id: &Option<String>| id.as_deref().and_then(|id| row.field(id));
        Self {
            amount: parse_amount(field(&roles.currency_column_id)),
            deadline: parse_deadline(field(&roles.date_column_id)),
            status: parse_status(field(&roles.status_column_id)),
        }
    }
}

/// Aggregate with default options and neutral status colors.
pub fn aggregate(
    rows: &[Row],
    roles: &ResolvedRoles,
    config: &AlertWindowConfig,
    now: DateTime<Utc>,
) -> MetricsSnapshot {
    aggregate_with(rows, roles, config, now, None, &AggregateOptions::default())
}

/// Single pass over `rows`. Status colors come from the status column's
/// declared options when `schema` is given.
pub fn aggregate_with(
    rows: &[Row],
    roles: &ResolvedRoles,
    config: &AlertWindowConfig,
    now: DateTime<Utc>,
    schema: Option<&Schema>,
    options: &AggregateOptions,
) -> MetricsSnapshot {
    let status_column = schema
        .zip(roles.status_column_id.as_deref())
        .and_then(|(schema, id)| schema.column(id));
    // A window reaching past the calendar's start covers all history.
    let recent_since = now.checked_sub_signed(Duration::days(i64::from(options.recent_days)));

    let mut total_value = 0.0;
    let mut top_values: Vec<ValueEntry> = Vec::new();
    let mut short_term_alerts: Vec<AlertEntry> = Vec::new();
    let mut long_term_alerts: Vec<AlertEntry> = Vec::new();
    let mut overdue_count = 0;
    let mut category_counts: HashMap<StatusCategory, usize> = HashMap::new();
    let mut recent_activity: Vec<Row> = Vec::new();
    let mut status_groups: Vec<StatusGroup> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();
    let mut skipped = SkippedFields::default();

    for row in rows {
        let facts = RowFacts::read(row, roles);

        match facts.amount {
            Field::Valid(value) => {
                total_value += value;
                if value > 0.0 {
                    top_values.push(ValueEntry {
                        row: row.clone(),
                        value,
                    });
                }
            }
            Field::Malformed(raw) => {
                skipped.currency += 1;
                log::debug!("metrics: row {} has unreadable amount {:?}", row.id, raw);
            }
            Field::Missing => {}
        }

        match facts.deadline {
            Field::Valid(deadline) => match bucket(deadline, now, config) {
                AlertBucket::ShortTerm => short_term_alerts.push(alert_entry(row, deadline, now)),
                AlertBucket::LongTerm => long_term_alerts.push(alert_entry(row, deadline, now)),
                AlertBucket::None if deadline <= now => overdue_count += 1,
                AlertBucket::None => {}
            },
            Field::Malformed(raw) => {
                skipped.date += 1;
                log::debug!("metrics: row {} has unreadable deadline {:?}", row.id, raw);
            }
            Field::Missing => {}
        }

        match facts.status {
            Field::Valid(status) => {
                *category_counts.entry(categorize(Some(&status))).or_default() += 1;
                match group_index.get(&status) {
                    Some(&i) => {
                        status_groups[i].count += 1;
                        status_groups[i].rows.push(row.clone());
                    }
                    None => {
                        let color = status_column
                            .and_then(|c| c.option_color(&status))
                            .unwrap_or(options.neutral_status_color.as_str())
                            .to_string();
                        group_index.insert(status.clone(), status_groups.len());
                        status_groups.push(StatusGroup {
                            status,
                            count: 1,
                            color,
                            rows: vec![row.clone()],
                        });
                    }
                }
            }
            Field::Malformed(raw) => {
                skipped.status += 1;
                log::debug!("metrics: row {} has unreadable status {:?}", row.id, raw);
            }
            Field::Missing => {}
        }

        if row.created_at <= now && recent_since.map_or(true, |since| row.created_at > since) {
            recent_activity.push(row.clone());
        }
    }

    if skipped.total() > 0 {
        log::warn!(
            "metrics: skipped {} unreadable fields across {} rows (currency {}, date {}, status {})",
            skipped.total(),
            rows.len(),
            skipped.currency,
            skipped.date,
            skipped.status
        );
    }

    // Presentation ordering, applied once over the collected subsets.
    top_values.sort_by(|a, b| b.value.total_cmp(&a.value));
    top_values.truncate(options.top_values_limit);
    short_term_alerts.sort_by_key(|a| a.deadline);
    long_term_alerts.sort_by_key(|a| a.deadline);
    status_groups.sort_by(|a, b| b.count.cmp(&a.count));
    let recent_update_count = recent_activity.len();
    recent_activity.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent_activity.truncate(options.recent_activity_limit);

    let count = |c: StatusCategory| category_counts.get(&c).copied().unwrap_or(0);
    let snapshot = MetricsSnapshot {
        computed_at: now,
        total_count: rows.len(),
        total_value,
        top_values,
        short_term_count: short_term_alerts.len(),
        long_term_count: long_term_alerts.len(),
        short_term_alerts,
        long_term_alerts,
        overdue_count,
        active_count: count(StatusCategory::Active),
        pending_count: count(StatusCategory::Pending),
        done_count: count(StatusCategory::Done),
        other_count: count(StatusCategory::Other),
        recent_update_count,
        recent_activity,
        status_groups,
        skipped,
    };

    log::debug!(
        "metrics: {} rows, value {:.2}, alerts {}/{}, {} status groups",
        snapshot.total_count,
        snapshot.total_value,
        snapshot.short_term_count,
        snapshot.long_term_count,
        snapshot.status_groups.len()
    );
    snapshot
}

fn alert_entry(row: &Row, deadline: DateTime<Utc>, now: DateTime<Utc>) -> AlertEntry {
    AlertEntry {
        row: row.clone(),
        deadline,
        days_until: (deadline - now).num_days(),
    }
}
