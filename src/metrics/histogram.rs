use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::schema::Row;

/// Trailing window for a creation histogram, ending at `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineSpan {
    /// Calendar months, current month included.
    Months(u32),
    /// Days, today included.
    Days(u32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBucket {
    pub start: NaiveDate,
    pub count: usize,
}

/// Count rows by `created_at`. Every bucket of the span is present, oldest
/// first, so empty periods show up as zero.
pub fn timeline(rows: &[Row], now: DateTime<Utc>, span: TimelineSpan) -> Vec<HistogramBucket> {
    let today = now.date_naive();
    let mut buckets: Vec<HistogramBucket> = match span {
        TimelineSpan::Months(0) | TimelineSpan::Days(0) => return Vec::new(),
        TimelineSpan::Months(n) => (0..n.min(months_since_min(today)))
            .rev()
            .filter_map(|back| month_start(today, back))
            .map(|start| HistogramBucket { start, count: 0 })
            .collect(),
        TimelineSpan::Days(n) => (0..n.min(days_since_min(today)))
            .rev()
            .filter_map(|back| today.checked_sub_signed(Duration::days(i64::from(back))))
            .map(|start| HistogramBucket { start, count: 0 })
            .collect(),
    };

    let Some(first) = buckets.first().map(|b| b.start) else {
        return buckets;
    };

    for row in rows {
        if row.created_at > now {
            continue;
        }
        let created = row.created_at.date_naive();
        if created < first {
            continue;
        }
        let index = match span {
            TimelineSpan::Months(_) => month_ordinal(created) - month_ordinal(first),
            TimelineSpan::Days(_) => (created - first).num_days(),
        };
        if let Some(bucket) = usize::try_from(index).ok().and_then(|i| buckets.get_mut(i)) {
            bucket.count += 1;
        }
    }
    buckets
}

/// Day buckets that fit between `NaiveDate::MIN` and `today`, inclusive.
fn days_since_min(today: NaiveDate) -> u32 {
    u32::try_from((today - NaiveDate::MIN).num_days() + 1).unwrap_or(u32::MAX)
}

fn months_since_min(today: NaiveDate) -> u32 {
    u32::try_from(month_ordinal(today) - month_ordinal(NaiveDate::MIN) + 1).unwrap_or(u32::MAX)
}

fn month_ordinal(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 12 + i64::from(date.month0())
}

/// First day of the month `back` months before `date`'s month.
fn month_start(date: NaiveDate, back: u32) -> Option<NaiveDate> {
    let ordinal = month_ordinal(date) - i64::from(back);
    let year = i32::try_from(ordinal.div_euclid(12)).ok()?;
    let month = u32::try_from(ordinal.rem_euclid(12)).ok()? + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
}
