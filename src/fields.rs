//! Typed parsing of loose row values.
//!
//! Each role-relevant field is parsed once per aggregation pass. A value that
//! cannot be read for its role becomes `Field::Malformed`; it only removes the
//! row from that one metric.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::Value;

/// Outcome of reading one field for one role.
#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Missing,
    Valid(T),
    Malformed(String),
}

impl<T> Field<T> {
    pub fn valid(self) -> Option<T> {
        match self {
            Field::Valid(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Field::Malformed(_))
    }
}

const CURRENCY_SYMBOLS: &[&str] = &["R$", "US$", "$", "€"];

const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Read a monetary or numeric value.
pub fn parse_amount(value: Option<&Value>) -> Field<f64> {
    match value {
        None | Some(Value::Null) => Field::Missing,
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) if f.is_finite() => Field::Valid(f),
            _ => Field::Malformed(n.to_string()),
        },
        Some(Value::String(s)) if s.trim().is_empty() => Field::Missing,
        Some(Value::String(s)) => match parse_amount_text(s) {
            Some(f) => Field::Valid(f),
            None => Field::Malformed(s.clone()),
        },
        Some(other) => Field::Malformed(other.to_string()),
    }
}

fn parse_amount_text(raw: &str) -> Option<f64> {
    let mut text = raw.trim();
    let negative = text.starts_with('-');
    if negative {
        text = text[1..].trim_start();
    }
    for symbol in CURRENCY_SYMBOLS {
        if let Some(rest) = text.strip_prefix(symbol) {
            text = rest.trim_start();
            break;
        }
    }

    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty()
        || !cleaned
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.' || c == ',')
    {
        return None;
    }

    let last_dot = cleaned.rfind('.');
    let last_comma = cleaned.rfind(',');
    let normalized = match (last_dot, last_comma) {
        // Right-most separator is the decimal one.
        (Some(d), Some(c)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (None, Some(_)) if cleaned.matches(',').count() == 1 => cleaned.replace(',', "."),
        (None, Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };

    let parsed: f64 = normalized.parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    Some(if negative { -parsed } else { parsed })
}

/// Read a deadline. Values without an offset are taken as UTC.
pub fn parse_deadline(value: Option<&Value>) -> Field<DateTime<Utc>> {
    match value {
        None | Some(Value::Null) => Field::Missing,
        Some(Value::String(s)) if s.trim().is_empty() => Field::Missing,
        Some(Value::String(s)) => match parse_date_text(s.trim()) {
            Some(dt) => Field::Valid(dt),
            None => Field::Malformed(s.clone()),
        },
        Some(other) => Field::Malformed(other.to_string()),
    }
}

/// Parse the date formats accepted in deadline columns.
pub fn parse_date_text(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(date.and_time(NaiveTime::MIN).and_utc());
        }
    }
    None
}

/// Read a free-text status value.
pub fn parse_status(value: Option<&Value>) -> Field<String> {
    match value {
        None | Some(Value::Null) => Field::Missing,
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Field::Missing
            } else {
                Field::Valid(trimmed.to_string())
            }
        }
        Some(Value::Number(n)) => Field::Valid(n.to_string()),
        Some(other) => Field::Malformed(other.to_string()),
    }
}
