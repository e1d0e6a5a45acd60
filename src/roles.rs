//! Column role resolution.
//!
//! Schemas are user-authored, so which column holds the deadline, the amount
//! or the workflow status has to be inferred from declared types and labels.

use std::collections::VecDeque;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::schema::{ColumnDefinition, Schema, SemanticType};

const DATE_LABEL_KEYWORDS: &[&str] = &["vencimento", "prazo", "limite", "validade"];
const CURRENCY_LABEL_KEYWORDS: &[&str] = &["valor", "total", "preço", "montante"];
const STATUS_LABEL_KEYWORDS: &[&str] = &["status", "situação", "situacao", "estado"];

/// Which column plays which role. `None` means the metric is unavailable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRoles {
    pub date_column_id: Option<String>,
    pub currency_column_id: Option<String>,
    pub status_column_id: Option<String>,
}

fn label_matches(column: &ColumnDefinition, keywords: &[&str]) -> bool {
    let label: String = column.label.nfc().collect::<String>().to_lowercase();
    keywords.iter().any(|k| label.contains(k))
}

/// Prefer a typed column whose label names the role, else the first typed column.
fn typed_column(schema: &Schema, ty: SemanticType, keywords: &[&str]) -> Option<String> {
    let mut typed = schema.columns.iter().filter(|c| c.semantic_type == ty);
    let first = typed.clone().next();
    typed
        .find(|c| label_matches(c, keywords))
        .or(first)
        .map(|c| c.id.clone())
}

pub fn resolve(schema: &Schema) -> ResolvedRoles {
    let status_column_id = schema
        .columns
        .iter()
        .find(|c| c.semantic_type == SemanticType::Status)
        .or_else(|| {
            schema
                .columns
                .iter()
                .find(|c| label_matches(c, STATUS_LABEL_KEYWORDS))
        })
        .map(|c| c.id.clone());

    let roles = ResolvedRoles {
        date_column_id: typed_column(schema, SemanticType::Date, DATE_LABEL_KEYWORDS),
        currency_column_id: typed_column(schema, SemanticType::Currency, CURRENCY_LABEL_KEYWORDS),
        status_column_id,
    };

    if roles.date_column_id.is_none() {
        log::debug!("roles: no date column, deadline alerts unavailable");
    }
    if roles.currency_column_id.is_none() {
        log::debug!("roles: no currency column, value totals unavailable");
    }
    if roles.status_column_id.is_none() {
        log::debug!("roles: no status column, status breakdown unavailable");
    }
    roles
}

/// Schemas a `RoleCache` remembers by default.
pub const DEFAULT_ROLE_CACHE_CAPACITY: usize = 64;

/// Memoizes `resolve` by schema fingerprint, keeping the most recently used
/// schemas up to a fixed capacity.
pub struct RoleCache {
    capacity: usize,
    /// Least recently used first.
    entries: Mutex<VecDeque<(u64, ResolvedRoles)>>,
}

impl Default for RoleCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_ROLE_CACHE_CAPACITY)
    }
}

impl RoleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of zero disables caching.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    pub fn resolve(&self, schema: &Schema) -> ResolvedRoles {
        let key = schema.fingerprint();
        {
            let mut entries = self.entries.lock();
            if let Some(i) = entries.iter().position(|(k, _)| *k == key) {
                if let Some(hit) = entries.remove(i) {
                    let roles = hit.1.clone();
                    entries.push_back(hit);
                    return roles;
                }
            }
        }

        let roles = resolve(schema);
        if self.capacity > 0 {
            let mut entries = self.entries.lock();
            if !entries.iter().any(|(k, _)| *k == key) {
                while entries.len() >= self.capacity {
                    entries.pop_front();
                }
                entries.push_back((key, roles.clone()));
            }
        }
        roles
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(id: &str, label: &str, ty: SemanticType) -> ColumnDefinition {
        ColumnDefinition::new(id, label, ty)
    }

    #[test]
    fn deadline_label_beats_schema_order() {
        let schema = Schema::new(vec![
            col("c", "Criado em", SemanticType::Date),
            col("v", "Vencimento", SemanticType::Date),
        ]);
        assert_eq!(resolve(&schema).date_column_id.as_deref(), Some("v"));
    }

    #[test]
    fn first_typed_column_when_no_label_matches() {
        let schema = Schema::new(vec![
            col("t", "Prazo", SemanticType::Text),
            col("a", "Assinatura", SemanticType::Date),
            col("b", "Entrega", SemanticType::Date),
            col("x", "Custo", SemanticType::Currency),
            col("y", "Frete", SemanticType::Currency),
        ]);
        let roles = resolve(&schema);
        assert_eq!(roles.date_column_id.as_deref(), Some("a"));
        assert_eq!(roles.currency_column_id.as_deref(), Some("x"));
    }

    #[test]
    fn currency_label_is_case_insensitive() {
        let schema = Schema::new(vec![
            col("f", "Frete", SemanticType::Currency),
            col("p", "PREÇO FINAL", SemanticType::Currency),
        ]);
        assert_eq!(resolve(&schema).currency_column_id.as_deref(), Some("p"));
    }

    #[test]
    fn status_falls_back_to_label() {
        let typed = Schema::new(vec![
            col("e", "Estado", SemanticType::Text),
            col("s", "Fase", SemanticType::Status),
        ]);
        assert_eq!(resolve(&typed).status_column_id.as_deref(), Some("s"));

        let labelled = Schema::new(vec![
            col("n", "Nome", SemanticType::Text),
            col("sit", "Situação", SemanticType::Text),
        ]);
        assert_eq!(resolve(&labelled).status_column_id.as_deref(), Some("sit"));
    }

    #[test]
    fn empty_schema_resolves_nothing() {
        assert_eq!(resolve(&Schema::default()), ResolvedRoles::default());
    }

    #[test]
    fn cache_reuses_entries_per_schema() {
        let cache = RoleCache::new();
        let a = Schema::new(vec![col("d", "Prazo", SemanticType::Date)]);
        let b = Schema::new(vec![col("v", "Valor", SemanticType::Currency)]);

        assert_eq!(cache.resolve(&a), resolve(&a));
        assert_eq!(cache.resolve(&a), resolve(&a));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.resolve(&b).currency_column_id.as_deref(), Some("v"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn cache_evicts_least_recently_used_schema() {
        let cache = RoleCache::with_capacity(2);
        let a = Schema::new(vec![col("d", "Prazo", SemanticType::Date)]);
        let b = Schema::new(vec![col("v", "Valor", SemanticType::Currency)]);
        let c = Schema::new(vec![col("s", "Status", SemanticType::Status)]);

        cache.resolve(&a);
        cache.resolve(&b);
        cache.resolve(&a);
        cache.resolve(&c);
        assert_eq!(cache.len(), 2);

        // `b` was evicted; `a` and `c` are still served.
        let entries: Vec<u64> = cache.entries.lock().iter().map(|(k, _)| *k).collect();
        assert_eq!(entries, [a.fingerprint(), c.fingerprint()]);
        assert_eq!(cache.resolve(&c).status_column_id.as_deref(), Some("s"));
    }

    #[test]
    fn zero_capacity_cache_still_resolves() {
        let cache = RoleCache::with_capacity(0);
        let a = Schema::new(vec![col("d", "Prazo", SemanticType::Date)]);
        assert_eq!(cache.resolve(&a), resolve(&a));
        assert!(cache.is_empty());
    }
}
