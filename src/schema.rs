//! Service schema and row shapes.
//!
//! A service is a user-defined table: the schema lists its columns and each
//! row carries a loose key/value payload keyed by column id. Both are owned
//! by the surrounding application and only read here.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declared type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticType {
    Text,
    Number,
    Date,
    Currency,
    Status,
    Boolean,
}

/// One selectable value of a status-like column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnOption {
    pub value: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    pub id: String,
    pub label: String,
    pub semantic_type: SemanticType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ColumnOption>>,
}

impl ColumnDefinition {
    pub fn new(id: &str, label: &str, semantic_type: SemanticType) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            semantic_type,
            options: None,
        }
    }

    pub fn with_options(mut self, options: Vec<ColumnOption>) -> Self {
        self.options = Some(options);
        self
    }

    /// Declared color for an exact option value, if any.
    pub fn option_color(&self, value: &str) -> Option<&str> {
        self.options
            .as_ref()?
            .iter()
            .find(|o| o.value == value)
            .map(|o| o.color.as_str())
    }
}

/// Ordered column list of a service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    pub columns: Vec<ColumnDefinition>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnDefinition>) -> Self {
        Self { columns }
    }

    pub fn column(&self, id: &str) -> Option<&ColumnDefinition> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Stable fingerprint used as the role cache key.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// A stored row of a service. `fields` is keyed by `ColumnDefinition::id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl Row {
    pub fn new(id: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            created_at,
            updated_at: created_at,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, column_id: &str, value: serde_json::Value) -> Self {
        self.fields.insert(column_id.to_string(), value);
        self
    }

    pub fn field(&self, column_id: &str) -> Option<&serde_json::Value> {
        self.fields.get(column_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn column_definition_reads_camel_case_json() {
        let col: ColumnDefinition = serde_json::from_value(json!({
            "id": "s",
            "label": "Status",
            "semanticType": "status",
            "options": [{"value": "Pendente", "color": "#f59e0b"}]
        }))
        .unwrap();

        assert_eq!(col.semantic_type, SemanticType::Status);
        assert_eq!(col.option_color("Pendente"), Some("#f59e0b"));
        assert_eq!(col.option_color("pendente"), None);
    }

    #[test]
    fn fingerprint_changes_with_columns() {
        let a = Schema::new(vec![ColumnDefinition::new("d", "Prazo", SemanticType::Date)]);
        let b = Schema::new(vec![ColumnDefinition::new("d", "Criado em", SemanticType::Date)]);
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
