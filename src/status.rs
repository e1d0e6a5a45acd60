//! Free-text status classification.
//!
//! Status columns hold whatever users typed ("Em andamento", "AGUARDANDO
//! ASSINATURA", "Entregue ao cliente"). Metrics only need four buckets, so the
//! raw text is mapped by keyword. The first matching category wins.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCategory {
    Pending,
    Active,
    Done,
    Other,
}

impl StatusCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Done => "done",
            Self::Other => "other",
        }
    }
}

/// Checked in order; keywords are NFC and lowercase.
const CATEGORY_KEYWORDS: &[(StatusCategory, &[&str])] = &[
    (
        StatusCategory::Pending,
        &["pendente", "aguardando", "analise", "análise"],
    ),
    (
        StatusCategory::Active,
        &["execução", "andamento", "ativo", "vigente"],
    ),
    (StatusCategory::Done, &["concluído", "concluido", "entregue"]),
];

/// Classify a status string. Never fails; `None` and blank text are `Other`.
pub fn categorize(status: Option<&str>) -> StatusCategory {
    let Some(text) = status else {
        return StatusCategory::Other;
    };
    let normalized: String = text.nfc().collect::<String>().to_lowercase();
    if normalized.trim().is_empty() {
        return StatusCategory::Other;
    }

    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| normalized.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(StatusCategory::Other)
}
