use std::collections::BTreeSet;

use serde_json::Map;

use super::record::{HistoryRecord, HISTORY_SCHEMA_VERSION};

/// One sampled visual treatment, independent of layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleVariant {
    pub label: String,
    pub theme_name: String,
    pub palette_name: String,
    pub class_tokens: BTreeSet<String>,
}

/// An accepted structure + style pairing. Never mutated once accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinationEntry {
    pub id: String,
    pub timestamp: String,
    pub category: String,
    pub structure_id: String,
    pub structure_signature: Vec<String>,
    pub style: StyleVariant,
    pub class_tokens: BTreeSet<String>,
    pub combo_hash: String,
    /// Empty for legacy entries whose style tokens were never recorded.
    pub variant_hash: String,
    pub markup: String,
    pub description: String,
}

impl CombinationEntry {
    pub fn to_record(&self) -> HistoryRecord {
        HistoryRecord {
            schema_version: Some(HISTORY_SCHEMA_VERSION),
            id: Some(self.id.clone()),
            timestamp: Some(self.timestamp.clone()),
            category: Some(self.category.clone()),
            structure_id: Some(self.structure_id.clone()),
            structure_signature: Some(self.structure_signature.clone()),
            style_label: Some(self.style.label.clone()),
            theme_name: Some(self.style.theme_name.clone()),
            palette_name: Some(self.style.palette_name.clone()),
            style_class_tokens: Some(self.style.class_tokens.iter().cloned().collect()),
            class_tokens: Some(self.class_tokens.iter().cloned().collect()),
            combo_hash: Some(self.combo_hash.clone()),
            variant_hash: if self.variant_hash.is_empty() {
                None
            } else {
                Some(self.variant_hash.clone())
            },
            markup: Some(self.markup.clone()),
            description: Some(self.description.clone()),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{CombinationEntry, StyleVariant};

    fn tokens(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn to_record_flattens_style_fields() {
        let entry = CombinationEntry {
            id: "c-1".to_string(),
            timestamp: "2026-02-19T00:00:00+00:00".to_string(),
            category: "Pricing Page".to_string(),
            structure_id: "pricing-page-03".to_string(),
            structure_signature: vec!["0:section".to_string(), "1:h2".to_string()],
            style: StyleVariant {
                label: "Midnight Neon / Cyber".to_string(),
                theme_name: "Midnight Neon".to_string(),
                palette_name: "Cyber".to_string(),
                class_tokens: tokens(&["font-mono", "bg-slate-950"]),
            },
            class_tokens: tokens(&["font-mono", "bg-slate-950", "grid"]),
            combo_hash: "abc".to_string(),
            variant_hash: String::new(),
            markup: "<section><h2>Plans</h2></section>".to_string(),
            description: "text".to_string(),
        };
        let record = entry.to_record();
        assert_eq!(record.style_label.as_deref(), Some("Midnight Neon / Cyber"));
        assert_eq!(record.theme_name.as_deref(), Some("Midnight Neon"));
        assert_eq!(
            record.style_class_tokens,
            Some(vec!["bg-slate-950".to_string(), "font-mono".to_string()])
        );
        assert_eq!(record.variant_hash, None);
        assert_eq!(record.combo_hash.as_deref(), Some("abc"));
    }
}
