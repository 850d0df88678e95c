use std::collections::HashSet;

use combo_contracts::history::CombinationEntry;

use crate::signature::Signature;
use crate::similarity::closest_match;
use crate::usage::UsageTracker;

/// Everything a run has seen so far: history plus entries staged this run.
///
/// Every accepted entry must go through [`Registries::register`] before the next
/// selection so that uniqueness checks observe it immediately.
#[derive(Debug, Clone, Default)]
pub struct Registries {
    combo_hashes: HashSet<String>,
    variant_hashes: HashSet<String>,
    signatures: Vec<Signature>,
    usage: UsageTracker,
}

impl Registries {
    pub fn from_history(entries: &[CombinationEntry]) -> Self {
        let mut registries = Self::default();
        for entry in entries {
            registries.register(entry);
        }
        registries
    }

    pub fn register(&mut self, entry: &CombinationEntry) {
        if !entry.combo_hash.is_empty() {
            self.combo_hashes.insert(entry.combo_hash.clone());
        }
        if !entry.variant_hash.is_empty() {
            self.variant_hashes.insert(entry.variant_hash.clone());
        }
        if !entry.structure_signature.is_empty() {
            self.signatures.push(entry.structure_signature.clone());
        }
        self.usage.record(&entry.category, &entry.structure_id);
    }

    pub fn has_combo(&self, combo_hash: &str) -> bool {
        self.combo_hashes.contains(combo_hash)
    }

    pub fn has_variant(&self, variant_hash: &str) -> bool {
        self.variant_hashes.contains(variant_hash)
    }

    /// Highest LCS similarity of `signature` against every known signature.
    pub fn max_similarity(&self, signature: &[String]) -> f64 {
        closest_match(signature, self.signatures.iter().map(Vec::as_slice))
            .map(|(_, ratio)| ratio)
            .unwrap_or(0.0)
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use combo_contracts::history::{CombinationEntry, StyleVariant};

    use super::Registries;

    fn entry(structure_id: &str, signature: &[&str], combo: &str, variant: &str) -> CombinationEntry {
        CombinationEntry {
            id: format!("id-{combo}"),
            timestamp: String::new(),
            category: "Dashboard".to_string(),
            structure_id: structure_id.to_string(),
            structure_signature: signature.iter().map(|token| token.to_string()).collect(),
            style: StyleVariant {
                label: "Mono / Plain".to_string(),
                theme_name: "Mono".to_string(),
                palette_name: "Plain".to_string(),
                class_tokens: BTreeSet::new(),
            },
            class_tokens: BTreeSet::new(),
            combo_hash: combo.to_string(),
            variant_hash: variant.to_string(),
            markup: String::new(),
            description: String::new(),
        }
    }

    #[test]
    fn history_populates_every_registry() {
        let registries = Registries::from_history(&[
            entry("d1", &["0:div", "1:h1"], "c1", "v1"),
            entry("d1", &["0:section"], "c2", ""),
        ]);
        assert!(registries.has_combo("c1"));
        assert!(registries.has_combo("c2"));
        assert!(registries.has_variant("v1"));
        assert!(!registries.has_variant(""));
        assert_eq!(registries.usage().count("Dashboard", "d1"), 2);
        assert_eq!(registries.max_similarity(&["0:div".to_string(), "1:h1".to_string()]), 1.0);
    }

    #[test]
    fn registering_is_visible_immediately() {
        let mut registries = Registries::default();
        assert_eq!(registries.max_similarity(&["0:div".to_string()]), 0.0);
        registries.register(&entry("d2", &["0:div", "1:p"], "c9", "v9"));
        assert!(registries.has_combo("c9"));
        assert!(registries.has_variant("v9"));
        assert_eq!(registries.max_similarity(&["0:div".to_string()]), 0.5);
    }
}
