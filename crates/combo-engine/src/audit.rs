//! Offline check of the uniqueness invariants over a loaded history.

use std::collections::HashMap;

use combo_contracts::history::CombinationEntry;

use crate::similarity::{is_near_duplicate, similarity};

#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    DuplicateCombo {
        first: String,
        second: String,
        hash: String,
    },
    DuplicateVariant {
        first: String,
        second: String,
        hash: String,
    },
    NearDuplicate {
        first: String,
        second: String,
        ratio: f64,
    },
}

impl Violation {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateCombo { .. } => "duplicate_combo",
            Self::DuplicateVariant { .. } => "duplicate_variant",
            Self::NearDuplicate { .. } => "near_duplicate",
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::DuplicateCombo {
                first,
                second,
                hash,
            } => format!("{first} and {second} share combo hash {hash}"),
            Self::DuplicateVariant {
                first,
                second,
                hash,
            } => format!("{first} and {second} share variant hash {hash}"),
            Self::NearDuplicate {
                first,
                second,
                ratio,
            } => format!("{first} and {second} have structure similarity {ratio:.3}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditReport {
    pub entries: usize,
    pub threshold: f64,
    pub violations: Vec<Violation>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.violations
            .iter()
            .filter(|violation| violation.kind() == kind)
            .count()
    }
}

/// Reports every pair of entries breaking hash uniqueness or the structural
/// similarity bound. Empty variant hashes (legacy entries) are not compared.
pub fn audit_entries(entries: &[CombinationEntry], threshold: f64) -> AuditReport {
    let mut violations = Vec::new();
    let mut combo_owner: HashMap<&str, &str> = HashMap::new();
    let mut variant_owner: HashMap<&str, &str> = HashMap::new();

    for entry in entries {
        if let Some(first) = combo_owner.get(entry.combo_hash.as_str()) {
            violations.push(Violation::DuplicateCombo {
                first: first.to_string(),
                second: entry.id.clone(),
                hash: entry.combo_hash.clone(),
            });
        } else {
            combo_owner.insert(&entry.combo_hash, &entry.id);
        }

        if entry.variant_hash.is_empty() {
            continue;
        }
        if let Some(first) = variant_owner.get(entry.variant_hash.as_str()) {
            violations.push(Violation::DuplicateVariant {
                first: first.to_string(),
                second: entry.id.clone(),
                hash: entry.variant_hash.clone(),
            });
        } else {
            variant_owner.insert(&entry.variant_hash, &entry.id);
        }
    }

    for (index, left) in entries.iter().enumerate() {
        for right in &entries[index + 1..] {
            let ratio = similarity(&left.structure_signature, &right.structure_signature);
            if is_near_duplicate(ratio, threshold) {
                violations.push(Violation::NearDuplicate {
                    first: left.id.clone(),
                    second: right.id.clone(),
                    ratio,
                });
            }
        }
    }

    AuditReport {
        entries: entries.len(),
        threshold,
        violations,
    }
}
