//! Load-time upgrade of persisted history records to [`CombinationEntry`].

use std::collections::BTreeSet;

use combo_contracts::history::{CombinationEntry, HistoryRecord, StyleVariant};

use crate::hashing::class_set_hash;
use crate::signature::{extract_class_tokens, extract_signature};

#[derive(Debug, Clone, Default)]
pub struct MigrationOutcome {
    pub entries: Vec<CombinationEntry>,
    /// Records that needed at least one field recomputed.
    pub upgraded: usize,
    /// `(position, reason)` for records that could not be used at all.
    pub dropped: Vec<(usize, String)>,
    /// History in its original order, upgraded where possible. Dropped records
    /// are kept untouched so a rewrite never loses them.
    pub records: Vec<HistoryRecord>,
}

pub fn migrate_records(records: Vec<HistoryRecord>) -> MigrationOutcome {
    let mut outcome = MigrationOutcome::default();
    for (position, record) in records.into_iter().enumerate() {
        match migrate_record(position, record.clone()) {
            Ok((entry, upgraded)) => {
                if upgraded {
                    outcome.upgraded += 1;
                }
                let mut rewritten = entry.to_record();
                rewritten.extra = record.extra;
                outcome.records.push(rewritten);
                outcome.entries.push(entry);
            }
            Err(reason) => {
                outcome.dropped.push((position, reason));
                outcome.records.push(record);
            }
        }
    }
    outcome
}

fn migrate_record(
    position: usize,
    record: HistoryRecord,
) -> Result<(CombinationEntry, bool), String> {
    let mut upgraded = !record.is_current();

    let category = non_empty(record.category).ok_or_else(|| "missing category".to_string())?;
    let structure_id =
        non_empty(record.structure_id).ok_or_else(|| "missing structureId".to_string())?;
    let markup = record.markup.unwrap_or_default();

    let structure_signature = match record.structure_signature {
        Some(signature) => signature,
        None => {
            upgraded = true;
            extract_signature(&markup)
        }
    };

    let style_tokens: BTreeSet<String> = record
        .style_class_tokens
        .unwrap_or_default()
        .into_iter()
        .collect();
    let class_tokens: BTreeSet<String> = match record.class_tokens {
        Some(tokens) => tokens.into_iter().collect(),
        None => {
            upgraded = true;
            let mut tokens = extract_class_tokens(&markup);
            tokens.extend(style_tokens.iter().cloned());
            tokens
        }
    };

    let combo_hash = match non_empty(record.combo_hash) {
        Some(hash) => hash,
        None => {
            upgraded = true;
            class_set_hash(&class_tokens)
        }
    };
    let variant_hash = match non_empty(record.variant_hash) {
        Some(hash) => hash,
        None if !style_tokens.is_empty() => {
            upgraded = true;
            class_set_hash(&style_tokens)
        }
        None => String::new(),
    };

    let theme_name = record.theme_name.unwrap_or_default();
    let palette_name = record.palette_name.unwrap_or_default();
    let label = non_empty(record.style_label).unwrap_or_else(|| {
        if theme_name.is_empty() {
            "Unknown style".to_string()
        } else {
            format!("{theme_name} / {palette_name}")
        }
    });

    let entry = CombinationEntry {
        id: non_empty(record.id).unwrap_or_else(|| format!("legacy-{}", position + 1)),
        timestamp: record.timestamp.unwrap_or_default(),
        category,
        structure_id,
        structure_signature,
        style: StyleVariant {
            label,
            theme_name,
            palette_name,
            class_tokens: style_tokens,
        },
        class_tokens,
        combo_hash,
        variant_hash,
        markup,
        description: record.description.unwrap_or_default(),
    };
    Ok((entry, upgraded))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
