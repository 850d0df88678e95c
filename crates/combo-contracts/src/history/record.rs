use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema version stamped on every record written by this crate.
///
/// Version 1 files predate the field and may lack `comboHash`, `variantHash`,
/// `styleClassTokens` or `structureSignature`; they are upgraded on load.
pub const HISTORY_SCHEMA_VERSION: u32 = 2;

/// Flattened on-disk shape of a [`super::CombinationEntry`].
///
/// Every field is optional so that older history files still parse; the engine
/// decides at load time which gaps can be recomputed and which records are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub structure_id: Option<String>,
    #[serde(default)]
    pub structure_signature: Option<Vec<String>>,
    #[serde(default, alias = "style")]
    pub style_label: Option<String>,
    #[serde(default)]
    pub theme_name: Option<String>,
    #[serde(default)]
    pub palette_name: Option<String>,
    #[serde(default)]
    pub style_class_tokens: Option<Vec<String>>,
    #[serde(default)]
    pub class_tokens: Option<Vec<String>>,
    #[serde(default)]
    pub combo_hash: Option<String>,
    #[serde(default)]
    pub variant_hash: Option<String>,
    #[serde(default)]
    pub markup: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Keys this schema does not know about, written back verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HistoryRecord {
    pub fn is_current(&self) -> bool {
        self.schema_version
            .map(|version| version >= HISTORY_SCHEMA_VERSION)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::HistoryRecord;

    #[test]
    fn legacy_record_parses_with_gaps() -> anyhow::Result<()> {
        let record: HistoryRecord = serde_json::from_value(json!({
            "id": "legacy-1",
            "category": "Blog Layout",
            "structureId": "blog-layout-02",
            "style": "Editorial Serif / Ink",
            "classTokens": ["font-serif", "prose"],
        }))?;
        assert!(!record.is_current());
        assert_eq!(record.style_label.as_deref(), Some("Editorial Serif / Ink"));
        assert_eq!(record.combo_hash, None);
        assert_eq!(record.structure_signature, None);
        assert_eq!(
            record.class_tokens,
            Some(vec!["font-serif".to_string(), "prose".to_string()])
        );
        Ok(())
    }

    #[test]
    fn record_serializes_camel_case_fields() -> anyhow::Result<()> {
        let record = HistoryRecord {
            schema_version: Some(2),
            structure_id: Some("dashboard-01".to_string()),
            combo_hash: Some("ff".to_string()),
            ..HistoryRecord::default()
        };
        let value = serde_json::to_value(&record)?;
        assert_eq!(value["schemaVersion"], json!(2));
        assert_eq!(value["structureId"], json!("dashboard-01"));
        assert_eq!(value["comboHash"], json!("ff"));
        assert!(record.is_current());
        Ok(())
    }

    #[test]
    fn unknown_keys_survive_a_round_trip() -> anyhow::Result<()> {
        let record: HistoryRecord = serde_json::from_value(json!({
            "id": "old",
            "category": "Blog Layout",
            "title": "Keep me",
            "tags": ["x"],
        }))?;
        assert_eq!(record.extra.get("title"), Some(&json!("Keep me")));
        assert!(!record.extra.contains_key("category"));

        let value = serde_json::to_value(&record)?;
        assert_eq!(value["title"], json!("Keep me"));
        assert_eq!(value["tags"], json!(["x"]));
        assert_eq!(value["category"], json!("Blog Layout"));
        Ok(())
    }
}
