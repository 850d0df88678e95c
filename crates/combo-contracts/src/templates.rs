use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// On-disk structural template: only the id and the raw markup are stored,
/// everything else is derived when the catalog is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub id: String,
    pub markup: String,
}

/// One JSON file per category under a templates directory.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, category: &str) -> PathBuf {
        self.dir.join(format!("{}.json", category_slug(category)))
    }

    /// `Ok(None)` when the file is missing, blank, or holds an empty array.
    /// Any other failure is a configuration error and is returned as-is.
    pub fn load(&self, category: &str) -> anyhow::Result<Option<Vec<TemplateRecord>>> {
        let path = self.path_for(category);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(err).with_context(|| {
                    format!("failed reading templates for '{category}' ({})", path.display())
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let records: Vec<TemplateRecord> = serde_json::from_str(&raw).with_context(|| {
            format!("invalid template file for '{category}' ({})", path.display())
        })?;
        if records.is_empty() {
            return Ok(None);
        }
        Ok(Some(records))
    }

    pub fn save(&self, category: &str, records: &[TemplateRecord]) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed creating {}", self.dir.display()))?;
        let path = self.path_for(category);
        std::fs::write(&path, serde_json::to_string_pretty(records)?)
            .with_context(|| format!("failed writing {}", path.display()))?;
        Ok(())
    }
}

/// `"E-commerce Product"` -> `"e-commerce-product"`.
pub fn category_slug(category: &str) -> String {
    let mut slug = String::with_capacity(category.len());
    for ch in category.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "category".to_string()
    } else {
        slug
    }
}
