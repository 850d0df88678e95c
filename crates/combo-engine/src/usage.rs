use combo_contracts::history::CombinationEntry;
use indexmap::IndexMap;
use rand::Rng;

use crate::catalog::{StructuralTemplate, StructureCatalog};
use crate::select::pick_preferring;

/// `usage[category][structure_id]`, zero for anything unseen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageTracker {
    counts: IndexMap<String, IndexMap<String, u64>>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_history(entries: &[CombinationEntry]) -> Self {
        let mut tracker = Self::new();
        for entry in entries {
            tracker.record(&entry.category, &entry.structure_id);
        }
        tracker
    }

    pub fn record(&mut self, category: &str, structure_id: &str) {
        *self
            .counts
            .entry(category.to_string())
            .or_default()
            .entry(structure_id.to_string())
            .or_insert(0) += 1;
    }

    pub fn count(&self, category: &str, structure_id: &str) -> u64 {
        self.counts
            .get(category)
            .and_then(|per_template| per_template.get(structure_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn has_unused(&self, category: &str, templates: &[StructuralTemplate]) -> bool {
        templates
            .iter()
            .any(|template| self.count(category, &template.id) == 0)
    }

    /// Prefers categories holding at least one never-used template, falling back
    /// to any non-empty category. `None` when every category is empty.
    pub fn select_category<'c, R: Rng + ?Sized>(
        &self,
        catalog: &'c StructureCatalog,
        rng: &mut R,
    ) -> Option<&'c str> {
        let non_empty: Vec<&str> = catalog
            .categories()
            .filter(|category| !catalog.templates(category).is_empty())
            .collect();
        pick_preferring(
            &non_empty,
            |category| self.has_unused(category, catalog.templates(category)),
            rng,
        )
        .copied()
    }

    /// Prefers never-used templates, falling back to the whole pool.
    pub fn select_structure<'c, R: Rng + ?Sized>(
        &self,
        category: &str,
        templates: &'c [StructuralTemplate],
        rng: &mut R,
    ) -> Option<&'c StructuralTemplate> {
        pick_preferring(
            templates,
            |template| self.count(category, &template.id) == 0,
            rng,
        )
    }

    /// Per-category report against the current catalog, including ids that no
    /// longer exist in it.
    pub fn report(&self, catalog: &StructureCatalog) -> Vec<CategoryUsage> {
        let mut rows = Vec::new();
        for category in catalog.categories() {
            let templates = catalog.templates(category);
            let per_template: Vec<(String, u64)> = templates
                .iter()
                .map(|template| (template.id.clone(), self.count(category, &template.id)))
                .collect();
            let stale_ids = self
                .counts
                .get(category)
                .map(|seen| {
                    seen.keys()
                        .filter(|id| catalog.template(category, id).is_none())
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            rows.push(CategoryUsage {
                category: category.to_string(),
                unused: per_template.iter().filter(|(_, uses)| *uses == 0).count(),
                per_template,
                stale_ids,
            });
        }
        for (category, seen) in &self.counts {
            let listed = rows.iter().any(|row| &row.category == category);
            if catalog.templates(category).is_empty() && !listed {
                rows.push(CategoryUsage {
                    category: category.clone(),
                    per_template: Vec::new(),
                    unused: 0,
                    stale_ids: seen.keys().cloned().collect(),
                });
            }
        }
        rows
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryUsage {
    pub category: String,
    pub per_template: Vec<(String, u64)>,
    pub unused: usize,
    /// Ids recorded in history that the current catalog does not contain.
    pub stale_ids: Vec<String>,
}
