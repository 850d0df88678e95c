use std::collections::BTreeSet;

use anyhow::Result;
use combo_contracts::templates::{category_slug, TemplateRecord, TemplateStore};
use indexmap::IndexMap;
use rand::seq::SliceRandom;
use rand::Rng;

use super::blocks::{render_block, LAYOUT_BLOCKS, MAX_BLOCKS_PER_TEMPLATE, MIN_BLOCKS_PER_TEMPLATE};
use crate::signature::{extract_class_tokens, extract_signature, Signature};

pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Landing Page",
    "Dashboard",
    "Portfolio",
    "Pricing Page",
    "Blog Layout",
    "E-commerce Product",
    "SaaS Onboarding",
    "Documentation",
];

pub const DEFAULT_TEMPLATES_PER_CATEGORY: usize = 12;

/// A markup skeleton with its derived fingerprint, fixed for the life of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuralTemplate {
    pub id: String,
    pub markup: String,
    pub signature: Signature,
    pub base_class_tokens: BTreeSet<String>,
}

impl StructuralTemplate {
    pub fn new(id: impl Into<String>, markup: impl Into<String>) -> Self {
        let markup = markup.into();
        Self {
            id: id.into(),
            signature: extract_signature(&markup),
            base_class_tokens: extract_class_tokens(&markup),
            markup,
        }
    }

    fn from_record(record: TemplateRecord) -> Self {
        Self::new(record.id, record.markup)
    }
}

/// Templates per category, in category declaration order.
#[derive(Debug, Clone, Default)]
pub struct StructureCatalog {
    categories: IndexMap<String, Vec<StructuralTemplate>>,
    bootstrapped: Vec<String>,
}

impl StructureCatalog {
    pub fn new(categories: IndexMap<String, Vec<StructuralTemplate>>) -> Self {
        Self {
            categories,
            bootstrapped: Vec::new(),
        }
    }

    /// Loads every category from `store`, synthesizing and persisting
    /// `templates_per_category` templates for any category whose file is
    /// missing or empty. Read failures other than "missing" abort the load.
    pub fn load_or_bootstrap<R: Rng + ?Sized>(
        store: &TemplateStore,
        categories: &[String],
        templates_per_category: usize,
        rng: &mut R,
    ) -> Result<Self> {
        let mut catalog = Self::default();
        for category in categories {
            let records = match store.load(category)? {
                Some(records) => records,
                None => {
                    let records = synthesize_templates(category, templates_per_category, rng);
                    store.save(category, &records)?;
                    catalog.bootstrapped.push(category.clone());
                    records
                }
            };
            let templates = records
                .into_iter()
                .map(StructuralTemplate::from_record)
                .collect();
            catalog.categories.insert(category.clone(), templates);
        }
        Ok(catalog)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn templates(&self, category: &str) -> &[StructuralTemplate] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn template(&self, category: &str, id: &str) -> Option<&StructuralTemplate> {
        self.templates(category)
            .iter()
            .find(|template| template.id == id)
    }

    /// Categories that were synthesized during this load.
    pub fn bootstrapped(&self) -> &[String] {
        &self.bootstrapped
    }

    pub fn template_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }
}

/// Builds `count` templates from randomly sampled layout blocks.
pub fn synthesize_templates<R: Rng + ?Sized>(
    category: &str,
    count: usize,
    rng: &mut R,
) -> Vec<TemplateRecord> {
    let slug = category_slug(category);
    let mut order: Vec<usize> = (0..LAYOUT_BLOCKS.len()).collect();
    (1..=count)
        .map(|index| {
            order.shuffle(rng);
            let blocks = rng.random_range(MIN_BLOCKS_PER_TEMPLATE..=MAX_BLOCKS_PER_TEMPLATE);
            let body: String = order
                .iter()
                .take(blocks)
                .map(|idx| render_block(LAYOUT_BLOCKS[*idx], category, index))
                .collect();
            TemplateRecord {
                id: format!("{slug}-{index:02}"),
                markup: format!(r#"<main class="layout-root" data-category="{slug}">{body}</main>"#),
            }
        })
        .collect()
}
