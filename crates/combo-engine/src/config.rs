use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

use crate::annotate::{
    Annotator, HttpAnnotator, OfflineAnnotator, DEFAULT_ANNOTATOR_MODEL, DEFAULT_ANNOTATOR_URL,
};
use crate::catalog::{DEFAULT_CATEGORIES, DEFAULT_TEMPLATES_PER_CATEGORY};
use crate::engine::EngineSettings;

pub const DEFAULT_DATA_DIR: &str = "combo-data";

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatorConfig {
    pub offline: bool,
    pub url: String,
    pub model: String,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            offline: false,
            url: DEFAULT_ANNOTATOR_URL.to_string(),
            model: DEFAULT_ANNOTATOR_MODEL.to_string(),
        }
    }
}

/// Settings for one generator invocation.
///
/// Built from defaults, then [`GeneratorConfig::apply_env`], then command-line
/// flags applied by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub data_dir: PathBuf,
    pub categories: Vec<String>,
    pub templates_per_category: usize,
    pub engine: EngineSettings,
    pub seed: Option<u64>,
    /// Overrides `<data_dir>/runs/<run_id>/combos.json`.
    pub output: Option<PathBuf>,
    pub annotator: AnnotatorConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            templates_per_category: DEFAULT_TEMPLATES_PER_CATEGORY,
            engine: EngineSettings::default(),
            seed: None,
            output: None,
            annotator: AnnotatorConfig::default(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// `COMBO_DATA_DIR`, `COMBO_ANNOTATOR_URL`, `COMBO_ANNOTATOR_MODEL`.
    pub fn apply_env(&mut self) {
        if let Some(dir) = non_empty_env("COMBO_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(url) = non_empty_env("COMBO_ANNOTATOR_URL") {
            self.annotator.url = url;
        }
        if let Some(model) = non_empty_env("COMBO_ANNOTATOR_MODEL") {
            self.annotator.model = model;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.engine.required == 0 {
            bail!("count must be at least 1");
        }
        if self.engine.attempts_multiplier == 0 {
            bail!("attempts multiplier must be at least 1");
        }
        let threshold = self.engine.similarity_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            bail!("similarity threshold must be in (0, 1], got {threshold}");
        }
        if self.engine.variant_retry_budget == 0 {
            bail!("variant retry budget must be at least 1");
        }
        if self.templates_per_category == 0 {
            bail!("templates per category must be at least 1");
        }
        if self.categories.iter().all(|category| category.trim().is_empty()) {
            bail!("at least one category is required");
        }
        Ok(())
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.data_dir.join("templates")
    }

    pub fn history_path(&self) -> PathBuf {
        self.data_dir.join("history.json")
    }

    pub fn runs_dir(&self) -> PathBuf {
        self.data_dir.join("runs")
    }

    pub fn run_dir(&self, run_id: &str) -> PathBuf {
        self.runs_dir().join(run_id)
    }

    pub fn output_path(&self, run_dir: &Path) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| run_dir.join("combos.json"))
    }

    pub fn build_annotator(&self) -> Box<dyn Annotator> {
        if self.annotator.offline {
            Box::new(OfflineAnnotator)
        } else {
            Box::new(HttpAnnotator::new(
                self.annotator.url.clone(),
                self.annotator.model.clone(),
            ))
        }
    }
}

pub(crate) fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
