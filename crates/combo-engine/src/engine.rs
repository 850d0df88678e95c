use std::collections::{BTreeMap, BTreeSet};

use combo_contracts::events::{EventPayload, RunEventLog};
use combo_contracts::history::{CombinationEntry, StyleVariant};
use rand::Rng;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::annotate::{annotate, AnnotationRequest, AnnotationSource, Annotator};
use crate::catalog::{StructuralTemplate, StructureCatalog, StyleCatalog};
use crate::hashing::class_set_hash;
use crate::registries::Registries;
use crate::select::select_unique;
use crate::similarity::{is_near_duplicate, DEFAULT_SIMILARITY_THRESHOLD};

pub const DEFAULT_REQUIRED_COMBOS: usize = 10;
pub const DEFAULT_ATTEMPTS_MULTIPLIER: usize = 12;
pub const DEFAULT_VARIANT_RETRY_BUDGET: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    pub required: usize,
    pub attempts_multiplier: usize,
    pub similarity_threshold: f64,
    pub variant_retry_budget: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            required: DEFAULT_REQUIRED_COMBOS,
            attempts_multiplier: DEFAULT_ATTEMPTS_MULTIPLIER,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            variant_retry_budget: DEFAULT_VARIANT_RETRY_BUDGET,
        }
    }
}

impl EngineSettings {
    pub fn max_attempts(&self) -> usize {
        self.required.saturating_mul(self.attempts_multiplier)
    }
}

/// Routine per-attempt outcomes; each consumes one attempt of the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RejectReason {
    NoStructure,
    NearDuplicate,
    ComboCollision,
}

impl RejectReason {
    pub const ALL: [Self; 3] = [Self::NoStructure, Self::NearDuplicate, Self::ComboCollision];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoStructure => "no_structure",
            Self::NearDuplicate => "near_duplicate",
            Self::ComboCollision => "combo_collision",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    AttemptsExhausted,
    NoEligibleCategory,
    StyleSpaceExhausted,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TargetReached => "target_reached",
            Self::AttemptsExhausted => "attempts_exhausted",
            Self::NoEligibleCategory => "no_eligible_category",
            Self::StyleSpaceExhausted => "style_space_exhausted",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub accepted: Vec<CombinationEntry>,
    pub attempts: usize,
    pub max_attempts: usize,
    pub stop_reason: StopReason,
    pub rejections: BTreeMap<RejectReason, usize>,
    pub fallback_descriptions: usize,
    /// Event-log writes that failed during the loop. They never stop a run.
    pub event_errors: Vec<String>,
}

impl RunReport {
    pub fn rejected(&self, reason: RejectReason) -> usize {
        self.rejections.get(&reason).copied().unwrap_or(0)
    }
}

enum Attempt {
    Accepted {
        entry: Box<CombinationEntry>,
        fallback: bool,
    },
    Rejected(RejectReason),
    Stop(StopReason),
}

/// Sequential selection loop over the structure and style catalogs.
///
/// Owns the run's [`Registries`]; nothing else may mutate them while a run is in
/// progress.
pub struct CombinationEngine<'a, R: Rng> {
    catalog: &'a StructureCatalog,
    styles: &'a StyleCatalog,
    annotator: &'a dyn Annotator,
    registries: Registries,
    settings: EngineSettings,
    events: RunEventLog,
    rng: R,
    event_errors: Vec<String>,
}

impl<'a, R: Rng> CombinationEngine<'a, R> {
    pub fn new(
        catalog: &'a StructureCatalog,
        styles: &'a StyleCatalog,
        annotator: &'a dyn Annotator,
        registries: Registries,
        settings: EngineSettings,
        events: RunEventLog,
        rng: R,
    ) -> Self {
        Self {
            catalog,
            styles,
            annotator,
            registries,
            settings,
            events,
            rng,
            event_errors: Vec::new(),
        }
    }

    pub fn run(&mut self) -> RunReport {
        self.run_with(|_| {})
    }

    /// Runs until the target count, the attempt budget, or an exhaustion
    /// condition is reached. `on_accept` sees each entry as it is accepted.
    pub fn run_with<F>(&mut self, mut on_accept: F) -> RunReport
    where
        F: FnMut(&CombinationEntry),
    {
        let mut report = RunReport {
            accepted: Vec::new(),
            attempts: 0,
            max_attempts: self.settings.max_attempts(),
            stop_reason: StopReason::AttemptsExhausted,
            rejections: BTreeMap::new(),
            fallback_descriptions: 0,
            event_errors: Vec::new(),
        };

        report.stop_reason = loop {
            if report.accepted.len() >= self.settings.required {
                break StopReason::TargetReached;
            }
            if report.attempts >= report.max_attempts {
                break StopReason::AttemptsExhausted;
            }
            report.attempts += 1;
            match self.attempt() {
                Attempt::Accepted { entry, fallback } => {
                    if fallback {
                        report.fallback_descriptions += 1;
                    }
                    on_accept(&entry);
                    report.accepted.push(*entry);
                }
                Attempt::Rejected(reason) => {
                    *report.rejections.entry(reason).or_insert(0) += 1;
                }
                Attempt::Stop(reason) => break reason,
            }
        };
        report.event_errors = std::mem::take(&mut self.event_errors);
        report
    }

    fn attempt(&mut self) -> Attempt {
        let catalog = self.catalog;
        let Some(category) = self.registries.usage().select_category(catalog, &mut self.rng)
        else {
            return Attempt::Stop(StopReason::NoEligibleCategory);
        };
        let Some(template) = self.registries.usage().select_structure(
            category,
            catalog.templates(category),
            &mut self.rng,
        ) else {
            return Attempt::Rejected(RejectReason::NoStructure);
        };

        let similarity = self.registries.max_similarity(&template.signature);
        if is_near_duplicate(similarity, self.settings.similarity_threshold) {
            return Attempt::Rejected(RejectReason::NearDuplicate);
        }

        let styles = self.styles;
        let registries = &self.registries;
        let rng = &mut self.rng;
        let variant = select_unique(
            || {
                styles.sample_variant(&mut *rng).map(|variant| {
                    let hash = class_set_hash(&variant.class_tokens);
                    (variant, hash)
                })
            },
            |(_, hash)| registries.has_variant(hash),
            self.settings.variant_retry_budget,
        );
        let Some((style, variant_hash)) = variant else {
            let retries = self.settings.variant_retry_budget;
            self.emit(
                "style_space_exhausted",
                map_object(json!({
                    "category": category,
                    "structure_id": template.id,
                    "retries": retries,
                })),
            );
            return Attempt::Stop(StopReason::StyleSpaceExhausted);
        };

        let class_tokens: BTreeSet<String> = template
            .base_class_tokens
            .union(&style.class_tokens)
            .cloned()
            .collect();
        let combo_hash = class_set_hash(&class_tokens);
        if self.registries.has_combo(&combo_hash) {
            return Attempt::Rejected(RejectReason::ComboCollision);
        }

        let token_list: Vec<String> = class_tokens.iter().cloned().collect();
        let annotation = annotate(
            self.annotator,
            &AnnotationRequest {
                category,
                style_label: &style.label,
                markup: &template.markup,
                class_tokens: &token_list,
            },
        );
        let fallback = annotation.is_fallback();
        if let AnnotationSource::Fallback { reason } = &annotation.source {
            self.emit(
                "annotation_fallback",
                map_object(json!({
                    "category": category,
                    "style_label": style.label,
                    "reason": reason,
                })),
            );
        }

        let entry = build_entry(
            category,
            template,
            style,
            class_tokens,
            combo_hash,
            variant_hash,
            annotation.text,
        );
        self.registries.register(&entry);
        self.emit(
            "combo_accepted",
            map_object(json!({
                "id": entry.id,
                "category": entry.category,
                "structure_id": entry.structure_id,
                "style_label": entry.style.label,
                "combo_hash": entry.combo_hash,
                "variant_hash": entry.variant_hash,
                "max_similarity": similarity,
                "fallback_description": fallback,
            })),
        );
        Attempt::Accepted {
            entry: Box::new(entry),
            fallback,
        }
    }

    fn emit(&mut self, event_type: &str, payload: EventPayload) {
        if let Err(err) = self.events.emit(event_type, payload) {
            self.event_errors.push(format!("{event_type}: {err:#}"));
        }
    }
}

fn build_entry(
    category: &str,
    template: &StructuralTemplate,
    style: StyleVariant,
    class_tokens: BTreeSet<String>,
    combo_hash: String,
    variant_hash: String,
    description: String,
) -> CombinationEntry {
    CombinationEntry {
        id: Uuid::new_v4().to_string(),
        timestamp: now_utc_iso(),
        category: category.to_string(),
        structure_id: template.id.clone(),
        structure_signature: template.signature.clone(),
        style,
        class_tokens,
        combo_hash,
        variant_hash,
        markup: template.markup.clone(),
        description,
    }
}

pub(crate) fn map_object(value: Value) -> EventPayload {
    value.as_object().cloned().unwrap_or_default()
}

pub(crate) fn now_utc_iso() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use anyhow::{anyhow, Result};
    use combo_contracts::events::RunEventLog;
    use combo_contracts::history::{CombinationEntry, StyleVariant};
    use indexmap::IndexMap;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{CombinationEngine, EngineSettings, RejectReason, StopReason};
    use crate::annotate::{fallback_description, Annotator};
    use crate::catalog::{
        DecorativePools, Palette, StructuralTemplate, StructureCatalog, StyleCatalog, StyleTheme,
    };
    use crate::hashing::class_set_hash;
    use crate::registries::Registries;
    use crate::similarity::similarity;

    const HERO: &str = r#"<div class="hero"><h1>Hi</h1></div>"#;
    const PRICING: &str =
        r#"<section class="pricing"><ul><li>Basic</li></ul><p>Billed yearly</p></section>"#;

    struct DownAnnotator;

    impl Annotator for DownAnnotator {
        fn name(&self) -> &str {
            "down"
        }

        fn generate(&self, _prompt: &str) -> Result<String> {
            Err(anyhow!("connection refused"))
        }
    }

    struct FixedAnnotator;

    impl Annotator for FixedAnnotator {
        fn name(&self) -> &str {
            "fixed"
        }

        fn generate(&self, _prompt: &str) -> Result<String> {
            Ok("A quiet hero layout.".to_string())
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    fn catalog(category: &str, templates: &[(&str, &str)]) -> StructureCatalog {
        let mut categories = IndexMap::new();
        categories.insert(
            category.to_string(),
            templates
                .iter()
                .map(|(id, markup)| StructuralTemplate::new(*id, *markup))
                .collect(),
        );
        StructureCatalog::new(categories)
    }

    fn single_style() -> StyleCatalog {
        StyleCatalog::new(
            vec![StyleTheme {
                name: "Mono".to_string(),
                typography: strings(&["font-sans"]),
                palettes: vec![Palette {
                    name: "Plain".to_string(),
                    background: "bg-white".to_string(),
                    accent: "text-black".to_string(),
                }],
                surfaces: strings(&["shadow-none"]),
                spacing: strings(&["p-4"]),
            }],
            DecorativePools {
                radius: strings(&["rounded-md"]),
                gradient_directions: Vec::new(),
                gradient_stops: Vec::new(),
                glows: Vec::new(),
                layouts: strings(&["gap-4"]),
            },
        )
    }

    fn single_style_tokens() -> BTreeSet<String> {
        ["font-sans", "bg-white", "text-black", "shadow-none", "p-4", "rounded-md", "gap-4"]
            .iter()
            .map(|token| token.to_string())
            .collect()
    }

    fn settings(required: usize) -> EngineSettings {
        EngineSettings {
            required,
            ..EngineSettings::default()
        }
    }

    fn engine<'a>(
        catalog: &'a StructureCatalog,
        styles: &'a StyleCatalog,
        annotator: &'a dyn Annotator,
        registries: Registries,
        required: usize,
    ) -> CombinationEngine<'a, StdRng> {
        CombinationEngine::new(
            catalog,
            styles,
            annotator,
            registries,
            settings(required),
            RunEventLog::discard("test-run"),
            StdRng::seed_from_u64(7),
        )
    }

    fn history_entry(
        signature: &[&str],
        combo_hash: String,
        variant_hash: String,
    ) -> CombinationEntry {
        CombinationEntry {
            id: "h-1".to_string(),
            timestamp: String::new(),
            category: "Landing Page".to_string(),
            structure_id: "retired".to_string(),
            structure_signature: strings(signature),
            style: StyleVariant {
                label: "Mono / Plain".to_string(),
                theme_name: "Mono".to_string(),
                palette_name: "Plain".to_string(),
                class_tokens: BTreeSet::new(),
            },
            class_tokens: BTreeSet::new(),
            combo_hash,
            variant_hash,
            markup: String::new(),
            description: String::new(),
        }
    }

    #[test]
    fn landing_page_pair_uses_both_templates_with_fallback_text() -> Result<()> {
        let catalog = catalog("Landing Page", &[("T1", HERO), ("T2", PRICING)]);
        let styles = StyleCatalog::default();
        let mut engine = engine(&catalog, &styles, &DownAnnotator, Registries::default(), 2);
        let report = engine.run();

        assert_eq!(report.stop_reason, StopReason::TargetReached);
        assert_eq!(report.attempts, 2);
        assert_eq!(report.fallback_descriptions, 2);
        let ids: BTreeSet<&str> = report
            .accepted
            .iter()
            .map(|entry| entry.structure_id.as_str())
            .collect();
        assert_eq!(ids, BTreeSet::from(["T1", "T2"]));

        for entry in &report.accepted {
            let template = catalog
                .template("Landing Page", &entry.structure_id)
                .ok_or_else(|| anyhow!("unknown template"))?;
            let expected: BTreeSet<String> = template
                .base_class_tokens
                .union(&entry.style.class_tokens)
                .cloned()
                .collect();
            assert_eq!(entry.class_tokens, expected);
            assert_eq!(entry.combo_hash, class_set_hash(&expected));
            assert_eq!(entry.variant_hash, class_set_hash(&entry.style.class_tokens));
            assert_eq!(
                entry.description,
                fallback_description("Landing Page", &entry.style.label)
            );
            assert!(!entry.description.is_empty());
        }
        Ok(())
    }

    #[test]
    fn single_request_picks_either_bare_template() -> Result<()> {
        let catalog = catalog(
            "Landing Page",
            &[("T1", "<div><h1/></div>"), ("T2", "<section><p/><p/></section>")],
        );
        let styles = StyleCatalog::default();
        let mut engine = engine(&catalog, &styles, &DownAnnotator, Registries::default(), 1);
        let report = engine.run();

        assert_eq!(report.accepted.len(), 1);
        let entry = &report.accepted[0];
        assert!(entry.structure_id == "T1" || entry.structure_id == "T2");
        assert_eq!(entry.class_tokens, entry.style.class_tokens);
        assert_eq!(entry.combo_hash, class_set_hash(&entry.style.class_tokens));
        assert!(!entry.description.is_empty());
        Ok(())
    }

    #[test]
    fn generated_description_is_used_verbatim() -> Result<()> {
        let catalog = catalog("Landing Page", &[("T1", HERO)]);
        let styles = StyleCatalog::default();
        let mut engine = engine(&catalog, &styles, &FixedAnnotator, Registries::default(), 1);
        let report = engine.run();

        let entry = &report.accepted[0];
        assert_eq!(entry.description, "A quiet hero layout.");
        assert_eq!(report.fallback_descriptions, 0);
        assert!(report.event_errors.is_empty());
        let registries = Registries::from_history(&report.accepted);
        assert!(registries.has_combo(&entry.combo_hash));
        assert!(registries.has_variant(&entry.variant_hash));
        assert_eq!(registries.usage().count("Landing Page", "T1"), 1);
        Ok(())
    }

    #[test]
    fn event_log_failures_do_not_abort_the_run() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let blocker = temp.path().join("not-a-dir");
        std::fs::write(&blocker, "")?;
        let catalog = catalog("Landing Page", &[("T1", HERO), ("T2", PRICING)]);
        let styles = StyleCatalog::default();
        let mut engine = CombinationEngine::new(
            &catalog,
            &styles,
            &DownAnnotator,
            Registries::default(),
            settings(2),
            RunEventLog::new(blocker.join("events.jsonl"), "test-run"),
            StdRng::seed_from_u64(5),
        );
        let report = engine.run();

        assert_eq!(report.accepted.len(), 2);
        assert_eq!(report.stop_reason, StopReason::TargetReached);
        assert_eq!(report.event_errors.len(), 4);
        assert!(report.event_errors[0].starts_with("annotation_fallback: "));
        Ok(())
    }

    #[test]
    fn constrained_space_terminates_within_budget() -> Result<()> {
        let catalog = catalog("Landing Page", &[("T1", HERO)]);
        let styles = single_style();
        let mut engine = engine(&catalog, &styles, &DownAnnotator, Registries::default(), 10);
        let report = engine.run();

        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.max_attempts, 120);
        assert_eq!(report.attempts, 120);
        assert_eq!(report.stop_reason, StopReason::AttemptsExhausted);
        assert_eq!(report.rejected(RejectReason::NearDuplicate), 119);
        Ok(())
    }

    #[test]
    fn exhausted_style_space_stops_the_run() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let events_path = temp.path().join("events.jsonl");
        let catalog = catalog("Landing Page", &[("T1", HERO), ("T2", PRICING)]);
        let styles = single_style();
        let mut engine = CombinationEngine::new(
            &catalog,
            &styles,
            &DownAnnotator,
            Registries::default(),
            settings(10),
            RunEventLog::new(events_path.clone(), "test-run"),
            StdRng::seed_from_u64(3),
        );
        let report = engine.run();

        assert_eq!(report.accepted.len(), 1);
        assert_eq!(report.attempts, 2);
        assert_eq!(report.stop_reason, StopReason::StyleSpaceExhausted);
        let events = std::fs::read_to_string(&events_path)?;
        assert!(events.contains(r#""type":"annotation_fallback""#));
        assert!(events.contains(r#""type":"combo_accepted""#));
        assert!(events.contains(r#""type":"style_space_exhausted""#));
        Ok(())
    }

    #[test]
    fn history_variant_blocks_the_only_style() -> Result<()> {
        let catalog = catalog("Landing Page", &[("T1", HERO)]);
        let styles = single_style();
        let registries = Registries::from_history(&[history_entry(
            &["0:nav"],
            "unrelated".to_string(),
            class_set_hash(&single_style_tokens()),
        )]);
        let mut engine = engine(&catalog, &styles, &DownAnnotator, registries, 3);
        let report = engine.run();
        assert!(report.accepted.is_empty());
        assert_eq!(report.stop_reason, StopReason::StyleSpaceExhausted);
        Ok(())
    }

    #[test]
    fn history_combo_hash_is_rejected() -> Result<()> {
        let catalog = catalog("Landing Page", &[("T1", HERO)]);
        let styles = single_style();
        let mut combined = single_style_tokens();
        combined.insert("hero".to_string());
        let registries = Registries::from_history(&[history_entry(
            &["0:nav"],
            class_set_hash(&combined),
            "some-other-variant".to_string(),
        )]);
        let mut engine = engine(&catalog, &styles, &DownAnnotator, registries, 2);
        let report = engine.run();
        assert!(report.accepted.is_empty());
        assert_eq!(report.stop_reason, StopReason::AttemptsExhausted);
        assert_eq!(report.rejected(RejectReason::ComboCollision), 24);
        Ok(())
    }

    #[test]
    fn empty_catalog_has_no_eligible_category() -> Result<()> {
        let catalog = catalog("Landing Page", &[]);
        let styles = StyleCatalog::default();
        let mut engine = engine(&catalog, &styles, &DownAnnotator, Registries::default(), 5);
        let report = engine.run();
        assert!(report.accepted.is_empty());
        assert_eq!(report.attempts, 1);
        assert_eq!(report.stop_reason, StopReason::NoEligibleCategory);
        Ok(())
    }

    #[test]
    fn runs_seeded_from_history_never_duplicate() -> Result<()> {
        let mut rng = StdRng::seed_from_u64(19);
        let mut categories = IndexMap::new();
        for category in ["Dashboard", "Portfolio"] {
            let templates = crate::catalog::synthesize_templates(category, 8, &mut rng)
                .into_iter()
                .map(|record| StructuralTemplate::new(record.id, record.markup))
                .collect();
            categories.insert(category.to_string(), templates);
        }
        let catalog = StructureCatalog::new(categories);
        let styles = StyleCatalog::default();

        let first = engine(&catalog, &styles, &DownAnnotator, Registries::default(), 6).run();
        let registries = Registries::from_history(&first.accepted);
        let second = engine(&catalog, &styles, &DownAnnotator, registries, 6).run();

        let all: Vec<&CombinationEntry> =
            first.accepted.iter().chain(second.accepted.iter()).collect();
        assert!(!all.is_empty());
        for (index, left) in all.iter().enumerate() {
            for right in &all[index + 1..] {
                assert_ne!(left.combo_hash, right.combo_hash);
                assert_ne!(left.variant_hash, right.variant_hash);
                assert!(similarity(&left.structure_signature, &right.structure_signature) < 0.9);
            }
        }
        Ok(())
    }
}
