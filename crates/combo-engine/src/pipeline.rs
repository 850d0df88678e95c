//! One generation run end to end: stores in, engine, stores out.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use combo_contracts::events::RunEventLog;
use combo_contracts::history::{write_run_output, CombinationEntry, HistoryRecord, HistoryStore};
use combo_contracts::runs::summary::{write_summary, RunSummary};
use combo_contracts::templates::TemplateStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use uuid::Uuid;

use crate::annotate::Annotator;
use crate::audit::{audit_entries, AuditReport};
use crate::catalog::{StructureCatalog, StyleCatalog};
use crate::config::GeneratorConfig;
use crate::engine::{map_object, now_utc_iso, CombinationEngine, RunReport};
use crate::migrate::{migrate_records, MigrationOutcome};
use crate::registries::Registries;
use crate::usage::{CategoryUsage, UsageTracker};

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub run_id: String,
    pub run_dir: PathBuf,
    pub report: RunReport,
    /// `None` when nothing was accepted and no files were rewritten.
    pub output_path: Option<PathBuf>,
    pub summary_path: PathBuf,
    pub events_path: PathBuf,
    pub bootstrapped: Vec<String>,
    pub history_upgraded: usize,
    pub history_dropped: usize,
}

/// Runs the generator against `config.data_dir`.
///
/// History and run output are only written when at least one entry was
/// accepted; `summary.json` and `events.jsonl` are always written.
pub fn run_generation<F>(
    config: &GeneratorConfig,
    annotator: &dyn Annotator,
    on_accept: F,
) -> Result<GenerationOutcome>
where
    F: FnMut(&CombinationEntry),
{
    config.validate()?;
    let run_id = new_run_id();
    let run_dir = config.run_dir(&run_id);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed creating run directory {}", run_dir.display()))?;
    let events_path = run_dir.join("events.jsonl");
    let events = RunEventLog::new(events_path.clone(), run_id.clone());
    let started_at = now_utc_iso();

    events.emit(
        "run_started",
        map_object(json!({
            "data_dir": config.data_dir.to_string_lossy().to_string(),
            "requested": config.engine.required,
            "max_attempts": config.engine.max_attempts(),
            "similarity_threshold": config.engine.similarity_threshold,
            "seed": config.seed,
            "annotator": annotator.name(),
        })),
    )?;

    let mut rng = seeded_rng(config.seed);
    let catalog = load_catalog(config, &mut rng)?;
    for category in catalog.bootstrapped() {
        events.emit(
            "catalog_bootstrapped",
            map_object(json!({
                "category": category,
                "templates": catalog.templates(category).len(),
            })),
        )?;
    }

    let history = HistoryStore::new(config.history_path());
    let migration = migrate_records(history.load()?);
    let registries = Registries::from_history(&migration.entries);
    let styles = StyleCatalog::default();

    let mut engine = CombinationEngine::new(
        &catalog,
        &styles,
        annotator,
        registries,
        config.engine,
        events.clone(),
        rng,
    );
    let report = engine.run_with(on_accept);

    let output_path = if report.accepted.is_empty() {
        None
    } else {
        let accepted: Vec<HistoryRecord> =
            report.accepted.iter().map(CombinationEntry::to_record).collect();
        let mut records = migration.records;
        records.extend(accepted.iter().cloned());
        history.save(&records)?;
        let output_path = config.output_path(&run_dir);
        write_run_output(&output_path, &accepted)?;
        Some(output_path)
    };

    let summary_path = run_dir.join("summary.json");
    let summary = RunSummary {
        run_id: run_id.clone(),
        started_at,
        finished_at: now_utc_iso(),
        requested: config.engine.required as u64,
        accepted: report.accepted.len() as u64,
        attempts: report.attempts as u64,
        max_attempts: report.max_attempts as u64,
        stop_reason: report.stop_reason.as_str().to_string(),
        rejections: report
            .rejections
            .iter()
            .map(|(reason, count)| (reason.as_str().to_string(), *count as u64))
            .collect::<BTreeMap<_, _>>(),
        fallback_descriptions: report.fallback_descriptions as u64,
        accepted_ids: report.accepted.iter().map(|entry| entry.id.clone()).collect(),
    };
    let extra = map_object(json!({
        "output_path": output_path
            .as_ref()
            .map(|path| path.to_string_lossy().to_string()),
        "bootstrapped": catalog.bootstrapped(),
        "history_upgraded": migration.upgraded,
        "history_dropped": migration.dropped.len(),
        "event_errors": report.event_errors,
    }));
    write_summary(&summary_path, &summary, Some(&extra))?;
    events.emit(
        "run_finished",
        map_object(json!({
            "summary_path": summary_path.to_string_lossy().to_string(),
            "accepted": report.accepted.len(),
            "stop_reason": report.stop_reason.as_str(),
        })),
    )?;

    Ok(GenerationOutcome {
        run_id,
        run_dir,
        bootstrapped: catalog.bootstrapped().to_vec(),
        report,
        output_path,
        summary_path,
        events_path,
        history_upgraded: migration.upgraded,
        history_dropped: migration.dropped.len(),
    })
}

/// Loads every configured category, synthesizing the ones without templates.
pub fn load_catalog<R: Rng + ?Sized>(
    config: &GeneratorConfig,
    rng: &mut R,
) -> Result<StructureCatalog> {
    let store = TemplateStore::new(config.templates_dir());
    StructureCatalog::load_or_bootstrap(
        &store,
        &config.categories,
        config.templates_per_category,
        rng,
    )
}

pub fn bootstrap_catalog(config: &GeneratorConfig) -> Result<StructureCatalog> {
    config.validate()?;
    load_catalog(config, &mut seeded_rng(config.seed))
}

pub fn load_history(config: &GeneratorConfig) -> Result<MigrationOutcome> {
    let store = HistoryStore::new(config.history_path());
    Ok(migrate_records(store.load()?))
}

pub fn audit_history(config: &GeneratorConfig) -> Result<(MigrationOutcome, AuditReport)> {
    config.validate()?;
    let migration = load_history(config)?;
    let report = audit_entries(&migration.entries, config.engine.similarity_threshold);
    Ok((migration, report))
}

pub fn usage_stats(config: &GeneratorConfig) -> Result<Vec<CategoryUsage>> {
    let catalog = bootstrap_catalog(config)?;
    let migration = load_history(config)?;
    Ok(UsageTracker::from_history(&migration.entries).report(&catalog))
}

pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn new_run_id() -> String {
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("run-{stamp}-{}", &suffix[..8])
}
