use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use combo_contracts::history::CombinationEntry;
use combo_engine::audit::AuditReport;
use combo_engine::engine::{RejectReason, StopReason};
use combo_engine::pipeline::{audit_history, bootstrap_catalog, run_generation, usage_stats};
use combo_engine::usage::CategoryUsage;
use combo_engine::GeneratorConfig;
use serde_json::{json, Value};

#[derive(Debug, Parser)]
#[command(
    name = "combo-forge",
    version,
    about = "Generate unique structure + style design combinations"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate new combinations and append them to history.
    Generate(GenerateArgs),
    /// Load every category, synthesizing missing template files.
    Bootstrap(StoreArgs),
    /// Check history for duplicate hashes and near-duplicate structures.
    Audit(AuditArgs),
    /// Template usage per category, derived from history.
    Stats(StatsArgs),
}

#[derive(Debug, Args)]
struct StoreArgs {
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[arg(long)]
    templates_per_category: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Parser)]
struct GenerateArgs {
    #[command(flatten)]
    store: StoreArgs,
    #[arg(long)]
    count: Option<usize>,
    #[arg(long)]
    attempts_multiplier: Option<usize>,
    #[arg(long)]
    similarity_threshold: Option<f64>,
    #[arg(long)]
    variant_retries: Option<usize>,
    #[arg(long)]
    offline: bool,
    #[arg(long)]
    annotator_url: Option<String>,
    #[arg(long)]
    annotator_model: Option<String>,
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct AuditArgs {
    #[command(flatten)]
    store: StoreArgs,
    #[arg(long)]
    similarity_threshold: Option<f64>,
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Parser)]
struct StatsArgs {
    #[command(flatten)]
    store: StoreArgs,
    #[arg(long)]
    json: bool,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("combo-forge error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Bootstrap(args) => run_bootstrap(args),
        Command::Audit(args) => run_audit(args),
        Command::Stats(args) => run_stats(args),
    }
}

fn base_config(args: &StoreArgs) -> GeneratorConfig {
    let mut config = GeneratorConfig::from_env();
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(count) = args.templates_per_category {
        config.templates_per_category = count;
    }
    config.seed = args.seed;
    config
}

fn generate_config(args: &GenerateArgs) -> GeneratorConfig {
    let mut config = base_config(&args.store);
    if let Some(count) = args.count {
        config.engine.required = count;
    }
    if let Some(multiplier) = args.attempts_multiplier {
        config.engine.attempts_multiplier = multiplier;
    }
    if let Some(threshold) = args.similarity_threshold {
        config.engine.similarity_threshold = threshold;
    }
    if let Some(retries) = args.variant_retries {
        config.engine.variant_retry_budget = retries;
    }
    config.annotator.offline = args.offline;
    if let Some(url) = &args.annotator_url {
        config.annotator.url = url.clone();
    }
    if let Some(model) = &args.annotator_model {
        config.annotator.model = model.clone();
    }
    config.output = args.output.clone();
    config
}

fn run_generate(args: GenerateArgs) -> Result<i32> {
    let config = generate_config(&args);
    let annotator = config.build_annotator();
    let required = config.engine.required;
    let mut accepted = 0usize;
    let outcome = run_generation(&config, annotator.as_ref(), |entry| {
        accepted += 1;
        println!("{}", progress_line(accepted, required, entry));
    })?;

    for category in &outcome.bootstrapped {
        println!("Bootstrapped templates for {category}");
    }
    if outcome.history_upgraded > 0 {
        println!(
            "Upgraded {} history record(s) to the current schema",
            outcome.history_upgraded
        );
    }
    if outcome.history_dropped > 0 {
        eprintln!(
            "warning: {} unusable history record(s) kept as-is",
            outcome.history_dropped
        );
    }
    let report = &outcome.report;
    if report.stop_reason == StopReason::StyleSpaceExhausted {
        eprintln!("warning: style space exhausted; no unused style variant could be found");
    }
    for error in &report.event_errors {
        eprintln!("warning: event log write failed: {error}");
    }
    if report.fallback_descriptions > 0 {
        eprintln!(
            "warning: {} description(s) used the fallback text",
            report.fallback_descriptions
        );
    }
    if report.accepted.is_empty() {
        println!("No valid combinations generated ({} attempts).", report.attempts);
    } else {
        println!(
            "Generated {}/{} combinations in {} attempts ({}).",
            report.accepted.len(),
            required,
            report.attempts,
            report.stop_reason.as_str()
        );
        let rejected: Vec<String> = RejectReason::ALL
            .into_iter()
            .filter(|reason| report.rejected(*reason) > 0)
            .map(|reason| format!("{} {}", reason.as_str(), report.rejected(reason)))
            .collect();
        if !rejected.is_empty() {
            println!("Rejected: {}", rejected.join(", "));
        }
        if let Some(path) = &outcome.output_path {
            println!("Output: {}", path.display());
        }
    }
    println!("Summary: {}", outcome.summary_path.display());
    Ok(0)
}

fn progress_line(index: usize, required: usize, entry: &CombinationEntry) -> String {
    format!(
        "[{index}/{required}] {} | {} | {}",
        entry.category, entry.structure_id, entry.style.label
    )
}

fn run_bootstrap(args: StoreArgs) -> Result<i32> {
    let config = base_config(&args);
    let catalog = bootstrap_catalog(&config)?;
    for category in catalog.categories() {
        let marker = if catalog.bootstrapped().iter().any(|name| name == category) {
            " (synthesized)"
        } else {
            ""
        };
        println!(
            "{category}: {} templates{marker}",
            catalog.templates(category).len()
        );
    }
    println!(
        "{} templates across {} categories in {}",
        catalog.template_count(),
        config.categories.len(),
        config.templates_dir().display()
    );
    Ok(0)
}

fn run_audit(args: AuditArgs) -> Result<i32> {
    let mut config = base_config(&args.store);
    if let Some(threshold) = args.similarity_threshold {
        config.engine.similarity_threshold = threshold;
    }
    let (migration, report) = audit_history(&config)?;
    if args.json {
        let payload = audit_json(&report, migration.upgraded, migration.dropped.len());
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("failed encoding audit report")?
        );
    } else {
        for (position, reason) in &migration.dropped {
            println!("record #{position} skipped: {reason}");
        }
        for violation in &report.violations {
            println!("{}: {}", violation.kind(), violation.describe());
        }
        for kind in VIOLATION_KINDS {
            let count = report.count(kind);
            if count > 0 {
                println!("{kind}: {count} total");
            }
        }
        println!(
            "{} entries audited, {} violation(s), {} record(s) upgraded",
            report.entries,
            report.violations.len(),
            migration.upgraded
        );
    }
    Ok(if report.is_clean() { 0 } else { 2 })
}

const VIOLATION_KINDS: [&str; 3] = ["duplicate_combo", "duplicate_variant", "near_duplicate"];

fn audit_json(report: &AuditReport, upgraded: usize, dropped: usize) -> Value {
    json!({
        "entries": report.entries,
        "threshold": report.threshold,
        "upgraded": upgraded,
        "dropped": dropped,
        "violations": report
            .violations
            .iter()
            .map(|violation| json!({
                "kind": violation.kind(),
                "detail": violation.describe(),
            }))
            .collect::<Vec<_>>(),
    })
}

fn run_stats(args: StatsArgs) -> Result<i32> {
    let config = base_config(&args.store);
    let rows = usage_stats(&config)?;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&stats_json(&rows)).context("failed encoding stats")?
        );
        return Ok(0);
    }
    for row in &rows {
        let used: u64 = row.per_template.iter().map(|(_, uses)| uses).sum();
        println!(
            "{}: {} uses, {} of {} templates unused",
            row.category,
            used,
            row.unused,
            row.per_template.len()
        );
        for (id, uses) in &row.per_template {
            println!("  {id}: {uses}");
        }
        if !row.stale_ids.is_empty() {
            println!("  stale ids: {}", row.stale_ids.join(", "));
        }
    }
    Ok(0)
}

fn stats_json(rows: &[CategoryUsage]) -> Value {
    Value::Array(
        rows.iter()
            .map(|row| {
                json!({
                    "category": row.category,
                    "unused": row.unused,
                    "templates": row
                        .per_template
                        .iter()
                        .map(|(id, uses)| json!({"id": id, "uses": uses}))
                        .collect::<Vec<_>>(),
                    "stale_ids": row.stale_ids,
                })
            })
            .collect(),
    )
}
