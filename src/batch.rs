use crate::cli::JobSource;
use crate::config::{ConfigLoader, ToolConfig};
use crate::errors::Result;
use crate::job::{parse_jobs, ParseReport};
use crate::scheduler::{JobRunner, Scheduler};
use crate::walker::{FileWalker, WalkOptions, WalkStats};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// What [`apply_config`] did with a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// `enabled` was false; nothing ran.
    Disabled,
    /// A previous batch is still running; nothing changed.
    Busy,
    /// The config was consumed and disabled; `jobs` tasks were started.
    Started { jobs: usize },
}

/// Collects job lines from `--job` arguments and an optional jobs file.
pub fn load_blob(source: &JobSource) -> Result<String> {
    let mut lines = source.jobs.clone();
    if let Some(path) = &source.jobs_file {
        let contents = fs::read_to_string(path)?;
        lines.extend(contents.lines().map(str::to_string));
    }
    Ok(lines.join("\n"))
}

/// Runs the enabled config's batch and disables the config.
///
/// Nothing happens when the config is disabled or the scheduler is busy.
/// Otherwise the config is written back with `enabled: false` as soon as the
/// batch has been handed to the scheduler, without waiting for it to finish.
pub fn apply_config(path: &Path, scheduler: &Scheduler) -> Result<ApplyOutcome> {
    let config = ConfigLoader::load(path)?;
    if !config.enabled {
        info!(config = %path.display(), "config is disabled, nothing to do");
        return Ok(ApplyOutcome::Disabled);
    }
    if scheduler.is_busy() {
        return Ok(ApplyOutcome::Busy);
    }

    let report = parse_jobs(&config.jobs);
    let jobs = report.jobs.len();
    if !scheduler.start_batch(report.jobs) && jobs > 0 {
        return Ok(ApplyOutcome::Busy);
    }

    ConfigLoader::save(
        path,
        &ToolConfig {
            enabled: false,
            ..config
        },
    )?;
    info!(config = %path.display(), "config disabled after dispatch");

    Ok(ApplyOutcome::Started { jobs })
}

/// The main entry point for the `run` command.
pub fn run_jobs(source: JobSource, dry_run: bool) -> Result<()> {
    let blob = load_blob(&source)?;
    let report = parse_jobs(&blob);
    print_skipped(&report);

    let walker = Arc::new(FileWalker::new(WalkOptions { dry_run }));
    let scheduler = Scheduler::new(Arc::clone(&walker) as Arc<dyn JobRunner>);

    let jobs = report.jobs.len();
    if scheduler.start_batch(report.jobs) {
        scheduler.wait_idle();
    }

    print_summary(jobs, walker.totals(), dry_run);
    Ok(())
}

/// The main entry point for the `apply` command.
pub fn run_apply(config: &Path, dry_run: bool) -> Result<()> {
    let working_dir = env::current_dir()?;
    let resolved = ConfigLoader::find_config(config, &working_dir)?;
    println!("Using config file: {}", resolved.display());

    let walker = Arc::new(FileWalker::new(WalkOptions { dry_run }));
    let scheduler = Scheduler::new(Arc::clone(&walker) as Arc<dyn JobRunner>);

    match apply_config(&resolved, &scheduler)? {
        ApplyOutcome::Disabled => println!("Config is disabled; set `enabled: true` to run it"),
        ApplyOutcome::Busy => println!("A batch is already running"),
        ApplyOutcome::Started { jobs } => {
            scheduler.wait_idle();
            print_summary(jobs, walker.totals(), dry_run);
        }
    }
    Ok(())
}

/// The main entry point for the `check` command.
pub fn run_check(source: JobSource) -> Result<()> {
    let blob = load_blob(&source)?;
    let report = parse_jobs(&blob);

    for job in &report.jobs {
        println!("OK   {job}");
    }
    print_skipped(&report);

    println!("\n{}", "-".repeat(50));
    println!("Valid jobs   : {}", report.jobs.len());
    println!("Skipped lines: {}", report.skipped.len());
    Ok(())
}

fn print_skipped(report: &ParseReport) {
    for skipped in &report.skipped {
        if skipped.line.trim().is_empty() {
            continue;
        }
        println!("SKIP line {}: {} ({})", skipped.line_number, skipped.line, skipped.reason);
    }
}

fn print_summary(jobs: usize, totals: WalkStats, dry_run: bool) {
    println!("\n{}", "-".repeat(50));
    if dry_run {
        println!("Dry run: no files were written");
    }
    println!("Jobs run      : {jobs}");
    println!("Files scanned : {}", totals.files_seen);
    println!("Files changed : {}", totals.rewritten);
    println!("Files failed  : {}", totals.failed);
}
