//! The `inkgrade run` command.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use inkgrade_core::config::load_config_from;
use inkgrade_core::engine::{AssessmentEngine, AttemptJob, EngineConfig, ProgressReporter};
use inkgrade_core::parser::{self, AttemptFile};
use inkgrade_core::report::SessionReport;
use inkgrade_core::results::AttemptRecord;

/// Console progress reporter.
struct ConsoleReporter;

impl ProgressReporter for ConsoleReporter {
    fn on_attempt_start(&self, exercise_id: &str, attempt: u32) {
        eprintln!("  Scoring: {exercise_id} (attempt {attempt})");
    }

    fn on_attempt_complete(&self, record: &AttemptRecord) {
        eprintln!(
            "  Done: {} [{}] score {} {} ({}us)",
            record.exercise_id,
            record.attempt,
            record.assessment.score,
            if record.assessment.passed { "PASS" } else { "----" },
            record.analysis_us,
        );
    }

    fn on_attempt_error(&self, exercise_id: &str, error: &str) {
        eprintln!("  ERROR: {exercise_id}: {error}");
    }

    fn on_session_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration) {
        eprintln!(
            "\nComplete: {completed}/{total} scored, {failed} failed ({:.2}s)",
            elapsed.as_secs_f64()
        );
    }
}

fn to_job(path: &std::path::Path, attempt: &AttemptFile) -> AttemptJob {
    let mut job = AttemptJob::new(attempt.exercise_id.clone(), attempt.strokes.clone())
        .with_source(path.display().to_string());
    if let Some(image) = attempt.image_path(path) {
        match super::load_raster(&image) {
            Ok(raster) => job = job.with_raster(raster),
            Err(e) => tracing::warn!("{}: {e:#}", path.display()),
        }
    }
    job
}

pub async fn execute(
    exercises_path: PathBuf,
    attempts_path: PathBuf,
    parallelism: Option<usize>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let parallelism = parallelism.unwrap_or(config.parallelism);
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");
    let output = output.unwrap_or(config.output_dir);

    let sets = parser::load_exercises(&exercises_path)?;
    anyhow::ensure!(
        !sets.is_empty(),
        "no exercise sets found in {}",
        exercises_path.display()
    );
    let attempts = parser::load_attempt_directory(&attempts_path)?;

    let known: HashSet<&str> = sets
        .iter()
        .flat_map(|s| s.exercises.iter().map(|e| e.id.as_str()))
        .collect();
    for (path, attempt) in &attempts {
        if !known.contains(attempt.exercise_id.as_str()) {
            eprintln!(
                "Warning: {} refers to unknown exercise '{}'",
                path.display(),
                attempt.exercise_id
            );
        }
    }

    let engine = AssessmentEngine::new(EngineConfig { parallelism });
    let reporter = ConsoleReporter;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");

    for set in &sets {
        let jobs: Vec<AttemptJob> = attempts
            .iter()
            .filter(|(_, a)| set.find(&a.exercise_id).is_some())
            .map(|(path, a)| to_job(path, a))
            .collect();
        if jobs.is_empty() {
            eprintln!("No attempts for exercise set '{}', skipping.", set.name);
            continue;
        }

        eprintln!(
            "inkgrade v{}: scoring {} attempts against '{}'",
            env!("CARGO_PKG_VERSION"),
            jobs.len(),
            set.name
        );
        eprintln!();

        let report = engine.run(set, jobs, &reporter).await?;

        print_summary(&report);

        std::fs::create_dir_all(&output)?;
        let path = output.join(format!("report-{timestamp}-{}.json", set.id));
        report.save_json(&path)?;
        eprintln!("Results saved to: {}", path.display());
    }

    Ok(())
}

fn print_summary(report: &SessionReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec![
        "Exercise", "Kind", "Attempts", "Best", "Latest", "Mean", "Pass %",
    ]);

    for stats in report.stats.per_exercise.values() {
        table.add_row(vec![
            Cell::new(&stats.exercise_id),
            Cell::new(stats.kind),
            Cell::new(stats.attempts),
            Cell::new(stats.best_score),
            Cell::new(stats.latest_score),
            Cell::new(format!("{:.1}", stats.mean_score)),
            Cell::new(format!("{:.0}%", stats.pass_rate * 100.0)),
        ]);
    }

    println!("\n{table}");
    println!(
        "Overall: {} attempts, mean score {:.1}, {:.0}% passed",
        report.stats.attempts,
        report.stats.mean_score,
        report.stats.pass_rate * 100.0
    );
}
