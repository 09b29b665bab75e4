//! The `inkgrade compare` command.

use std::path::PathBuf;

use anyhow::Result;

use inkgrade_core::config::load_config;
use inkgrade_core::report::SessionReport;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    threshold: Option<f64>,
    fail_on_decline: bool,
    format: String,
) -> Result<()> {
    let threshold = match threshold {
        Some(t) => t,
        None => load_config()?.regression_threshold,
    };
    anyhow::ensure!(threshold >= 0.0, "threshold must not be negative");

    let baseline = SessionReport::load_json(&baseline_path)?;
    let current = SessionReport::load_json(&current_path)?;

    let comparison = current.compare(&baseline, threshold);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", comparison.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&comparison)?);
        }
        _ => {
            println!(
                "Comparison: {} declines, {} improvements, {} unchanged",
                comparison.declines.len(),
                comparison.improvements.len(),
                comparison.unchanged
            );

            if !comparison.declines.is_empty() {
                println!("\nDeclines:");
                for c in &comparison.declines {
                    println!(
                        "  {} {} -> {} ({:+.0})",
                        c.exercise_id, c.baseline_score, c.current_score, c.delta
                    );
                }
            }

            if !comparison.improvements.is_empty() {
                println!("\nImprovements:");
                for c in &comparison.improvements {
                    println!(
                        "  {} {} -> {} ({:+.0})",
                        c.exercise_id, c.baseline_score, c.current_score, c.delta
                    );
                }
            }

            if comparison.new_exercises > 0 {
                println!("\n{} new exercise(s)", comparison.new_exercises);
            }
            if comparison.removed_exercises > 0 {
                println!("{} removed exercise(s)", comparison.removed_exercises);
            }
        }
    }

    if fail_on_decline && comparison.has_declines() {
        std::process::exit(1);
    }

    Ok(())
}
