//! The `inkgrade assess` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use serde::Serialize;

use inkgrade_core::model::ExerciseKind;
use inkgrade_core::parser;
use inkgrade_core::raster::PixelBuffer;
use inkgrade_core::results::{AssessmentMetrics, LocalAssessment};

#[derive(Serialize)]
struct AssessOutput<'a> {
    exercise_id: &'a str,
    kind: ExerciseKind,
    #[serde(flatten)]
    assessment: &'a LocalAssessment,
}

pub fn execute(exercises_path: PathBuf, attempt_path: PathBuf, format: String) -> Result<()> {
    let sets = parser::load_exercises(&exercises_path)?;
    let attempt = parser::load_attempt(&attempt_path)?;

    let exercise = sets
        .iter()
        .find_map(|s| s.find(&attempt.exercise_id))
        .with_context(|| {
            format!(
                "exercise '{}' not found in {}",
                attempt.exercise_id,
                exercises_path.display()
            )
        })?;

    let raster = attempt
        .image_path(&attempt_path)
        .map(|p| super::load_raster(&p))
        .transpose()?;

    let assessment = inkgrade_core::assess(
        exercise,
        &attempt.strokes,
        raster.as_ref().map(|r| r as &dyn PixelBuffer),
    )?;

    match format.as_str() {
        "json" => {
            let output = AssessOutput {
                exercise_id: &exercise.id,
                kind: exercise.config.kind(),
                assessment: &assessment,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => {
            println!("Exercise: {} ({})", exercise.title, exercise.config.kind());
            println!(
                "Score: {}/100 {}",
                assessment.score,
                if assessment.passed { "PASSED" } else { "NOT PASSED" }
            );

            let mut table = Table::new();
            table.set_header(vec!["Metric", "Value"]);
            for (name, value) in metric_rows(&assessment.metrics) {
                table.add_row(vec![Cell::new(name), Cell::new(value)]);
            }
            println!("{table}");
        }
    }

    Ok(())
}

fn pct(v: f64) -> String {
    format!("{v:.1}")
}

fn metric_rows(metrics: &AssessmentMetrics) -> Vec<(&'static str, String)> {
    match metrics {
        AssessmentMetrics::Line(m) => vec![
            ("path accuracy", pct(m.path_accuracy)),
            ("smoothness", pct(m.smoothness)),
            ("completeness", pct(m.completeness)),
            (
                "avg deviation (px)",
                if m.avg_deviation.is_finite() {
                    format!("{:.2}", m.avg_deviation)
                } else {
                    "-".into()
                },
            ),
        ],
        AssessmentMetrics::Shape(m) => {
            let mut rows = vec![
                ("shape match", pct(m.shape_match)),
                ("bounds match", pct(m.bounds_match)),
                ("aspect ratio", pct(m.aspect_ratio_match)),
                ("closedness", pct(m.closedness)),
            ];
            if let Some(c) = m.corner_accuracy {
                rows.push(("corner accuracy", pct(c)));
                rows.push((
                    "corners matched",
                    format!("{}/{}", m.matched_corners, m.detected_corners),
                ));
            }
            if let Some(r) = m.roundness {
                rows.push(("roundness", pct(r)));
            }
            rows
        }
        AssessmentMetrics::Dots(m) => vec![
            ("dots hit", format!("{}/{}", m.dots_hit, m.total_dots)),
            ("order accuracy", pct(m.order_accuracy)),
            ("sequence", m.hit_sequence.join(" -> ")),
        ],
        AssessmentMetrics::Color(m) => {
            let mut rows = vec![
                ("color accuracy", pct(m.color_accuracy)),
                ("coverage", pct(m.coverage)),
            ];
            for r in &m.regions {
                let found = r
                    .dominant_color
                    .map_or_else(|| "none".to_string(), |c| c.to_string());
                rows.push((
                    "region",
                    format!("{}: {} vs {} ({})", r.region_id, found, r.target_color, pct(r.color_score)),
                ));
            }
            rows
        }
    }
}
