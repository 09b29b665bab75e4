//! End-to-end pipeline tests over the bundled exercise sets.
//!
//! These tests load the repository fixtures, score them through the batch
//! engine, persist the report, and compare sessions against each other.

use std::path::Path;

use inkgrade_core::engine::{AssessmentEngine, AttemptJob, EngineConfig, NoopReporter};
use inkgrade_core::geometry::Point;
use inkgrade_core::model::{ExerciseSet, Stroke, StrokeData};
use inkgrade_core::parser;
use inkgrade_core::raster::{Rgba, RgbaBuffer};
use inkgrade_core::report::SessionReport;
use inkgrade_core::results::AssessmentMetrics;

fn starter_set() -> ExerciseSet {
    parser::parse_exercise_set(Path::new("../../exercises/starter.toml")).unwrap()
}

fn fixture_jobs() -> Vec<AttemptJob> {
    parser::load_attempt_directory(Path::new("../../attempts"))
        .unwrap()
        .into_iter()
        .map(|(path, a)| AttemptJob::new(a.exercise_id, a.strokes).with_source(path.display().to_string()))
        .collect()
}

fn horizontal_line(y_offset: f64) -> StrokeData {
    let points = (0..=16).map(|i| Point::new(100.0 + 25.0 * i as f64, 200.0 + y_offset));
    StrokeData::new(vec![Stroke::from_points("s1", points)])
}

#[test]
fn bundled_sets_validate_cleanly() {
    let sets = parser::load_exercises(Path::new("../../exercises")).unwrap();
    assert_eq!(sets.len(), 2);
    for set in &sets {
        let warnings = parser::validate_exercise_set(set);
        assert!(warnings.is_empty(), "{}: {warnings:?}", set.id);
    }
}

#[tokio::test]
async fn e2e_fixture_session() {
    let set = starter_set();
    let engine = AssessmentEngine::new(EngineConfig { parallelism: 2 });

    let report = engine.run(&set, fixture_jobs(), &NoopReporter).await.unwrap();

    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.records.len(), 4);
    assert_eq!(report.exercise_set.exercise_count, 6);

    let line_attempts: Vec<_> = report
        .records
        .iter()
        .filter(|r| r.exercise_id == "straight-line")
        .collect();
    assert_eq!(line_attempts.len(), 2);
    assert_eq!(line_attempts[0].attempt, 1);
    assert_eq!(line_attempts[1].attempt, 2);
    assert!(line_attempts.iter().all(|r| r.source.is_some()));

    let dots = report
        .records
        .iter()
        .find(|r| r.exercise_id == "three-dots")
        .unwrap();
    assert_eq!(dots.assessment.score, 100);
    match &dots.assessment.metrics {
        AssessmentMetrics::Dots(m) => assert_eq!(m.dots_hit, 3),
        other => panic!("expected dots metrics, got {other:?}"),
    }

    assert_eq!(report.stats.per_exercise["straight-line"].best_score, 100);
}

#[tokio::test]
async fn e2e_jittery_line_scores_lower() {
    let set = starter_set();
    let engine = AssessmentEngine::new(EngineConfig::default());

    // straight except for a spike every fourth sample
    let jitter = StrokeData::new(vec![Stroke::from_points(
        "s1",
        (0..=16).map(|i| {
            let dy = if i % 4 == 0 && i > 0 && i < 16 { 15.0 } else { 0.0 };
            Point::new(100.0 + 25.0 * i as f64, 200.0 + dy)
        }),
    )]);
    let jobs = vec![
        AttemptJob::new("straight-line", horizontal_line(0.0)),
        AttemptJob::new("straight-line", jitter),
    ];
    let report = engine.run(&set, jobs, &NoopReporter).await.unwrap();

    let scores: Vec<u8> = report.records.iter().map(|r| r.assessment.score).collect();
    assert_eq!(scores.len(), 2);
    assert_eq!(scores[0], 100);
    assert!(scores[1] < 95, "{scores:?}");
    match &report.records[1].assessment.metrics {
        AssessmentMetrics::Line(m) => {
            assert!(m.smoothness < 60.0, "{m:?}");
            assert_eq!(m.completeness, 100.0);
        }
        other => panic!("expected line metrics, got {other:?}"),
    }
    assert_eq!(report.stats.per_exercise["straight-line"].latest_score, scores[1]);
}

#[tokio::test]
async fn e2e_missing_raster_for_color() {
    let set = parser::parse_exercise_set(Path::new("../../exercises/colors.toml")).unwrap();
    let engine = AssessmentEngine::new(EngineConfig::default());

    let mut canvas = RgbaBuffer::filled(400, 300, Rgba::new(255, 255, 255, 255));
    canvas.fill_rect(150, 100, 100, 100, Rgba::new(255, 204, 0, 255));

    let jobs = vec![
        AttemptJob::new("sun", StrokeData::default()).with_raster(canvas),
        AttemptJob::new("sun", StrokeData::default()),
    ];
    let report = engine.run(&set, jobs, &NoopReporter).await.unwrap();

    assert_eq!(report.records[0].assessment.score, 100);
    assert!(report.records[0].assessment.passed);
    assert_eq!(report.records[1].assessment.score, 0);
    assert!(!report.records[1].assessment.passed);
}

#[tokio::test]
async fn e2e_report_round_trip_and_compare() {
    let set = starter_set();
    let dir = tempfile::tempdir().unwrap();

    let engine = AssessmentEngine::new(EngineConfig::default());
    let baseline = engine
        .run(
            &set,
            vec![AttemptJob::new("straight-line", horizontal_line(0.0))],
            &NoopReporter,
        )
        .await
        .unwrap();
    let baseline_path = dir.path().join("nested/baseline.json");
    baseline.save_json(&baseline_path).unwrap();

    // a fresh engine starts its attempt numbering over
    let current = AssessmentEngine::new(EngineConfig::default())
        .run(
            &set,
            vec![AttemptJob::new("straight-line", horizontal_line(18.0))],
            &NoopReporter,
        )
        .await
        .unwrap();
    assert_eq!(current.records[0].attempt, 1);

    let loaded = SessionReport::load_json(&baseline_path).unwrap();
    assert_eq!(loaded.id, baseline.id);
    assert_eq!(loaded.best_scores(), baseline.best_scores());

    let comparison = current.compare(&loaded, 5.0);
    assert!(comparison.has_declines());
    assert_eq!(comparison.declines[0].exercise_id, "straight-line");
    assert!(comparison.to_markdown().contains("straight-line"));
}
