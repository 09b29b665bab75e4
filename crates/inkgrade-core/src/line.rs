//! Line-tracing analyzer.
//!
//! The user's strokes are concatenated into one polyline, both it and the
//! target path are resampled to the same point count, and the two are
//! aligned with DTW so drawing speed and sampling density do not matter.

use crate::dtw::dtw;
use crate::geometry::{clamp_score, path_length, turn_angle, Point};
use crate::model::{LineConfig, Stroke, StrokeData};
use crate::path::parse_path;
use crate::results::{to_score, LineMetrics};

/// Lower bound on the resampled point count.
pub const MIN_SAMPLES: usize = 50;

/// Standard deviation of turn angles (radians) at which smoothness hits zero.
const MAX_TURN_STD_DEV_SQ: f64 = 0.5;

/// Resample a polyline to `n` points equally spaced by arc length.
///
/// The first and last input points are preserved exactly. A polyline of
/// zero length collapses to its first point; an empty one stays empty.
pub fn resample(points: &[Point], n: usize) -> Vec<Point> {
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    let total = path_length(points);
    if total == 0.0 || n < 2 {
        return vec![first];
    }

    let interval = total / (n - 1) as f64;
    let mut out = Vec::with_capacity(n);
    out.push(first);

    let mut accumulated = 0.0;
    let mut prev = first;
    let mut i = 1;
    while i < points.len() && out.len() < n {
        let next = points[i];
        let d = prev.distance(next);
        if d > 0.0 && accumulated + d >= interval {
            let q = prev.lerp(next, (interval - accumulated) / d);
            out.push(q);
            // keep walking the remainder of the same segment
            prev = q;
            accumulated = 0.0;
        } else {
            accumulated += d;
            prev = next;
            i += 1;
        }
    }

    // floating point slack can leave the walk one sample short
    while out.len() < n {
        out.push(last);
    }
    out[n - 1] = last;
    out
}

/// Smoothness of one stroke from the variance of its turn angles.
///
/// Strokes with fewer than three points cannot turn and score 100.
pub fn stroke_smoothness(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 100.0;
    }
    let angles: Vec<f64> = points
        .windows(3)
        .filter_map(|w| turn_angle(w[0], w[1], w[2]))
        .collect();
    if angles.is_empty() {
        return 100.0;
    }
    let n = angles.len() as f64;
    let mean = angles.iter().sum::<f64>() / n;
    let variance = angles.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n;
    clamp_score(100.0 * (1.0 - variance.sqrt() / MAX_TURN_STD_DEV_SQ.sqrt()))
}

/// Average smoothness across strokes; 0 when there are none.
pub fn smoothness(strokes: &[Stroke]) -> f64 {
    if strokes.is_empty() {
        return 0.0;
    }
    strokes
        .iter()
        .map(|s| stroke_smoothness(&s.positions()))
        .sum::<f64>()
        / strokes.len() as f64
}

/// Percentage of target points with some user point within `tolerance`.
pub fn completeness(target: &[Point], user: &[Point], tolerance: f64) -> f64 {
    if target.is_empty() || user.is_empty() {
        return 0.0;
    }
    let covered = target
        .iter()
        .filter(|t| user.iter().any(|u| t.distance(*u) <= tolerance))
        .count();
    100.0 * covered as f64 / target.len() as f64
}

/// Accuracy from mean deviation: 100 up to `tolerance / 2`, 0 from `2 * tolerance`.
pub fn path_accuracy(avg_deviation: f64, tolerance: f64) -> f64 {
    clamp_score(100.0 * (1.0 - (avg_deviation - tolerance / 2.0) / (tolerance * 1.5)))
}

pub fn analyze(strokes: &StrokeData, config: &LineConfig) -> LineMetrics {
    let user = strokes.all_points();
    if user.is_empty() {
        return LineMetrics::empty();
    }
    let target = parse_path(&config.target_path);
    if target.is_empty() {
        tracing::warn!("target path '{}' yielded no points", config.target_path);
        return LineMetrics::empty();
    }

    let n = MIN_SAMPLES.max(target.len().min(user.len()));
    let user_samples = resample(&user, n);
    let target_samples = resample(&target, n);

    let alignment = dtw(&user_samples, &target_samples);
    let avg_deviation = alignment.mean_pair_distance(&user_samples, &target_samples);
    let tolerance = config.stroke_tolerance;

    let metrics = LineMetrics {
        path_accuracy: path_accuracy(avg_deviation, tolerance),
        smoothness: smoothness(&strokes.strokes),
        completeness: completeness(&target_samples, &user, tolerance),
        avg_deviation,
        sample_count: n,
    };
    tracing::debug!(
        avg_deviation = metrics.avg_deviation,
        path_accuracy = metrics.path_accuracy,
        smoothness = metrics.smoothness,
        completeness = metrics.completeness,
        "line analysis"
    );
    metrics
}

pub fn score(metrics: &LineMetrics) -> u8 {
    to_score(0.5 * metrics.path_accuracy + 0.25 * metrics.smoothness + 0.25 * metrics.completeness)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(path: &str, tolerance: f64) -> LineConfig {
        LineConfig {
            canvas_width: 600,
            canvas_height: 400,
            target_path: path.into(),
            stroke_tolerance: tolerance,
            start_point: None,
            end_point: None,
        }
    }

    fn horizontal(n: usize, x0: f64, x1: f64, y: f64) -> Vec<Point> {
        (0..n)
            .map(|i| Point::new(x0 + (x1 - x0) * i as f64 / (n - 1) as f64, y))
            .collect()
    }

    #[test]
    fn resample_segment_is_collinear_and_monotone() {
        let pts = [Point::new(0.0, 0.0), Point::new(100.0, 0.0)];
        let out = resample(&pts, 11);
        assert_eq!(out.len(), 11);
        assert_eq!(out[0], pts[0]);
        assert_eq!(out[10], pts[1]);
        for w in out.windows(2) {
            assert_eq!(w[1].y, 0.0);
            assert!(w[1].x > w[0].x);
            assert!((w[1].x - w[0].x - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn resample_polyline_spacing_is_even() {
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(30.0, 0.0),
            Point::new(30.0, 30.0),
        ];
        let out = resample(&pts, 7);
        assert_eq!(out.len(), 7);
        assert!(out[3].distance(Point::new(30.0, 0.0)) < 1e-9);
        assert!(out[5].distance(Point::new(30.0, 20.0)) < 1e-9);
        assert_eq!(out[6], Point::new(30.0, 30.0));
    }

    #[test]
    fn resample_degenerate_inputs() {
        assert!(resample(&[], 10).is_empty());
        let p = Point::new(4.0, 4.0);
        assert_eq!(resample(&[p, p, p], 10), vec![p]);
    }

    #[test]
    fn straight_trace_scores_high() {
        let data = StrokeData::new(vec![Stroke::from_points(
            "s1",
            horizontal(50, 100.0, 500.0, 200.0),
        )]);
        let metrics = analyze(&data, &config("M 100 200 L 500 200", 20.0));
        assert!(metrics.path_accuracy >= 90.0, "{metrics:?}");
        assert!(score(&metrics) >= 85);
        assert_eq!(metrics.sample_count, 50);
        assert!(metrics.avg_deviation < 1e-6);
        assert_eq!(metrics.completeness, 100.0);
        assert_eq!(metrics.smoothness, 100.0);
    }

    #[test]
    fn offset_trace_loses_accuracy_linearly() {
        let data = StrokeData::new(vec![Stroke::from_points(
            "s1",
            horizontal(50, 100.0, 500.0, 215.0),
        )]);
        let metrics = analyze(&data, &config("M 100 200 L 500 200", 20.0));
        assert!((metrics.avg_deviation - 15.0).abs() < 1e-6);
        // 100 * (1 - (15 - 10) / 30)
        assert!((metrics.path_accuracy - 83.333).abs() < 0.01);
        assert_eq!(metrics.completeness, 100.0);
        assert_eq!(score(&metrics), 92);
    }

    #[test]
    fn far_trace_scores_zero_accuracy() {
        let data = StrokeData::new(vec![Stroke::from_points(
            "s1",
            horizontal(50, 100.0, 500.0, 300.0),
        )]);
        let metrics = analyze(&data, &config("M 100 200 L 500 200", 20.0));
        assert_eq!(metrics.path_accuracy, 0.0);
        assert_eq!(metrics.completeness, 0.0);
    }

    #[test]
    fn half_trace_is_incomplete() {
        let data = StrokeData::new(vec![Stroke::from_points(
            "s1",
            horizontal(25, 100.0, 300.0, 200.0),
        )]);
        let metrics = analyze(&data, &config("M 100 200 L 500 200", 20.0));
        assert!(metrics.completeness > 45.0 && metrics.completeness < 60.0);
        assert!(metrics.path_accuracy < 100.0);
    }

    #[test]
    fn empty_input_is_all_zero() {
        let metrics = analyze(&StrokeData::default(), &config("M 0 0 L 10 0", 10.0));
        assert_eq!(metrics, LineMetrics::empty());
        assert_eq!(score(&metrics), 0);

        let data = StrokeData::new(vec![Stroke::from_points("s", horizontal(5, 0.0, 10.0, 0.0))]);
        assert_eq!(analyze(&data, &config("", 10.0)), LineMetrics::empty());
    }

    #[test]
    fn zigzag_is_less_smooth() {
        let zigzag: Vec<Point> = (0..40)
            .map(|i| Point::new(i as f64 * 10.0, if i % 3 == 0 { 0.0 } else { 12.0 }))
            .collect();
        let straight = horizontal(40, 0.0, 390.0, 0.0);
        assert!(stroke_smoothness(&zigzag) < stroke_smoothness(&straight));
        assert_eq!(stroke_smoothness(&straight[..2]), 100.0);
    }

    #[test]
    fn completeness_is_one_directional() {
        let target = horizontal(11, 0.0, 100.0, 0.0);
        let user = vec![Point::new(0.0, 0.0)];
        // one user point near the start covers only the first target point
        assert!((completeness(&target, &user, 5.0) - 100.0 / 11.0).abs() < 1e-9);
        // but every user point being close to the target would not matter
        assert_eq!(completeness(&target, &[], 5.0), 0.0);
    }

    #[test]
    fn accuracy_window() {
        assert_eq!(path_accuracy(10.0, 20.0), 100.0);
        assert_eq!(path_accuracy(40.0, 20.0), 0.0);
        assert!((path_accuracy(25.0, 20.0) - 50.0).abs() < 1e-9);
        assert_eq!(path_accuracy(f64::INFINITY, 20.0), 0.0);
    }
}
