//! Shape analyzer.
//!
//! Polygons are judged by corner detection plus greedy matching against the
//! expected corners; circles and ovals by an ellipse fit (or a roundness
//! measure when no ellipse is configured). Every shape is also judged on
//! its bounding box, aspect ratio and whether the outline was closed.

use std::f64::consts::FRAC_PI_4;

use crate::geometry::{centroid, clamp_score, turn_angle, BoundingBox, Point};
use crate::model::{EllipseSpec, ShapeConfig, StrokeData};
use crate::results::{to_score, ShapeMetrics};

/// Turn angle (radians) from which a sample counts as a corner.
pub const CORNER_ANGLE: f64 = FRAC_PI_4;

/// Detected corners closer than this (px) are merged.
pub const CORNER_MERGE_DISTANCE: f64 = 20.0;

/// Share of the larger target side the end-to-start gap may reach.
const CLOSE_GAP_RATIO: f64 = 0.15;

/// Penalty in score points per missing or extra corner.
const CORNER_COUNT_PENALTY: f64 = 20.0;

/// Outcome of matching detected corners to expected ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerMatch {
    pub accuracy: f64,
    pub matched: usize,
}

/// How well the user's box matches the target box in position and size.
pub fn bounds_match(user: &BoundingBox, target: &BoundingBox, tolerance: f64) -> f64 {
    let position_error = (user.x - target.x).abs() + (user.y - target.y).abs();
    let size_error = (user.width - target.width).abs() + (user.height - target.height).abs();
    clamp_score(100.0 * (1.0 - (position_error + size_error) / (tolerance * 10.0)))
}

/// `100 * (1 - |target h/w - user h/w|)`, 0 for degenerate widths.
pub fn aspect_ratio_match(user: &BoundingBox, target: &BoundingBox) -> f64 {
    if user.width <= 0.0 || target.width <= 0.0 {
        return 0.0;
    }
    let target_ratio = target.height / target.width;
    let user_ratio = user.height / user.width;
    clamp_score(100.0 * (1.0 - (target_ratio - user_ratio).abs()))
}

/// How close the last point came back to the first.
///
/// 100 for a gap of zero, 0 once the gap reaches 15% of the larger target
/// side. Fewer than three points cannot fail and score 100.
pub fn closedness(points: &[Point], target: &BoundingBox) -> f64 {
    if points.len() < 3 {
        return 100.0;
    }
    let gap = points[0].distance(points[points.len() - 1]);
    let max_gap = target.width.max(target.height) * CLOSE_GAP_RATIO;
    if max_gap <= 0.0 {
        return if gap == 0.0 { 100.0 } else { 0.0 };
    }
    clamp_score(100.0 * (1.0 - gap / max_gap))
}

/// Roundness from the coefficient of variation of centroid distances.
pub fn roundness(points: &[Point]) -> f64 {
    let Some(center) = centroid(points) else {
        return 0.0;
    };
    let distances: Vec<f64> = points.iter().map(|p| p.distance(center)).collect();
    let n = distances.len() as f64;
    let mean = distances.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = distances.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n;
    let cv = variance.sqrt() / mean;
    clamp_score(100.0 * (1.0 - 2.0 * cv))
}

/// Radius of `ellipse` along the direction `angle` from its center.
fn ellipse_radius(ellipse: &EllipseSpec, angle: f64) -> f64 {
    let (rx, ry) = (ellipse.radius_x, ellipse.radius_y);
    rx * ry / ((ry * angle.cos()).powi(2) + (rx * angle.sin()).powi(2)).sqrt()
}

/// Fit against an exact ellipse by mean radial error at each point's polar angle.
pub fn match_ellipse(points: &[Point], ellipse: &EllipseSpec, tolerance: f64) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let c = ellipse.center;
    let total_error: f64 = points
        .iter()
        .map(|p| {
            let (dx, dy) = (p.x - c.x, p.y - c.y);
            let expected = ellipse_radius(ellipse, dy.atan2(dx));
            (dx.hypot(dy) - expected).abs()
        })
        .sum();
    let mean_error = total_error / points.len() as f64;
    clamp_score(100.0 * (1.0 - mean_error / (tolerance * 3.0)))
}

/// Samples where the path turns by at least [`CORNER_ANGLE`].
pub fn detect_corners(points: &[Point]) -> Vec<Point> {
    points
        .windows(3)
        .filter(|w| turn_angle(w[0], w[1], w[2]).is_some_and(|a| a >= CORNER_ANGLE))
        .map(|w| w[1])
        .collect()
}

/// Merge runs of corners within `min_distance` of each other into their mean.
pub fn simplify_corners(corners: &[Point], min_distance: f64) -> Vec<Point> {
    let mut clusters: Vec<(Point, usize)> = Vec::new();
    for &corner in corners {
        match clusters.last_mut() {
            Some((mean, count)) if mean.distance(corner) < min_distance => {
                let n = *count as f64;
                *mean = Point::new(
                    (mean.x * n + corner.x) / (n + 1.0),
                    (mean.y * n + corner.y) / (n + 1.0),
                );
                *count += 1;
            }
            _ => clusters.push((corner, 1)),
        }
    }
    clusters.into_iter().map(|(p, _)| p).collect()
}

/// Greedily match each expected corner (in order) to its closest unused
/// detected corner within `tolerance * 3`.
///
/// Accuracy is the mean per-corner distance score minus
/// [`CORNER_COUNT_PENALTY`] per corner-count mismatch.
pub fn match_corners(detected: &[Point], expected: &[Point], tolerance: f64) -> CornerMatch {
    if expected.is_empty() {
        return CornerMatch {
            accuracy: 0.0,
            matched: 0,
        };
    }
    let window = tolerance * 3.0;
    let mut used = vec![false; detected.len()];
    let mut matched = 0;
    let mut total = 0.0;

    for e in expected {
        let best = detected
            .iter()
            .enumerate()
            .filter(|(i, _)| !used[*i])
            .map(|(i, d)| (i, d.distance(*e)))
            .filter(|&(_, dist)| dist <= window)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((i, dist)) = best {
            used[i] = true;
            matched += 1;
            total += 100.0 * (1.0 - dist / window);
        }
    }

    let match_accuracy = total / expected.len() as f64;
    let mismatch = detected.len().abs_diff(expected.len()) as f64;
    CornerMatch {
        accuracy: clamp_score(match_accuracy - CORNER_COUNT_PENALTY * mismatch),
        matched,
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn analyze(strokes: &StrokeData, config: &ShapeConfig) -> ShapeMetrics {
    let points = strokes.all_points();
    if points.len() < 3 {
        return ShapeMetrics::empty();
    }
    let Some(user_bounds) = BoundingBox::from_points(&points) else {
        return ShapeMetrics::empty();
    };
    let target = &config.target_bounds;

    let bounds = bounds_match(&user_bounds, target, config.tolerance);
    let aspect = aspect_ratio_match(&user_bounds, target);
    let closed = closedness(&points, target);

    let mut metrics = ShapeMetrics {
        bounds_match: bounds,
        aspect_ratio_match: aspect,
        closedness: closed,
        user_bounds: Some(user_bounds),
        centroid: centroid(&points),
        ..ShapeMetrics::empty()
    };

    if config.shape_type.is_round() {
        let form = match &config.ellipse {
            Some(ellipse) => match_ellipse(&points, ellipse, config.tolerance),
            None => roundness(&points),
        };
        metrics.roundness = Some(form);
        metrics.shape_match = mean(&[bounds, form, closed]);
    } else {
        let corners = simplify_corners(&detect_corners(&points), CORNER_MERGE_DISTANCE);
        metrics.detected_corners = corners.len();
        match config.expected_corners.as_deref() {
            Some(expected) if !expected.is_empty() => {
                let m = match_corners(&corners, expected, config.tolerance);
                metrics.corner_accuracy = Some(m.accuracy);
                metrics.matched_corners = m.matched;
                metrics.shape_match = mean(&[bounds, m.accuracy, closed]);
            }
            _ => {
                metrics.shape_match = mean(&[bounds, aspect, closed]);
            }
        }
    }

    tracing::debug!(
        shape = %config.shape_type,
        shape_match = metrics.shape_match,
        closedness = metrics.closedness,
        detected_corners = metrics.detected_corners,
        "shape analysis"
    );
    metrics
}

/// Weighted score: shape match 50, closedness 30, form 20.
///
/// The form term is corner accuracy for polygons with expected corners,
/// roundness for round shapes, aspect ratio otherwise.
pub fn score(metrics: &ShapeMetrics) -> u8 {
    let form = metrics
        .corner_accuracy
        .or(metrics.roundness)
        .unwrap_or(metrics.aspect_ratio_match);
    to_score((metrics.shape_match * 50.0 + metrics.closedness * 30.0 + form * 20.0) / 100.0)
}
