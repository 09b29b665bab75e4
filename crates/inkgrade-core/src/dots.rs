//! Connect-the-dots scorer.
//!
//! Raw samples are hit-tested against the dots in drawing order. The first
//! sample within the hit radius of an un-hit dot marks it; a dot is never
//! un-hit. When order is required, a touch on any dot other than the next
//! one in sequence is ignored and that dot stays un-hit.

use crate::model::{DotsConfig, StrokeData};
use crate::results::{to_score, DotsMetrics};

pub fn analyze(strokes: &StrokeData, config: &DotsConfig) -> DotsMetrics {
    let total = config.dots.len();
    if total == 0 {
        return DotsMetrics::empty(0);
    }

    let mut hit = vec![false; total];
    let mut sequence: Vec<usize> = Vec::new();

    for p in strokes.strokes.iter().flat_map(|s| s.points.iter()) {
        let pos = p.position();
        for (idx, dot) in config.dots.iter().enumerate() {
            if hit[idx] || pos.distance(dot.position()) > config.dot_radius {
                continue;
            }
            if config.require_order {
                if let Some(&last) = sequence.last() {
                    if idx != last + 1 {
                        continue;
                    }
                }
            }
            hit[idx] = true;
            sequence.push(idx);
            // one dot per sample
            break;
        }
    }

    let dots_hit = sequence.len();
    let hit_rate = 100.0 * dots_hit as f64 / total as f64;
    let order_accuracy = order_accuracy(&sequence);

    let metrics = DotsMetrics {
        dots_hit,
        total_dots: total,
        hit_rate,
        order_accuracy,
        connection_accuracy: hit_rate,
        hit_sequence: sequence.iter().map(|&i| config.dots[i].id.clone()).collect(),
    };
    tracing::debug!(
        dots_hit,
        total_dots = total,
        order_accuracy,
        "dots analysis"
    );
    metrics
}

/// Share of hits whose dot index increased over the previous hit; the first
/// hit always counts.
fn order_accuracy(sequence: &[usize]) -> f64 {
    if sequence.is_empty() {
        return 0.0;
    }
    let in_order = 1 + sequence.windows(2).filter(|w| w[1] > w[0]).count();
    100.0 * in_order as f64 / sequence.len() as f64
}

pub fn score(metrics: &DotsMetrics) -> u8 {
    to_score(
        0.5 * metrics.hit_rate + 0.3 * metrics.order_accuracy + 0.2 * metrics.connection_accuracy,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::model::{Dot, Stroke};

    fn dots_config(require_order: bool) -> DotsConfig {
        DotsConfig {
            canvas_width: 600,
            canvas_height: 400,
            dots: vec![
                Dot {
                    id: "1".into(),
                    x: 100.0,
                    y: 100.0,
                },
                Dot {
                    id: "2".into(),
                    x: 300.0,
                    y: 100.0,
                },
                Dot {
                    id: "3".into(),
                    x: 300.0,
                    y: 300.0,
                },
            ],
            require_order,
            dot_radius: 15.0,
        }
    }

    fn visit(order: &[(f64, f64)]) -> StrokeData {
        StrokeData::new(vec![Stroke::from_points(
            "s",
            order.iter().map(|&(x, y)| Point::new(x, y)),
        )])
    }

    #[test]
    fn in_order_hits_everything() {
        let data = visit(&[(100.0, 100.0), (300.0, 100.0), (300.0, 300.0)]);
        let m = analyze(&data, &dots_config(true));
        assert_eq!(m.dots_hit, 3);
        assert_eq!(m.order_accuracy, 100.0);
        assert_eq!(m.hit_sequence, vec!["1", "2", "3"]);
        assert_eq!(score(&m), 100);
    }

    #[test]
    fn out_of_order_touch_is_ignored_when_order_required() {
        // 1 -> 3 -> 2: the touch on 3 comes too early and is dropped
        let data = visit(&[(100.0, 100.0), (300.0, 300.0), (300.0, 100.0)]);
        let m = analyze(&data, &dots_config(true));
        assert_eq!(m.hit_sequence, vec!["1", "2"]);
        assert_eq!(m.dots_hit, 2);
        assert_eq!(m.order_accuracy, 100.0);
        // 0.5 * 66.7 + 0.3 * 100 + 0.2 * 66.7
        assert_eq!(score(&m), 77);
    }

    #[test]
    fn out_of_order_lowers_order_accuracy_when_free() {
        let data = visit(&[(100.0, 100.0), (300.0, 300.0), (300.0, 100.0)]);
        let m = analyze(&data, &dots_config(false));
        assert_eq!(m.hit_sequence, vec!["1", "3", "2"]);
        assert!((m.order_accuracy - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(m.hit_rate, 100.0);
    }

    #[test]
    fn first_hit_may_be_any_dot() {
        let data = visit(&[(300.0, 100.0), (300.0, 300.0)]);
        let m = analyze(&data, &dots_config(true));
        assert_eq!(m.hit_sequence, vec!["2", "3"]);
        assert_eq!(m.order_accuracy, 100.0);
    }

    #[test]
    fn dots_stay_hit_and_radius_is_inclusive() {
        let data = visit(&[(115.0, 100.0), (100.0, 100.0), (100.0, 116.0)]);
        let m = analyze(&data, &dots_config(false));
        assert_eq!(m.dots_hit, 1);
        assert_eq!(m.hit_sequence, vec!["1"]);
    }

    #[test]
    fn no_dots_or_no_strokes() {
        let mut cfg = dots_config(true);
        assert_eq!(analyze(&StrokeData::default(), &cfg).dots_hit, 0);
        assert_eq!(score(&analyze(&StrokeData::default(), &cfg)), 0);
        cfg.dots.clear();
        let m = analyze(&visit(&[(0.0, 0.0)]), &cfg);
        assert_eq!(m, DotsMetrics::empty(0));
    }
}
