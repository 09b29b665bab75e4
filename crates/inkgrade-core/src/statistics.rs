//! Per-exercise and per-session score statistics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ExerciseKind;
use crate::results::AttemptRecord;

/// Statistics for one exercise across all of its attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseStats {
    pub exercise_id: String,
    pub kind: ExerciseKind,
    pub attempts: u32,
    pub mean_score: f64,
    pub best_score: u8,
    /// Score of the highest-numbered attempt.
    pub latest_score: u8,
    /// Fraction of attempts that passed, 0.0-1.0.
    pub pass_rate: f64,
}

/// Statistics for a whole session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub per_exercise: BTreeMap<String, ExerciseStats>,
    pub attempts: usize,
    pub mean_score: f64,
    pub pass_rate: f64,
}

impl SessionStats {
    pub fn empty() -> Self {
        Self {
            per_exercise: BTreeMap::new(),
            attempts: 0,
            mean_score: 0.0,
            pass_rate: 0.0,
        }
    }
}

fn mean_score(records: &[&AttemptRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records
        .iter()
        .map(|r| r.assessment.score as f64)
        .sum::<f64>()
        / records.len() as f64
}

fn pass_rate(records: &[&AttemptRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    records.iter().filter(|r| r.assessment.passed).count() as f64 / records.len() as f64
}

/// Compute session statistics from scored attempts.
pub fn compute_session_stats(records: &[AttemptRecord]) -> SessionStats {
    if records.is_empty() {
        return SessionStats::empty();
    }

    let mut grouped: BTreeMap<&str, Vec<&AttemptRecord>> = BTreeMap::new();
    for r in records {
        grouped.entry(r.exercise_id.as_str()).or_default().push(r);
    }

    let mut per_exercise = BTreeMap::new();
    for (exercise_id, group) in &grouped {
        let best_score = group
            .iter()
            .map(|r| r.assessment.score)
            .max()
            .unwrap_or(0);
        let latest = group.iter().max_by_key(|r| r.attempt);
        let Some(latest) = latest else {
            continue;
        };
        per_exercise.insert(
            exercise_id.to_string(),
            ExerciseStats {
                exercise_id: exercise_id.to_string(),
                kind: latest.kind,
                attempts: group.len() as u32,
                mean_score: mean_score(group),
                best_score,
                latest_score: latest.assessment.score,
                pass_rate: pass_rate(group),
            },
        );
    }

    let all: Vec<&AttemptRecord> = records.iter().collect();
    SessionStats {
        per_exercise,
        attempts: records.len(),
        mean_score: mean_score(&all),
        pass_rate: pass_rate(&all),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{AssessmentMetrics, DotsMetrics, LocalAssessment};
    use uuid::Uuid;

    fn record(exercise_id: &str, attempt: u32, score: u8) -> AttemptRecord {
        AttemptRecord {
            exercise_id: exercise_id.into(),
            kind: ExerciseKind::Dots,
            attempt,
            source: None,
            assessment: LocalAssessment {
                score,
                metrics: AssessmentMetrics::Dots(DotsMetrics::empty(3)),
                passed: score >= 70,
            },
            analysis_us: 0,
            session_id: Uuid::nil(),
        }
    }

    #[test]
    fn empty_session() {
        assert_eq!(compute_session_stats(&[]), SessionStats::empty());
    }

    #[test]
    fn per_exercise_stats() {
        let records = vec![
            record("a", 1, 40),
            record("a", 3, 60),
            record("a", 2, 90),
            record("b", 1, 80),
        ];
        let stats = compute_session_stats(&records);
        let a = &stats.per_exercise["a"];
        assert_eq!(a.attempts, 3);
        assert_eq!(a.best_score, 90);
        assert_eq!(a.latest_score, 60);
        assert!((a.mean_score - 190.0 / 3.0).abs() < 1e-9);
        assert!((a.pass_rate - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.per_exercise["b"].pass_rate, 1.0);
    }

    #[test]
    fn overall_stats() {
        let records = vec![record("a", 1, 50), record("b", 1, 100)];
        let stats = compute_session_stats(&records);
        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.mean_score, 75.0);
        assert_eq!(stats.pass_rate, 0.5);
    }
}
