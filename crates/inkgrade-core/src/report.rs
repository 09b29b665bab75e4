//! Session reports with JSON persistence and progress comparison.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::results::{AttemptFailure, AttemptRecord};
use crate::statistics::SessionStats;

/// A complete practice session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub exercise_set: ExerciseSetSummary,
    /// Scored attempts ordered by exercise id, then attempt number.
    pub records: Vec<AttemptRecord>,
    /// Attempts that could not be scored.
    #[serde(default)]
    pub failures: Vec<AttemptFailure>,
    pub stats: SessionStats,
    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Summary of an exercise set (without the exercise definitions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSetSummary {
    pub id: String,
    pub name: String,
    pub exercise_count: usize,
}

impl SessionReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SessionReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Best score per exercise.
    pub fn best_scores(&self) -> BTreeMap<String, u8> {
        let mut map: BTreeMap<String, u8> = BTreeMap::new();
        for r in &self.records {
            let entry = map.entry(r.exercise_id.clone()).or_insert(0);
            *entry = (*entry).max(r.assessment.score);
        }
        map
    }

    /// Compare best scores against a baseline session.
    ///
    /// Changes of at most `threshold` score points count as unchanged.
    pub fn compare(&self, baseline: &SessionReport, threshold: f64) -> ProgressComparison {
        let baseline_scores = baseline.best_scores();
        let current_scores = self.best_scores();

        let mut declines = Vec::new();
        let mut improvements = Vec::new();
        let mut unchanged = 0usize;
        let mut new_exercises = 0usize;

        for (exercise_id, &current) in &current_scores {
            let Some(&before) = baseline_scores.get(exercise_id) else {
                new_exercises += 1;
                continue;
            };
            let change = ScoreChange {
                exercise_id: exercise_id.clone(),
                baseline_score: before,
                current_score: current,
                delta: current as f64 - before as f64,
            };
            if change.delta < -threshold {
                declines.push(change);
            } else if change.delta > threshold {
                improvements.push(change);
            } else {
                unchanged += 1;
            }
        }

        let removed_exercises = baseline_scores
            .keys()
            .filter(|k| !current_scores.contains_key(*k))
            .count();

        ProgressComparison {
            declines,
            improvements,
            unchanged,
            new_exercises,
            removed_exercises,
        }
    }
}

/// Result of comparing two sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressComparison {
    pub declines: Vec<ScoreChange>,
    pub improvements: Vec<ScoreChange>,
    pub unchanged: usize,
    /// Exercises in the current session but not the baseline.
    pub new_exercises: usize,
    /// Exercises in the baseline but not the current session.
    pub removed_exercises: usize,
}

/// Best-score movement of one exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreChange {
    pub exercise_id: String,
    pub baseline_score: u8,
    pub current_score: u8,
    pub delta: f64,
}

impl ProgressComparison {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} declines, {} improvements, {} unchanged\n\n",
            self.declines.len(),
            self.improvements.len(),
            self.unchanged
        ));

        if !self.declines.is_empty() {
            md.push_str("### Declines\n\n");
            md.push_str("| Exercise | Baseline | Current | Delta |\n");
            md.push_str("|----------|----------|---------|-------|\n");
            for c in &self.declines {
                md.push_str(&format!(
                    "| {} | {} | {} | {:.0} |\n",
                    c.exercise_id, c.baseline_score, c.current_score, c.delta
                ));
            }
            md.push('\n');
        }

        if !self.improvements.is_empty() {
            md.push_str("### Improvements\n\n");
            md.push_str("| Exercise | Baseline | Current | Delta |\n");
            md.push_str("|----------|----------|---------|-------|\n");
            for c in &self.improvements {
                md.push_str(&format!(
                    "| {} | {} | {} | +{:.0} |\n",
                    c.exercise_id, c.baseline_score, c.current_score, c.delta
                ));
            }
        }

        md
    }

    /// Returns true if any exercise scored worse than before.
    pub fn has_declines(&self) -> bool {
        !self.declines.is_empty()
    }
}
