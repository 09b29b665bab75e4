//! Batch assessment engine.
//!
//! Scores many attempts concurrently. Analysis is CPU-bound, so every job
//! runs on the blocking pool with a semaphore bounding how many run at once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::dispatch::assess;
use crate::model::{ExerciseSet, StrokeData};
use crate::raster::{PixelBuffer, RgbaBuffer};
use crate::report::{ExerciseSetSummary, SessionReport};
use crate::results::{AttemptFailure, AttemptRecord};
use crate::statistics::compute_session_stats;

/// Configuration for the assessment engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum concurrent analyses.
    pub parallelism: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { parallelism: 4 }
    }
}

/// One attempt waiting to be scored.
#[derive(Debug, Clone)]
pub struct AttemptJob {
    pub exercise_id: String,
    pub strokes: StrokeData,
    /// Canvas snapshot for color exercises.
    pub raster: Option<RgbaBuffer>,
    pub source: Option<String>,
}

impl AttemptJob {
    pub fn new(exercise_id: impl Into<String>, strokes: StrokeData) -> Self {
        Self {
            exercise_id: exercise_id.into(),
            strokes,
            raster: None,
            source: None,
        }
    }

    pub fn with_raster(mut self, raster: RgbaBuffer) -> Self {
        self.raster = Some(raster);
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Attempt counter per exercise id, shared across sessions.
#[derive(Debug, Default)]
pub struct AttemptTracker {
    counts: Mutex<HashMap<String, u32>>,
}

impl AttemptTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment the counter for `exercise_id` and return the new 1-based value.
    pub fn next(&self, exercise_id: &str) -> u32 {
        let mut counts = self
            .counts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let count = counts.entry(exercise_id.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    /// Attempts recorded so far for `exercise_id`.
    pub fn count(&self, exercise_id: &str) -> u32 {
        let counts = self
            .counts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        counts.get(exercise_id).copied().unwrap_or(0)
    }
}

/// Progress reporting trait.
pub trait ProgressReporter: Send + Sync {
    fn on_attempt_start(&self, exercise_id: &str, attempt: u32);
    fn on_attempt_complete(&self, record: &AttemptRecord);
    fn on_attempt_error(&self, exercise_id: &str, error: &str);
    fn on_session_complete(&self, total: usize, completed: usize, failed: usize, elapsed: Duration);
}

/// No-op progress reporter.
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn on_attempt_start(&self, _: &str, _: u32) {}
    fn on_attempt_complete(&self, _: &AttemptRecord) {}
    fn on_attempt_error(&self, _: &str, _: &str) {}
    fn on_session_complete(&self, _: usize, _: usize, _: usize, _: Duration) {}
}

/// The batch assessment engine.
pub struct AssessmentEngine {
    config: EngineConfig,
    tracker: Arc<AttemptTracker>,
}

impl AssessmentEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_tracker(config, Arc::new(AttemptTracker::new()))
    }

    /// Use an existing tracker so attempt numbers continue across sessions.
    pub fn with_tracker(config: EngineConfig, tracker: Arc<AttemptTracker>) -> Self {
        Self { config, tracker }
    }

    pub fn tracker(&self) -> &Arc<AttemptTracker> {
        &self.tracker
    }

    /// Score every job against `exercise_set`.
    ///
    /// Attempt numbers are assigned in job order. A job whose exercise is
    /// unknown, or whose input is rejected, is recorded as a failure and the
    /// rest of the batch carries on.
    pub async fn run(
        &self,
        exercise_set: &ExerciseSet,
        jobs: Vec<AttemptJob>,
        progress: &dyn ProgressReporter,
    ) -> Result<SessionReport> {
        let start = Instant::now();
        let session_id = Uuid::new_v4();
        let semaphore = Arc::new(Semaphore::new(self.config.parallelism.max(1)));
        let total = jobs.len();

        let mut failures = Vec::new();
        let mut futures = FuturesUnordered::new();

        for job in jobs {
            let Some(exercise) = exercise_set.find(&job.exercise_id) else {
                tracing::warn!("exercise '{}' not found, skipping attempt", job.exercise_id);
                let message = format!("unknown exercise: {}", job.exercise_id);
                progress.on_attempt_error(&job.exercise_id, &message);
                failures.push(AttemptFailure {
                    exercise_id: job.exercise_id,
                    source: job.source,
                    message,
                });
                continue;
            };
            let exercise = Arc::new(exercise.clone());
            let attempt = self.tracker.next(&exercise.id);
            let semaphore = Arc::clone(&semaphore);

            futures.push(async move {
                let exercise_id = job.exercise_id.clone();
                let source = job.source.clone();
                let inner = async move {
                    let _permit = semaphore
                        .acquire_owned()
                        .await
                        .map_err(|_| anyhow::anyhow!("semaphore closed"))?;
                    progress.on_attempt_start(&exercise.id, attempt);

                    let scored = tokio::task::spawn_blocking(move || {
                        let analysis_start = Instant::now();
                        let raster = job.raster.as_ref().map(|r| r as &dyn PixelBuffer);
                        let assessment = assess(&exercise, &job.strokes, raster)?;
                        Ok::<_, anyhow::Error>(AttemptRecord {
                            exercise_id: exercise.id.clone(),
                            kind: exercise.config.kind(),
                            attempt,
                            source: job.source,
                            assessment,
                            analysis_us: analysis_start.elapsed().as_micros() as u64,
                            session_id,
                        })
                    })
                    .await
                    .map_err(|e| anyhow::anyhow!("analysis task failed: {e}"))??;
                    Ok::<_, anyhow::Error>(scored)
                };
                (exercise_id, source, inner.await)
            });
        }

        let mut records = Vec::new();
        let mut completed = 0usize;

        while let Some((exercise_id, source, result)) = futures.next().await {
            match result {
                Ok(record) => {
                    progress.on_attempt_complete(&record);
                    records.push(record);
                    completed += 1;
                }
                Err(e) => {
                    tracing::error!("assessment failed for {exercise_id}: {e:#}");
                    progress.on_attempt_error(&exercise_id, &format!("{e:#}"));
                    failures.push(AttemptFailure {
                        exercise_id,
                        source,
                        message: format!("{e:#}"),
                    });
                }
            }
        }

        records.sort_by(|a, b| {
            a.exercise_id
                .cmp(&b.exercise_id)
                .then(a.attempt.cmp(&b.attempt))
        });

        let elapsed = start.elapsed();
        progress.on_session_complete(total, completed, failures.len(), elapsed);

        Ok(SessionReport {
            id: session_id,
            created_at: chrono::Utc::now(),
            exercise_set: ExerciseSetSummary {
                id: exercise_set.id.clone(),
                name: exercise_set.name.clone(),
                exercise_count: exercise_set.exercises.len(),
            },
            stats: compute_session_stats(&records),
            records,
            failures,
            duration_ms: elapsed.as_millis() as u64,
        })
    }
}
