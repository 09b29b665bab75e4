//! TOML exercise set parser and JSON attempt loader.
//!
//! Loads exercise sets from TOML files and directories, validates them,
//! and reads captured attempts.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::AssessmentError;
use crate::model::{
    default_passing_score, Exercise, ExerciseConfig, ExerciseKind, ExerciseSet, StrokeData,
};
use crate::path::parse_path;

/// Intermediate TOML structure for parsing exercise set files.
#[derive(Debug, Deserialize)]
struct TomlExerciseFile {
    exercise_set: TomlExerciseSetHeader,
    #[serde(default)]
    exercises: Vec<TomlExercise>,
}

#[derive(Debug, Deserialize)]
struct TomlExerciseSetHeader {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_passing_score")]
    default_passing_score: u8,
}

#[derive(Debug, Deserialize)]
struct TomlExercise {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    passing_score: Option<u8>,
    #[serde(default)]
    tags: Vec<String>,
    config: toml::Table,
}

/// Resolve the `type` tag (aliases included) and deserialize the config.
fn parse_config(exercise_id: &str, mut table: toml::Table) -> Result<ExerciseConfig> {
    let tag = table
        .get("type")
        .and_then(toml::Value::as_str)
        .with_context(|| format!("exercise '{exercise_id}': config is missing a 'type'"))?;
    let kind: ExerciseKind = tag
        .parse()
        .with_context(|| format!("exercise '{exercise_id}'"))?;
    table.insert("type".into(), toml::Value::String(kind.to_string()));

    toml::Value::Table(table)
        .try_into()
        .with_context(|| format!("exercise '{exercise_id}': invalid {kind} config"))
}

/// Parse a single TOML file into an `ExerciseSet`.
pub fn parse_exercise_set(path: &Path) -> Result<ExerciseSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read exercise set file: {}", path.display()))?;

    parse_exercise_set_str(&content, path)
}

/// Parse a TOML string into an `ExerciseSet` (useful for testing).
pub fn parse_exercise_set_str(content: &str, source_path: &Path) -> Result<ExerciseSet> {
    let parsed: TomlExerciseFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let default_passing = parsed.exercise_set.default_passing_score;
    let exercises = parsed
        .exercises
        .into_iter()
        .map(|e| {
            let config = parse_config(&e.id, e.config)?;
            Ok(Exercise {
                passing_score: e.passing_score.unwrap_or(default_passing),
                id: e.id,
                title: e.title,
                description: e.description,
                tags: e.tags,
                config,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ExerciseSet {
        id: parsed.exercise_set.id,
        name: parsed.exercise_set.name,
        description: parsed.exercise_set.description,
        exercises,
    })
}

/// Whether `err` carries an authoring mistake such as an unknown exercise type.
fn is_content_error(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<AssessmentError>())
        .any(AssessmentError::is_content_error)
}

/// Recursively load all `.toml` exercise set files from a directory.
///
/// Files that fail to read or parse as TOML are logged and skipped. A file
/// with an authoring mistake, such as an unknown exercise type, fails the
/// whole load.
pub fn load_exercise_directory(dir: &Path) -> Result<Vec<ExerciseSet>> {
    let mut sets = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            sets.extend(load_exercise_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_exercise_set(&path) {
                Ok(set) => sets.push(set),
                Err(e) if is_content_error(&e) => return Err(e),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(sets)
}

/// Load exercise sets from either a single file or a directory.
pub fn load_exercises(path: &Path) -> Result<Vec<ExerciseSet>> {
    if path.is_dir() {
        load_exercise_directory(path)
    } else {
        Ok(vec![parse_exercise_set(path)?])
    }
}

/// A warning from exercise set validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The exercise ID (if applicable).
    pub exercise_id: Option<String>,
    /// Warning message.
    pub message: String,
}

impl ValidationWarning {
    fn exercise(id: &str, message: impl Into<String>) -> Self {
        Self {
            exercise_id: Some(id.to_string()),
            message: message.into(),
        }
    }
}

fn outside_canvas(b: &crate::geometry::BoundingBox, width: u32, height: u32) -> bool {
    b.x < 0.0 || b.y < 0.0 || b.right() > width as f64 || b.bottom() > height as f64
}

/// Validate an exercise set for common authoring mistakes.
pub fn validate_exercise_set(set: &ExerciseSet) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if set.exercises.is_empty() {
        warnings.push(ValidationWarning {
            exercise_id: None,
            message: "exercise set has no exercises".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for ex in &set.exercises {
        if !seen_ids.insert(&ex.id) {
            warnings.push(ValidationWarning::exercise(
                &ex.id,
                format!("duplicate exercise ID: {}", ex.id),
            ));
        }
    }

    for ex in &set.exercises {
        let id = ex.id.as_str();
        if ex.passing_score > 100 {
            warnings.push(ValidationWarning::exercise(
                id,
                format!("passing_score {} can never be reached", ex.passing_score),
            ));
        }
        if let Err(e) = ex.config.validate(id) {
            warnings.push(ValidationWarning::exercise(id, e.to_string()));
        }

        let (width, height) = ex.config.canvas_size();
        match &ex.config {
            ExerciseConfig::Line(c) => {
                if c.target_path.trim().is_empty() {
                    warnings.push(ValidationWarning::exercise(id, "target_path is empty"));
                } else if parse_path(&c.target_path).len() < 2 {
                    warnings.push(ValidationWarning::exercise(
                        id,
                        "target_path yields fewer than 2 points",
                    ));
                }
            }
            ExerciseConfig::Dots(c) => {
                if c.dots.is_empty() {
                    warnings.push(ValidationWarning::exercise(id, "dots config has no dots"));
                }
                let mut dot_ids = HashSet::new();
                for d in &c.dots {
                    if !dot_ids.insert(&d.id) {
                        warnings.push(ValidationWarning::exercise(
                            id,
                            format!("duplicate dot ID: {}", d.id),
                        ));
                    }
                }
            }
            ExerciseConfig::Shape(c) => {
                if let Some(corners) = &c.expected_corners {
                    if corners.len() < 3 {
                        warnings.push(ValidationWarning::exercise(
                            id,
                            format!("expected_corners has only {} points", corners.len()),
                        ));
                    } else if let Some(n) = c.shape_type.corner_count() {
                        if corners.len() != n {
                            warnings.push(ValidationWarning::exercise(
                                id,
                                format!(
                                    "{} expects {n} corners but {} are configured",
                                    c.shape_type,
                                    corners.len()
                                ),
                            ));
                        }
                    }
                }
                if c.shape_type.is_round() && c.expected_corners.is_some() {
                    warnings.push(ValidationWarning::exercise(
                        id,
                        format!("expected_corners are ignored for a {}", c.shape_type),
                    ));
                }
                if outside_canvas(&c.target_bounds, width, height) {
                    warnings.push(ValidationWarning::exercise(
                        id,
                        "target_bounds extend outside the canvas",
                    ));
                }
            }
            ExerciseConfig::Color(c) => {
                if c.regions.is_empty() {
                    warnings.push(ValidationWarning::exercise(id, "color config has no regions"));
                }
                for r in &c.regions {
                    if outside_canvas(&r.bounds, width, height) {
                        warnings.push(ValidationWarning::exercise(
                            id,
                            format!("region '{}' extends outside the canvas", r.id),
                        ));
                    }
                }
            }
        }
    }

    warnings
}

/// A captured attempt as stored on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct AttemptFile {
    pub exercise_id: String,
    #[serde(default)]
    pub strokes: StrokeData,
    /// Canvas snapshot, relative to the attempt file.
    #[serde(default)]
    pub image: Option<PathBuf>,
}

impl AttemptFile {
    /// Resolve `image` against the directory of the attempt file.
    pub fn image_path(&self, attempt_path: &Path) -> Option<PathBuf> {
        let image = self.image.as_ref()?;
        if image.is_absolute() {
            return Some(image.clone());
        }
        Some(match attempt_path.parent() {
            Some(dir) => dir.join(image),
            None => image.clone(),
        })
    }
}

/// Load one attempt from a JSON file.
pub fn load_attempt(path: &Path) -> Result<AttemptFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read attempt file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse attempt JSON: {}", path.display()))
}

/// Recursively load every `.json` attempt in a directory, sorted by path.
pub fn load_attempt_directory(dir: &Path) -> Result<Vec<(PathBuf, AttemptFile)>> {
    let mut attempts = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        if path.is_dir() {
            attempts.extend(load_attempt_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "json") {
            match load_attempt(&path) {
                Ok(attempt) => attempts.push((path, attempt)),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(attempts)
}
