//! Assessment result types.
//!
//! Every sub-score a caller might display lives in these records so that
//! downstream feedback and persistence layers never recompute metrics.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::colorimetry::Rgb;
use crate::geometry::{BoundingBox, Point};
use crate::model::ExerciseKind;

/// JSON has no infinity; non-finite deviations are stored as `null`.
mod non_finite_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

/// Line-tracing metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineMetrics {
    pub path_accuracy: f64,
    pub smoothness: f64,
    pub completeness: f64,
    /// Mean DTW pair distance in pixels; infinite when nothing was compared.
    #[serde(with = "non_finite_as_null")]
    pub avg_deviation: f64,
    /// Points per sequence after resampling.
    pub sample_count: usize,
}

impl LineMetrics {
    pub fn empty() -> Self {
        Self {
            path_accuracy: 0.0,
            smoothness: 0.0,
            completeness: 0.0,
            avg_deviation: f64::INFINITY,
            sample_count: 0,
        }
    }
}

/// Shape-drawing metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeMetrics {
    /// Composite of bounds, form and closedness.
    pub shape_match: f64,
    pub bounds_match: f64,
    pub aspect_ratio_match: f64,
    pub closedness: f64,
    /// Only for polygons with configured expected corners.
    pub corner_accuracy: Option<f64>,
    /// Ellipse fit or roundness, only for circles and ovals.
    pub roundness: Option<f64>,
    pub detected_corners: usize,
    pub matched_corners: usize,
    pub user_bounds: Option<BoundingBox>,
    pub centroid: Option<Point>,
}

impl ShapeMetrics {
    pub fn empty() -> Self {
        Self {
            shape_match: 0.0,
            bounds_match: 0.0,
            aspect_ratio_match: 0.0,
            closedness: 0.0,
            corner_accuracy: None,
            roundness: None,
            detected_corners: 0,
            matched_corners: 0,
            user_bounds: None,
            centroid: None,
        }
    }
}

/// Connect-the-dots metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DotsMetrics {
    pub dots_hit: usize,
    pub total_dots: usize,
    pub hit_rate: f64,
    pub order_accuracy: f64,
    /// Approximated as the hit rate; connecting lines are not verified.
    pub connection_accuracy: f64,
    /// Ids of the dots in the order they were accepted.
    pub hit_sequence: Vec<String>,
}

impl DotsMetrics {
    pub fn empty(total_dots: usize) -> Self {
        Self {
            dots_hit: 0,
            total_dots,
            hit_rate: 0.0,
            order_accuracy: 0.0,
            connection_accuracy: 0.0,
            hit_sequence: Vec::new(),
        }
    }
}

/// Per-region color outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionMetrics {
    pub region_id: String,
    pub target_color: Rgb,
    /// `None` when the region holds no colored pixels.
    pub dominant_color: Option<Rgb>,
    pub delta_e: Option<f64>,
    pub color_score: f64,
    pub coverage: f64,
}

/// Color-fill metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorMetrics {
    pub color_accuracy: f64,
    pub coverage: f64,
    pub regions: Vec<RegionMetrics>,
}

impl ColorMetrics {
    pub fn empty() -> Self {
        Self {
            color_accuracy: 0.0,
            coverage: 0.0,
            regions: Vec::new(),
        }
    }
}

/// Metrics of one attempt, tagged by exercise kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AssessmentMetrics {
    Line(LineMetrics),
    Shape(ShapeMetrics),
    Dots(DotsMetrics),
    Color(ColorMetrics),
}

impl AssessmentMetrics {
    pub fn kind(&self) -> ExerciseKind {
        match self {
            AssessmentMetrics::Line(_) => ExerciseKind::Line,
            AssessmentMetrics::Shape(_) => ExerciseKind::Shape,
            AssessmentMetrics::Dots(_) => ExerciseKind::Dots,
            AssessmentMetrics::Color(_) => ExerciseKind::Color,
        }
    }
}

/// Final result of scoring one attempt locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalAssessment {
    /// 0-100.
    pub score: u8,
    pub metrics: AssessmentMetrics,
    /// `score >= passing_score` of the exercise.
    pub passed: bool,
}

/// One scored attempt inside a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub exercise_id: String,
    pub kind: ExerciseKind,
    /// 1-based attempt number for this exercise.
    pub attempt: u32,
    /// Where the attempt was loaded from, if it came from a file.
    #[serde(default)]
    pub source: Option<String>,
    pub assessment: LocalAssessment,
    /// Wall-clock analysis time in microseconds.
    pub analysis_us: u64,
    pub session_id: Uuid,
}

/// An attempt that could not be scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptFailure {
    pub exercise_id: String,
    #[serde(default)]
    pub source: Option<String>,
    pub message: String,
}

/// Round a 0-100 value to the nearest integer score.
pub fn to_score(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 100.0).round() as u8
}
