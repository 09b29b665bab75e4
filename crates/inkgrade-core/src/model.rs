//! Core data model types for inkgrade.
//!
//! Captured drawing input ([`StrokeData`]) and authored exercise content
//! ([`Exercise`], [`ExerciseConfig`]). Everything here is plain data passed
//! by reference into the analyzers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::colorimetry::Rgb;
use crate::error::AssessmentError;
use crate::geometry::{BoundingBox, Point};

// ---------------------------------------------------------------------------
// Captured input
// ---------------------------------------------------------------------------

/// One pointer sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_pressure")]
    pub pressure: f64,
    /// Milliseconds since the attempt started; capture layers report fractions.
    #[serde(default)]
    pub timestamp_ms: f64,
}

fn default_pressure() -> f64 {
    0.5
}

impl StrokePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            pressure: default_pressure(),
            timestamp_ms: 0.0,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// One continuous pointer-down to pointer-up gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub id: String,
    pub points: Vec<StrokePoint>,
    #[serde(default = "default_stroke_color")]
    pub color: String,
    #[serde(default = "default_brush_size")]
    pub brush_size: f64,
}

fn default_stroke_color() -> String {
    "#000000".to_string()
}

fn default_brush_size() -> f64 {
    4.0
}

impl Stroke {
    /// Build a stroke from bare positions with default pressure and styling.
    pub fn from_points(id: impl Into<String>, points: impl IntoIterator<Item = Point>) -> Self {
        Self {
            id: id.into(),
            points: points
                .into_iter()
                .map(|p| StrokePoint::new(p.x, p.y))
                .collect(),
            color: default_stroke_color(),
            brush_size: default_brush_size(),
        }
    }

    pub fn positions(&self) -> Vec<Point> {
        self.points.iter().map(StrokePoint::position).collect()
    }
}

/// All strokes of one exercise attempt, in drawing order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrokeData {
    #[serde(default)]
    pub strokes: Vec<Stroke>,
    #[serde(default)]
    pub start_time_ms: u64,
    #[serde(default)]
    pub end_time_ms: u64,
}

impl StrokeData {
    pub fn new(strokes: Vec<Stroke>) -> Self {
        Self {
            strokes,
            start_time_ms: 0,
            end_time_ms: 0,
        }
    }

    /// Every sample position, strokes concatenated in drawing order.
    pub fn all_points(&self) -> Vec<Point> {
        self.strokes
            .iter()
            .flat_map(|s| s.points.iter().map(StrokePoint::position))
            .collect()
    }

    pub fn point_count(&self) -> usize {
        self.strokes.iter().map(|s| s.points.len()).sum()
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_time_ms.saturating_sub(self.start_time_ms)
    }

    /// Reject NaN or infinite samples coming from a broken capture layer.
    pub fn validate(&self) -> Result<(), AssessmentError> {
        for (si, stroke) in self.strokes.iter().enumerate() {
            for (pi, p) in stroke.points.iter().enumerate() {
                if !p.x.is_finite() || !p.y.is_finite() || !p.pressure.is_finite() {
                    return Err(AssessmentError::non_finite(format!(
                        "strokes[{si}].points[{pi}]"
                    )));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Exercise content
// ---------------------------------------------------------------------------

/// An authored exercise: its configuration plus the pass threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Minimum score (0-100) counted as a pass.
    #[serde(default = "default_passing_score")]
    pub passing_score: u8,
    #[serde(default)]
    pub tags: Vec<String>,
    pub config: ExerciseConfig,
}

pub fn default_passing_score() -> u8 {
    70
}

/// A named collection of exercises.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseSet {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
}

impl ExerciseSet {
    pub fn find(&self, exercise_id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == exercise_id)
    }
}

/// The four kinds of exercise the engine can score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseKind {
    Line,
    Dots,
    Shape,
    Color,
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExerciseKind::Line => write!(f, "line"),
            ExerciseKind::Dots => write!(f, "dots"),
            ExerciseKind::Shape => write!(f, "shape"),
            ExerciseKind::Color => write!(f, "color"),
        }
    }
}

impl FromStr for ExerciseKind {
    type Err = AssessmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "line" | "trace" => Ok(ExerciseKind::Line),
            "dots" | "connect-the-dots" => Ok(ExerciseKind::Dots),
            "shape" => Ok(ExerciseKind::Shape),
            "color" | "colour" | "fill" => Ok(ExerciseKind::Color),
            other => Err(AssessmentError::UnknownExerciseType(other.to_string())),
        }
    }
}

/// Per-kind exercise configuration; the `type` field selects the analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExerciseConfig {
    Line(LineConfig),
    Dots(DotsConfig),
    Shape(ShapeConfig),
    Color(ColorConfig),
}

fn default_canvas_width() -> u32 {
    600
}

fn default_canvas_height() -> u32 {
    400
}

/// Trace a target path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineConfig {
    #[serde(default = "default_canvas_width")]
    pub canvas_width: u32,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: u32,
    /// SVG path data of the line to trace.
    pub target_path: String,
    /// Allowed deviation in pixels.
    pub stroke_tolerance: f64,
    #[serde(default)]
    pub start_point: Option<Point>,
    #[serde(default)]
    pub end_point: Option<Point>,
}

/// A target dot in a connect-the-dots exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dot {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

impl Dot {
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Connect the dots, optionally in sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DotsConfig {
    #[serde(default = "default_canvas_width")]
    pub canvas_width: u32,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: u32,
    pub dots: Vec<Dot>,
    #[serde(default = "default_true")]
    pub require_order: bool,
    /// Hit radius around each dot in pixels.
    pub dot_radius: f64,
}

fn default_true() -> bool {
    true
}

/// Shapes a child can be asked to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Triangle,
    Square,
    Diamond,
    Rectangle,
    Circle,
    Oval,
}

impl ShapeKind {
    pub fn is_round(self) -> bool {
        matches!(self, ShapeKind::Circle | ShapeKind::Oval)
    }

    /// Corner count of the polygonal kinds; `None` for round shapes.
    pub fn corner_count(self) -> Option<usize> {
        match self {
            ShapeKind::Triangle => Some(3),
            ShapeKind::Square | ShapeKind::Diamond | ShapeKind::Rectangle => Some(4),
            ShapeKind::Circle | ShapeKind::Oval => None,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeKind::Triangle => "triangle",
            ShapeKind::Square => "square",
            ShapeKind::Diamond => "diamond",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Oval => "oval",
        };
        f.write_str(name)
    }
}

/// Exact ellipse a round shape is fitted against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EllipseSpec {
    pub center: Point,
    pub radius_x: f64,
    pub radius_y: f64,
}

/// Draw a named shape inside a target box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeConfig {
    #[serde(default = "default_canvas_width")]
    pub canvas_width: u32,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: u32,
    pub shape_type: ShapeKind,
    pub target_bounds: BoundingBox,
    #[serde(default)]
    pub expected_corners: Option<Vec<Point>>,
    #[serde(default)]
    pub ellipse: Option<EllipseSpec>,
    /// Pixel tolerance; scales the bounds, corner and ellipse windows.
    pub tolerance: f64,
}

/// A region to be filled with a target color.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorRegion {
    pub id: String,
    pub bounds: BoundingBox,
    pub target_color: Rgb,
    #[serde(default)]
    pub outline_path: Option<String>,
}

/// Fill regions with the right colors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorConfig {
    #[serde(default = "default_canvas_width")]
    pub canvas_width: u32,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: u32,
    pub regions: Vec<ColorRegion>,
    /// CIEDE2000 difference at which a region's color score reaches zero.
    pub delta_e_tolerance: f64,
}

fn check_finite(field: &str, value: f64) -> Result<(), AssessmentError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AssessmentError::non_finite(field))
    }
}

fn check_point(field: &str, p: Point) -> Result<(), AssessmentError> {
    if p.is_finite() {
        Ok(())
    } else {
        Err(AssessmentError::non_finite(field))
    }
}

fn check_bounds(field: &str, b: &BoundingBox) -> Result<(), AssessmentError> {
    if b.is_finite() {
        Ok(())
    } else {
        Err(AssessmentError::non_finite(field))
    }
}

fn check_positive(exercise_id: &str, field: &str, value: f64) -> Result<(), AssessmentError> {
    check_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(AssessmentError::InvalidConfig {
            exercise_id: exercise_id.to_string(),
            message: format!("{field} must be positive, got {value}"),
        })
    }
}

impl ExerciseConfig {
    pub fn kind(&self) -> ExerciseKind {
        match self {
            ExerciseConfig::Line(_) => ExerciseKind::Line,
            ExerciseConfig::Dots(_) => ExerciseKind::Dots,
            ExerciseConfig::Shape(_) => ExerciseKind::Shape,
            ExerciseConfig::Color(_) => ExerciseKind::Color,
        }
    }

    /// Canvas `(width, height)` in pixels.
    pub fn canvas_size(&self) -> (u32, u32) {
        match self {
            ExerciseConfig::Line(c) => (c.canvas_width, c.canvas_height),
            ExerciseConfig::Dots(c) => (c.canvas_width, c.canvas_height),
            ExerciseConfig::Shape(c) => (c.canvas_width, c.canvas_height),
            ExerciseConfig::Color(c) => (c.canvas_width, c.canvas_height),
        }
    }

    /// Reject non-finite numbers and non-positive tolerances.
    pub fn validate(&self, exercise_id: &str) -> Result<(), AssessmentError> {
        match self {
            ExerciseConfig::Line(c) => {
                check_positive(exercise_id, "stroke_tolerance", c.stroke_tolerance)?;
                if let Some(p) = c.start_point {
                    check_point("start_point", p)?;
                }
                if let Some(p) = c.end_point {
                    check_point("end_point", p)?;
                }
            }
            ExerciseConfig::Dots(c) => {
                check_positive(exercise_id, "dot_radius", c.dot_radius)?;
                for (i, d) in c.dots.iter().enumerate() {
                    check_point(&format!("dots[{i}]"), d.position())?;
                }
            }
            ExerciseConfig::Shape(c) => {
                check_positive(exercise_id, "tolerance", c.tolerance)?;
                check_bounds("target_bounds", &c.target_bounds)?;
                for (i, p) in c.expected_corners.iter().flatten().enumerate() {
                    check_point(&format!("expected_corners[{i}]"), *p)?;
                }
                if let Some(e) = &c.ellipse {
                    check_point("ellipse.center", e.center)?;
                    check_positive(exercise_id, "ellipse.radius_x", e.radius_x)?;
                    check_positive(exercise_id, "ellipse.radius_y", e.radius_y)?;
                }
            }
            ExerciseConfig::Color(c) => {
                check_positive(exercise_id, "delta_e_tolerance", c.delta_e_tolerance)?;
                for (i, r) in c.regions.iter().enumerate() {
                    check_bounds(&format!("regions[{i}].bounds"), &r.bounds)?;
                }
            }
        }
        Ok(())
    }
}
