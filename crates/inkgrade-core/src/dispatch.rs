//! Routes an attempt to the analyzer for its exercise kind.

use crate::error::AssessmentError;
use crate::model::{Exercise, ExerciseConfig, StrokeData};
use crate::raster::PixelBuffer;
use crate::results::{AssessmentMetrics, ColorMetrics, LocalAssessment};
use crate::{color, dots, line, shape};

/// Score one attempt at `exercise`.
///
/// `raster` is only read for color exercises; a color exercise without one
/// scores 0 rather than failing. Errors are limited to non-finite input and
/// unusable exercise configs.
pub fn assess(
    exercise: &Exercise,
    strokes: &StrokeData,
    raster: Option<&dyn PixelBuffer>,
) -> Result<LocalAssessment, AssessmentError> {
    strokes.validate()?;
    exercise.config.validate(&exercise.id)?;

    let (score, metrics) = match &exercise.config {
        ExerciseConfig::Line(config) => {
            let m = line::analyze(strokes, config);
            (line::score(&m), AssessmentMetrics::Line(m))
        }
        ExerciseConfig::Shape(config) => {
            let m = shape::analyze(strokes, config);
            (shape::score(&m), AssessmentMetrics::Shape(m))
        }
        ExerciseConfig::Dots(config) => {
            let m = dots::analyze(strokes, config);
            (dots::score(&m), AssessmentMetrics::Dots(m))
        }
        ExerciseConfig::Color(config) => match raster {
            Some(buffer) => {
                let m = color::analyze(buffer, config);
                (color::score(&m), AssessmentMetrics::Color(m))
            }
            None => {
                tracing::warn!(
                    exercise = %exercise.id,
                    "color exercise assessed without raster data"
                );
                (0, AssessmentMetrics::Color(ColorMetrics::empty()))
            }
        },
    };

    tracing::debug!(exercise = %exercise.id, kind = %exercise.config.kind(), score, "assessed");
    Ok(LocalAssessment {
        score,
        metrics,
        passed: score >= exercise.passing_score,
    })
}
