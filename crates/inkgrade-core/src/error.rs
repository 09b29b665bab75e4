//! Engine error types.
//!
//! Drawing conditions (empty strokes, zero-length paths, missing pixels)
//! never surface here; they degrade to zeroed metrics instead. These errors
//! cover content-authoring mistakes and corrupted upstream input only.

use thiserror::Error;

/// Hard failures of the assessment engine.
#[derive(Debug, Error)]
pub enum AssessmentError {
    /// The exercise config carried a `type` tag the engine does not know.
    #[error("unknown exercise type: {0}")]
    UnknownExerciseType(String),

    /// A coordinate, pressure, tolerance or bound was NaN or infinite.
    #[error("non-finite value in {field}")]
    NonFiniteInput { field: String },

    /// The exercise config is structurally unusable (e.g. zero tolerance).
    #[error("invalid config for exercise '{exercise_id}': {message}")]
    InvalidConfig {
        exercise_id: String,
        message: String,
    },

    /// A raster buffer whose byte length does not match its dimensions.
    #[error("raster buffer is {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    InvalidRaster {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

impl AssessmentError {
    pub(crate) fn non_finite(field: impl Into<String>) -> Self {
        AssessmentError::NonFiniteInput {
            field: field.into(),
        }
    }

    /// Returns `true` if the error stems from authored exercise content
    /// rather than from captured drawing input.
    pub fn is_content_error(&self) -> bool {
        matches!(
            self,
            AssessmentError::UnknownExerciseType(_) | AssessmentError::InvalidConfig { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_errors_are_classified() {
        assert!(AssessmentError::UnknownExerciseType("paint".into()).is_content_error());
        assert!(!AssessmentError::non_finite("strokes[0].points[3].x").is_content_error());
    }

    #[test]
    fn display_messages() {
        let err = AssessmentError::InvalidRaster {
            width: 2,
            height: 2,
            expected: 16,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "raster buffer is 3 bytes, expected 16 for 2x2 RGBA"
        );
    }
}
