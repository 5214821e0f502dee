use thiserror::Error;

use crate::models::CourseId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyticsError {
    /// Two sequences passed to an elementwise operation differ in length.
    #[error("dimension mismatch: left has {left} values, right has {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// A regression was requested over zero samples.
    #[error("cannot fit a model on empty input")]
    EmptyInput,

    /// A course references a letter that the grade scale does not define.
    #[error("course {course_id} has grade '{grade}' which is not on the grade scale")]
    UnknownGrade { course_id: CourseId, grade: String },

    /// A grade scale entry maps outside the 0.0 to 4.0 point range.
    #[error("grade '{grade}' maps to {points}, outside 0.0..=4.0")]
    InvalidGradePoint { grade: String, points: f64 },

    #[error("grade scale has no entries")]
    EmptyScale,
}
