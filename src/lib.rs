//! GPA trend forecasting and course strength clustering.

pub mod analytics;
pub mod error;
pub mod grades;
pub mod kmeans;
pub mod models;
pub mod regression;
pub mod report;
pub mod stats;

pub use analytics::{analyze, AnalyticsConfig};
pub use error::AnalyticsError;
pub use grades::{grade_for_marks, GradeScale};
pub use models::{AnalyticsReport, Course, CourseId, Projection, Trend};
