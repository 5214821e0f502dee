//! Letter grade to grade-point mapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AnalyticsError;
use crate::models::Course;

pub const MIN_POINTS: f64 = 0.0;
pub const MAX_POINTS: f64 = 4.0;

/// Marks thresholds, highest first. Anything below the last band is an F.
const MARK_BANDS: [(u8, &str); 11] = [
    (97, "A+"),
    (93, "A"),
    (90, "A-"),
    (87, "B+"),
    (83, "B"),
    (80, "B-"),
    (77, "C+"),
    (73, "C"),
    (70, "C-"),
    (67, "D+"),
    (60, "D"),
];

/// Immutable letter to point table. Every point lies in `0.0..=4.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>", into = "BTreeMap<String, f64>")]
pub struct GradeScale {
    points: BTreeMap<String, f64>,
}

impl GradeScale {
    pub fn new<I, S>(entries: I) -> Result<Self, AnalyticsError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut points = BTreeMap::new();
        for (grade, value) in entries {
            let grade = grade.into();
            if !(MIN_POINTS..=MAX_POINTS).contains(&value) {
                return Err(AnalyticsError::InvalidGradePoint {
                    grade,
                    points: value,
                });
            }
            points.insert(grade, value);
        }

        if points.is_empty() {
            return Err(AnalyticsError::EmptyScale);
        }
        Ok(Self { points })
    }

    pub fn points(&self, grade: &str) -> Option<f64> {
        self.points.get(grade).copied()
    }

    pub fn contains(&self, grade: &str) -> bool {
        self.points.contains_key(grade)
    }

    pub fn grades(&self) -> impl Iterator<Item = &str> {
        self.points.keys().map(String::as_str)
    }

    /// Grade points for a course, or `UnknownGrade` if its letter is not mapped.
    pub fn course_points(&self, course: &Course) -> Result<f64, AnalyticsError> {
        self.points(&course.grade)
            .ok_or_else(|| AnalyticsError::UnknownGrade {
                course_id: course.id,
                grade: course.grade.clone(),
            })
    }
}

impl Default for GradeScale {
    fn default() -> Self {
        let points = [
            ("A+", 4.0),
            ("A", 4.0),
            ("A-", 3.7),
            ("B+", 3.3),
            ("B", 3.0),
            ("B-", 2.7),
            ("C+", 2.3),
            ("C", 2.0),
            ("C-", 1.7),
            ("D+", 1.3),
            ("D", 1.0),
            ("F", 0.0),
        ]
        .into_iter()
        .map(|(grade, value)| (grade.to_string(), value))
        .collect();
        Self { points }
    }
}

impl TryFrom<BTreeMap<String, f64>> for GradeScale {
    type Error = AnalyticsError;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self, Self::Error> {
        Self::new(map)
    }
}

impl From<GradeScale> for BTreeMap<String, f64> {
    fn from(scale: GradeScale) -> Self {
        scale.points
    }
}

/// Letter grade for a 0 to 100 mark on the standard banding.
pub fn grade_for_marks(marks: u8) -> &'static str {
    MARK_BANDS
        .iter()
        .find(|(threshold, _)| marks >= *threshold)
        .map(|(_, grade)| *grade)
        .unwrap_or("F")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scale_covers_standard_letters() {
        let scale = GradeScale::default();
        assert_eq!(scale.points("A+"), Some(4.0));
        assert_eq!(scale.points("B+"), Some(3.3));
        assert_eq!(scale.points("F"), Some(0.0));
        assert_eq!(scale.points("E"), None);
        assert_eq!(scale.grades().count(), 12);
    }

    #[test]
    fn rejects_out_of_range_points() {
        let err = GradeScale::new([("A", 4.0), ("S", 5.0)]).unwrap_err();
        assert_eq!(
            err,
            AnalyticsError::InvalidGradePoint {
                grade: "S".to_string(),
                points: 5.0
            }
        );
        assert!(GradeScale::new([("Z", -0.5)]).is_err());
    }

    #[test]
    fn rejects_empty_scale() {
        let entries: Vec<(String, f64)> = Vec::new();
        assert_eq!(GradeScale::new(entries).unwrap_err(), AnalyticsError::EmptyScale);
    }

    #[test]
    fn parses_from_json_object() {
        let scale: GradeScale = serde_json::from_str(r#"{"H": 4.0, "P": 2.0, "N": 0.0}"#).unwrap();
        assert_eq!(scale.points("P"), Some(2.0));
        assert!(!scale.contains("A"));

        let invalid = serde_json::from_str::<GradeScale>(r#"{"H": 7.0}"#);
        assert!(invalid.is_err());
    }

    #[test]
    fn marks_map_to_bands() {
        assert_eq!(grade_for_marks(100), "A+");
        assert_eq!(grade_for_marks(97), "A+");
        assert_eq!(grade_for_marks(95), "A");
        assert_eq!(grade_for_marks(90), "A-");
        assert_eq!(grade_for_marks(88), "B+");
        assert_eq!(grade_for_marks(81), "B-");
        assert_eq!(grade_for_marks(72), "C-");
        assert_eq!(grade_for_marks(60), "D");
        assert_eq!(grade_for_marks(59), "F");
        assert_eq!(grade_for_marks(0), "F");
    }

    #[test]
    fn unknown_course_grade_is_reported() {
        let course = Course::new(7, "Seminar", 2, "E", 1);
        let err = GradeScale::default().course_points(&course).unwrap_err();
        assert_eq!(
            err,
            AnalyticsError::UnknownGrade {
                course_id: 7,
                grade: "E".to_string()
            }
        );
    }
}
