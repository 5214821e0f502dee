use std::fmt;

use serde::{Deserialize, Serialize};

use crate::regression::LinearFit;

pub type CourseId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub credits: u32,
    pub grade: String,
    pub term: u32,
    pub marks: Option<u8>,
}

impl Course {
    pub fn new(id: CourseId, name: &str, credits: u32, grade: &str, term: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            credits,
            grade: grade.to_string(),
            term,
            marks: None,
        }
    }

    pub fn with_marks(mut self, marks: u8) -> Self {
        self.marks = Some(marks);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TermAggregate {
    pub term: u32,
    pub credits: u64,
    pub gpa: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl Trend {
    pub fn from_slope(slope: f64, threshold: f64) -> Self {
        if slope > threshold {
            Trend::Rising
        } else if slope < -threshold {
            Trend::Falling
        } else {
            Trend::Stable
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Trend::Rising => "rising",
            Trend::Falling => "falling",
            Trend::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Forecast {
    pub fit: LinearFit,
    pub next_term: u64,
    /// Predicted GPA for `next_term`, clamped to the grade-point range.
    pub gpa: f64,
    pub trend: Trend,
}

/// Outcome of the term-over-term regression step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Projection {
    Forecast(Forecast),
    /// Fewer than two terms; no regression was attempted.
    InsufficientData { terms: usize },
}

impl Projection {
    pub fn forecast(&self) -> Option<&Forecast> {
        match self {
            Projection::Forecast(forecast) => Some(forecast),
            Projection::InsufficientData { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    Weak,
    Average,
    Strong,
}

impl Strength {
    /// Lowest rank is weak, highest is strong, anything between is average.
    pub fn from_rank(rank: usize, clusters: usize) -> Self {
        if clusters <= 1 {
            Strength::Average
        } else if rank == 0 {
            Strength::Weak
        } else if rank + 1 >= clusters {
            Strength::Strong
        } else {
            Strength::Average
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StrengthBuckets {
    pub strong: Vec<Course>,
    pub average: Vec<Course>,
    pub weak: Vec<Course>,
}

impl StrengthBuckets {
    pub fn push(&mut self, strength: Strength, course: Course) {
        match strength {
            Strength::Strong => self.strong.push(course),
            Strength::Average => self.average.push(course),
            Strength::Weak => self.weak.push(course),
        }
    }

    pub fn len(&self) -> usize {
        self.strong.len() + self.average.len() + self.weak.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsReport {
    pub overall_gpa: f64,
    pub total_credits: u64,
    /// Population standard deviation of term GPAs.
    pub term_gpa_std_dev: f64,
    pub terms: Vec<TermAggregate>,
    pub projection: Projection,
    pub strengths: StrengthBuckets,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trend_thresholds_are_exclusive() {
        assert_eq!(Trend::from_slope(0.06, 0.05), Trend::Rising);
        assert_eq!(Trend::from_slope(0.05, 0.05), Trend::Stable);
        assert_eq!(Trend::from_slope(-0.05, 0.05), Trend::Stable);
        assert_eq!(Trend::from_slope(-0.2, 0.05), Trend::Falling);
    }

    #[test]
    fn ranks_map_to_named_strengths() {
        assert_eq!(Strength::from_rank(0, 3), Strength::Weak);
        assert_eq!(Strength::from_rank(1, 3), Strength::Average);
        assert_eq!(Strength::from_rank(2, 3), Strength::Strong);
        assert_eq!(Strength::from_rank(0, 1), Strength::Average);
        assert_eq!(Strength::from_rank(3, 5), Strength::Average);
        assert_eq!(Strength::from_rank(4, 5), Strength::Strong);
    }

    #[test]
    fn projection_serializes_with_status_tag() {
        let json = serde_json::to_value(Projection::InsufficientData { terms: 1 }).unwrap();
        assert_eq!(json["status"], "insufficient_data");
        assert_eq!(json["terms"], 1);
    }
}
