use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context};
use gpa_forecast::{grade_for_marks, Course, CourseId, GradeScale};
use serde::Deserialize;

/// One CSV row. `id` and either `grade` or `marks` may be left blank.
#[derive(Debug, Deserialize)]
pub struct CourseRow {
    pub id: Option<CourseId>,
    pub name: String,
    pub credits: u32,
    pub grade: Option<String>,
    pub term: u32,
    pub marks: Option<u8>,
}

/// Letter grade for a new record, derived from marks when no letter is given.
/// The result must be a letter on `scale`.
pub fn resolve_grade(
    scale: &GradeScale,
    grade: Option<&str>,
    marks: Option<u8>,
) -> anyhow::Result<String> {
    if let Some(marks) = marks {
        if marks > 100 {
            bail!("marks must be between 0 and 100, got {marks}");
        }
    }

    let grade = match (grade.map(str::trim).filter(|g| !g.is_empty()), marks) {
        (Some(grade), _) => grade,
        (None, Some(marks)) => grade_for_marks(marks),
        (None, None) => bail!("a course needs a letter grade or marks"),
    };

    if !scale.contains(grade) {
        let known: Vec<&str> = scale.grades().collect();
        bail!("grade '{grade}' is not on the grade scale ({})", known.join(", "));
    }
    Ok(grade.to_string())
}

pub fn validate_fields(name: &str, term: u32) -> anyhow::Result<()> {
    if name.trim().is_empty() {
        bail!("course name must not be empty");
    }
    if term == 0 {
        bail!("term numbers start at 1");
    }
    Ok(())
}

pub fn read_rows(path: &Path) -> anyhow::Result<Vec<CourseRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut rows = Vec::new();
    let mut seen_ids = HashSet::new();
    for (line, result) in reader.deserialize::<CourseRow>().enumerate() {
        let row = result.with_context(|| format!("invalid course row {}", line + 1))?;
        validate_fields(&row.name, row.term)
            .with_context(|| format!("course row {}", line + 1))?;
        if let Some(id) = row.id {
            if !seen_ids.insert(id) {
                bail!("course row {} repeats id {id}", line + 1);
            }
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Loads courses, numbering rows without an id after the largest id seen.
pub fn read_courses(path: &Path, scale: &GradeScale) -> anyhow::Result<Vec<Course>> {
    let rows = read_rows(path)?;
    let mut next_id = rows.iter().filter_map(|row| row.id).max().unwrap_or(0) + 1;

    let mut courses = Vec::with_capacity(rows.len());
    for row in rows {
        let grade = resolve_grade(scale, row.grade.as_deref(), row.marks)
            .with_context(|| format!("course '{}'", row.name))?;
        let id = match row.id {
            Some(id) => id,
            None => {
                next_id += 1;
                next_id - 1
            }
        };
        courses.push(Course {
            id,
            name: row.name,
            credits: row.credits,
            grade,
            term: row.term,
            marks: row.marks,
        });
    }
    Ok(courses)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_csv(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.csv");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn grade_prefers_explicit_letter() {
        let scale = GradeScale::default();
        assert_eq!(resolve_grade(&scale, Some("B+"), Some(99)).unwrap(), "B+");
        assert_eq!(resolve_grade(&scale, None, Some(91)).unwrap(), "A-");
        assert_eq!(resolve_grade(&scale, Some("  "), Some(50)).unwrap(), "F");
        assert!(resolve_grade(&scale, None, None).is_err());
        assert!(resolve_grade(&scale, Some("A"), Some(101)).is_err());
    }

    #[test]
    fn letters_off_the_scale_are_rejected() {
        let scale = GradeScale::default();
        assert!(resolve_grade(&scale, Some("Q"), None).is_err());
        assert!(resolve_grade(&scale, Some("a"), None).is_err());

        let pass_fail = GradeScale::new([("P", 3.0), ("F", 0.0)]).unwrap();
        assert_eq!(resolve_grade(&pass_fail, Some("P"), None).unwrap(), "P");
        assert!(resolve_grade(&pass_fail, None, Some(95)).is_err());
    }

    #[test]
    fn reads_optional_columns() {
        let (_dir, path) = write_csv(
            "id,name,credits,grade,term,marks\n\
             4,Intro to CS,4,A,1,95\n\
             ,Calculus I,4,,1,88\n\
             ,Physics I,3,B-,2,\n",
        );
        let courses = read_courses(&path, &GradeScale::default()).unwrap();

        assert_eq!(courses.len(), 3);
        assert_eq!(courses[0].id, 4);
        assert_eq!(courses[1].id, 5);
        assert_eq!(courses[1].grade, "B+");
        assert_eq!(courses[1].marks, Some(88));
        assert_eq!(courses[2].id, 6);
        assert_eq!(courses[2].marks, None);
    }

    #[test]
    fn rejects_rows_without_grade_or_marks() {
        let (_dir, path) = write_csv("id,name,credits,grade,term,marks\n1,Ethics,3,,1,\n");
        assert!(read_courses(&path, &GradeScale::default()).is_err());
    }

    #[test]
    fn rejects_unknown_letters_in_csv() {
        let (_dir, path) = write_csv("id,name,credits,grade,term,marks\n1,Ethics,3,Q,1,\n");
        let err = read_courses(&path, &GradeScale::default()).unwrap_err();
        assert!(format!("{err:#}").contains("grade 'Q' is not on the grade scale"));
    }

    #[test]
    fn rejects_repeated_ids() {
        let (_dir, path) = write_csv(
            "id,name,credits,grade,term,marks\n\
             3,Ethics,3,A,1,\n\
             3,Logic,3,B,1,\n",
        );
        let err = read_rows(&path).unwrap_err();
        assert!(err.to_string().contains("repeats id 3"));
    }

    #[test]
    fn rejects_blank_names_and_zero_terms() {
        let (_dir, path) = write_csv("id,name,credits,grade,term,marks\n1, ,3,A,1,\n");
        assert!(read_rows(&path).is_err());

        let (_dir, path) = write_csv("id,name,credits,grade,term,marks\n1,Logic,3,A,0,\n");
        assert!(read_rows(&path).is_err());
    }
}
