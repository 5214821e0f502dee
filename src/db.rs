use anyhow::Context;
use gpa_forecast::{Course, CourseId, GradeScale};
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::records;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// The built-in sample record: eight courses over three terms.
pub fn sample_courses() -> Vec<Course> {
    vec![
        Course::new(1, "Intro to CS", 4, "A", 1).with_marks(95),
        Course::new(2, "Calculus I", 4, "B+", 1).with_marks(88),
        Course::new(3, "Physics I", 3, "B-", 1).with_marks(81),
        Course::new(4, "Data Structures", 4, "A-", 2).with_marks(91),
        Course::new(5, "Linear Algebra", 3, "B", 2).with_marks(85),
        Course::new(6, "Algorithms", 4, "A", 3).with_marks(94),
        Course::new(7, "Web Dev", 3, "A+", 3).with_marks(98),
        Course::new(8, "Database Systems", 3, "B+", 3).with_marks(89),
    ]
}

/// Replaces every stored course with the sample record.
pub async fn seed(pool: &PgPool) -> anyhow::Result<usize> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM gpa_forecast.courses")
        .execute(&mut *tx)
        .await?;

    let courses = sample_courses();
    for course in courses.iter() {
        insert_course(&mut tx, course).await?;
    }

    tx.commit().await?;
    Ok(courses.len())
}

async fn insert_course(tx: &mut Transaction<'_, Postgres>, course: &Course) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO gpa_forecast.courses (id, name, credits, grade, term, marks)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(course.id)
    .bind(&course.name)
    .bind(i32::try_from(course.credits).context("credits out of range")?)
    .bind(&course.grade)
    .bind(i32::try_from(course.term).context("term out of range")?)
    .bind(course.marks.map(i32::from))
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn next_id(tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<CourseId> {
    let id: i64 = sqlx::query("SELECT COALESCE(MAX(id), 0) + 1 AS next_id FROM gpa_forecast.courses")
        .fetch_one(&mut **tx)
        .await?
        .get("next_id");
    Ok(id)
}

pub struct NewCourse {
    pub name: String,
    pub credits: u32,
    pub grade: Option<String>,
    pub term: u32,
    pub marks: Option<u8>,
}

/// Stores a course under the next free id and returns it.
pub async fn add_course(pool: &PgPool, new: NewCourse, scale: &GradeScale) -> anyhow::Result<Course> {
    records::validate_fields(&new.name, new.term)?;
    let grade = records::resolve_grade(scale, new.grade.as_deref(), new.marks)?;

    let mut tx = pool.begin().await?;
    let course = Course {
        id: next_id(&mut tx).await?,
        name: new.name.trim().to_string(),
        credits: new.credits,
        grade,
        term: new.term,
        marks: new.marks,
    };
    insert_course(&mut tx, &course).await?;
    tx.commit().await?;

    Ok(course)
}

pub async fn delete_course(pool: &PgPool, id: CourseId) -> anyhow::Result<bool> {
    let result = sqlx::query("DELETE FROM gpa_forecast.courses WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_courses(pool: &PgPool) -> anyhow::Result<Vec<Course>> {
    let records = sqlx::query(
        "SELECT id, name, credits, grade, term, marks \
         FROM gpa_forecast.courses \
         ORDER BY term, id",
    )
    .fetch_all(pool)
    .await?;

    let mut courses = Vec::with_capacity(records.len());
    for row in records {
        let id: i64 = row.get("id");
        let credits: i32 = row.get("credits");
        let term: i32 = row.get("term");
        let marks: Option<i32> = row.get("marks");

        courses.push(Course {
            id,
            name: row.get("name"),
            credits: u32::try_from(credits)
                .with_context(|| format!("course {id} has negative credits"))?,
            grade: row.get("grade"),
            term: u32::try_from(term).with_context(|| format!("course {id} has invalid term"))?,
            marks: marks
                .map(u8::try_from)
                .transpose()
                .with_context(|| format!("course {id} has invalid marks"))?,
        });
    }

    Ok(courses)
}

pub async fn import_csv(
    pool: &PgPool,
    csv_path: &std::path::Path,
    scale: &GradeScale,
) -> anyhow::Result<usize> {
    let rows = records::read_rows(csv_path)?;
    let mut tx = pool.begin().await?;
    let mut inserted = 0usize;

    for row in rows {
        let grade = records::resolve_grade(scale, row.grade.as_deref(), row.marks)
            .with_context(|| format!("course '{}'", row.name))?;
        let id = match row.id {
            Some(id) => id,
            None => next_id(&mut tx).await?,
        };
        let course = Course {
            id,
            name: row.name,
            credits: row.credits,
            grade,
            term: row.term,
            marks: row.marks,
        };

        if insert_course(&mut tx, &course).await? {
            inserted += 1;
        } else {
            tracing::warn!(id = course.id, name = %course.name, "course id already stored; row skipped");
        }
    }

    tx.commit().await?;
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpa_forecast::{analyze, AnalyticsConfig};

    #[test]
    fn sample_ids_are_unique_and_sequential() {
        let ids: Vec<CourseId> = sample_courses().iter().map(|course| course.id).collect();
        assert_eq!(ids, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn sample_grades_match_their_marks() {
        for course in sample_courses() {
            let marks = course.marks.expect("sample courses carry marks");
            assert_eq!(gpa_forecast::grade_for_marks(marks), course.grade, "{}", course.name);
        }
    }

    #[test]
    fn sample_record_analyzes_cleanly() {
        let report = analyze(&sample_courses(), &AnalyticsConfig::default()).unwrap();
        assert_eq!(report.total_credits, 28);
        assert!(report.projection.forecast().is_some());
    }
}
