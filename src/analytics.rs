use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use crate::error::AnalyticsError;
use crate::grades::{GradeScale, MAX_POINTS, MIN_POINTS};
use crate::kmeans::{self, KMeansParams};
use crate::models::{
    AnalyticsReport, Course, Forecast, Projection, Strength, StrengthBuckets, TermAggregate,
    Trend,
};
use crate::{regression, stats};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsConfig {
    pub scale: GradeScale,
    pub clusters: NonZeroUsize,
    /// Absolute slope above which the trend counts as rising or falling.
    pub trend_threshold: f64,
    pub kmeans: KMeansParams,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            scale: GradeScale::default(),
            clusters: NonZeroUsize::new(3).unwrap_or(NonZeroUsize::MIN),
            trend_threshold: 0.05,
            kmeans: KMeansParams::default(),
        }
    }
}

pub fn analyze(courses: &[Course], config: &AnalyticsConfig) -> Result<AnalyticsReport, AnalyticsError> {
    let points = courses
        .iter()
        .map(|course| config.scale.course_points(course))
        .collect::<Result<Vec<f64>, _>>()?;

    let (overall_gpa, total_credits) = weighted_gpa(courses.iter().zip(&points));
    let terms = aggregate_terms(courses, &points);
    let term_gpas: Vec<f64> = terms.iter().map(|term| term.gpa).collect();
    let term_gpa_std_dev = stats::population_std_dev(&term_gpas);

    tracing::debug!(
        courses = courses.len(),
        terms = terms.len(),
        overall_gpa,
        term_gpa_std_dev,
        "aggregated course records"
    );

    let projection = project(&terms, config.trend_threshold)?;
    let strengths = classify_strengths(courses, &points, config);

    Ok(AnalyticsReport {
        overall_gpa,
        total_credits,
        term_gpa_std_dev,
        terms,
        projection,
        strengths,
    })
}

/// Credit-weighted mean of grade points, 0.0 when no credits are present.
fn weighted_gpa<'a>(entries: impl Iterator<Item = (&'a Course, &'a f64)>) -> (f64, u64) {
    let mut credits = 0u64;
    let mut weighted = 0.0;
    for (course, points) in entries {
        credits += u64::from(course.credits);
        weighted += points * f64::from(course.credits);
    }

    let gpa = if credits == 0 {
        0.0
    } else {
        weighted / credits as f64
    };
    (gpa, credits)
}

fn aggregate_terms(courses: &[Course], points: &[f64]) -> Vec<TermAggregate> {
    let mut by_term: BTreeMap<u32, Vec<(&Course, &f64)>> = BTreeMap::new();
    for entry in courses.iter().zip(points) {
        by_term.entry(entry.0.term).or_default().push(entry);
    }

    by_term
        .into_iter()
        .map(|(term, entries)| {
            let (gpa, credits) = weighted_gpa(entries.into_iter());
            TermAggregate { term, credits, gpa }
        })
        .collect()
}

fn project(terms: &[TermAggregate], trend_threshold: f64) -> Result<Projection, AnalyticsError> {
    if terms.len() < 2 {
        tracing::debug!(
            terms = terms.len(),
            "skipping regression: need at least two terms"
        );
        return Ok(Projection::InsufficientData { terms: terms.len() });
    }

    let x: Vec<f64> = terms.iter().map(|term| f64::from(term.term)).collect();
    let y: Vec<f64> = terms.iter().map(|term| term.gpa).collect();
    let fit = regression::fit(&x, &y)?;

    let next_term = terms.iter().map(|term| u64::from(term.term)).max().unwrap_or(0) + 1;
    let gpa = fit
        .predict(next_term as f64)
        .clamp(MIN_POINTS, MAX_POINTS);
    let trend = Trend::from_slope(fit.slope, trend_threshold);

    tracing::debug!(
        slope = fit.slope,
        intercept = fit.intercept,
        r_squared = fit.r_squared,
        next_term,
        forecast = gpa,
        %trend,
        "fitted term trend"
    );

    Ok(Projection::Forecast(Forecast {
        fit,
        next_term,
        gpa,
        trend,
    }))
}

fn classify_strengths(courses: &[Course], points: &[f64], config: &AnalyticsConfig) -> StrengthBuckets {
    let clustering = kmeans::fit(points, config.clusters, &config.kmeans);
    tracing::debug!(
        outcome = ?clustering.outcome,
        iterations = clustering.iterations,
        centroids = ?clustering.centroids,
        "clustered course grade points"
    );

    let mut buckets = StrengthBuckets::default();
    for (course, &rank) in courses.iter().zip(&clustering.labels) {
        let strength = Strength::from_rank(rank, config.clusters.get());
        buckets.push(strength, course.clone());
    }
    buckets
}
